// Concrete shipping method handlers wired on top of the quote pipeline.

pub mod handlers;
