// Adapters layer: concrete implementations of the external rate libraries.

pub mod correios;
