// Domain layer: catalog/zone models and the ports to external rate libraries.

pub mod model;
pub mod ports;
pub mod postcode;
