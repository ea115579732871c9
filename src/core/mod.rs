pub mod calculator;
pub mod costs;
pub mod handler;
pub mod hooks;
pub mod methods;
pub mod payload;
pub mod response;
pub mod rules;
pub mod zone;

pub use crate::domain::model::{Product, ShippingMethod, ShippingZone, Variation};
pub use crate::domain::ports::{PrivateRateEntry, RateLibrary};
pub use crate::utils::error::Result;
