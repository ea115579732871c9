pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::ShippingConfig;

pub use crate::adapters::correios::CorreiosWebservice;
pub use crate::app::handlers::{correios_registry, CorreiosWebserviceHandler};
pub use crate::core::calculator::{QuoteContext, ShippingCalculator};
pub use crate::core::hooks::{HookEvent, HookPoint, Hooks};
pub use crate::core::response::{responses_to_legacy_json, Response};
pub use crate::domain::model::{Product, ShippingMethod, ShippingZone, Variation};
pub use crate::utils::error::{CalculatorError, Result, ShippingError};
