#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use toml_config::ShippingConfig;

use crate::domain::model::{Product, Variation};
use crate::utils::error::{Result, ShippingError};
use serde::de::DeserializeOwned;
use std::path::Path;

fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let content = std::fs::read_to_string(&path).map_err(ShippingError::IoError)?;
    Ok(serde_json::from_str(&content)?)
}

/// 從 JSON 檔案讀取商品
pub fn load_product<P: AsRef<Path>>(path: P) -> Result<Product> {
    load_json(path)
}

pub fn load_variation<P: AsRef<Path>>(path: P) -> Result<Variation> {
    load_json(path)
}
