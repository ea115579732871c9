use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "frete")]
#[command(about = "Quote Correios shipping for a single product")]
pub struct CliConfig {
    #[arg(long, default_value = "frete.toml")]
    pub config: String,

    #[arg(long, help = "Destination postcode (CEP)")]
    pub postcode: String,

    /// Kept as text so malformed input reaches payload validation.
    #[arg(long, default_value = "1")]
    pub quantity: String,

    #[arg(long, help = "Product JSON file")]
    pub product: String,

    #[arg(long, help = "Variation JSON file")]
    pub variation: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_file_extensions("config", std::slice::from_ref(&self.config), &["toml"])?;
        validation::validate_file_extensions("product", std::slice::from_ref(&self.product), &["json"])?;
        if let Some(variation) = &self.variation {
            validation::validate_file_extensions("variation", std::slice::from_ref(variation), &["json"])?;
        }
        validation::validate_non_empty_string("postcode", &self.postcode)?;
        Ok(())
    }
}
