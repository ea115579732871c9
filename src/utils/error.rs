use crate::core::rules::RuleField;
use std::time::Duration;
use thiserror::Error;

/// Reasons a quote request cannot even be built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("Product {product_id} is not purchasable")]
    NotPurchasable { product_id: u64 },

    #[error("Variation {variation_id} does not belong to product {product_id}")]
    VariationMismatch { variation_id: u64, product_id: u64 },

    #[error("Product is missing required attribute: {field}")]
    MissingAttribute { field: &'static str },

    #[error("Product attribute {field} has invalid value: {value}")]
    InvalidAttribute { field: &'static str, value: String },

    #[error("Invalid destination postcode: {value}")]
    InvalidPostcode { value: String },

    #[error("Invalid quantity: {value}")]
    InvalidQuantity { value: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleViolation {
    #[error(
        "{field} {actual} is out of range (min: {}, max: {})",
        display_bound(.min),
        display_bound(.max)
    )]
    DimensionOutOfRange {
        field: RuleField,
        actual: f64,
        min: Option<f64>,
        max: Option<f64>,
    },
}

impl RuleViolation {
    pub fn field(&self) -> RuleField {
        match self {
            RuleViolation::DimensionOutOfRange { field, .. } => *field,
        }
    }
}

fn display_bound(bound: &Option<f64>) -> String {
    bound.map_or_else(|| "none".to_string(), |b| b.to_string())
}

/// Failures scoped to a single shipping method. Never aborts sibling methods.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("Unable to reflect private rate entry point on {class}")]
    UnableToReflect { class: String },

    #[error("Unexpected response shape from rate library (expected {expected})")]
    UnexpectedResponseShape { expected: &'static str },

    #[error("Rate library error: {0}")]
    External(String),

    #[error("Rate computation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Package rejected: {0}")]
    Validation(#[from] RuleViolation),
}

#[derive(Error, Debug)]
pub enum ShippingError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] PayloadError),

    #[error("No shipping zone matches postcode {postcode}")]
    NoMatchingZone { postcode: String },

    #[error("No eligible shipping methods in zone {zone}")]
    NoEligibleMethods { zone: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl ShippingError {
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            ShippingError::InvalidPayload(_) => FailureReason::InvalidPayload,
            ShippingError::NoMatchingZone { .. } => FailureReason::NoMatchingZone,
            ShippingError::NoEligibleMethods { .. } => FailureReason::NoEligibleMethods,
            _ => FailureReason::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InvalidPayload,
    NoMatchingZone,
    NoEligibleMethods,
    Internal,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidPayload => "invalid_payload",
            FailureReason::NoMatchingZone => "invalid_shipping_zone",
            FailureReason::NoEligibleMethods => "invalid_shipping_methods",
            FailureReason::Internal => "internal",
        }
    }
}

/// The only failure the calculator exposes to its callers.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Shipping calculation failed ({}): {message}", .reason.as_str())]
pub struct CalculatorError {
    pub reason: FailureReason,
    pub message: String,
}

impl CalculatorError {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.reason {
            FailureReason::InvalidPayload => {
                format!("Não foi possível calcular o frete: {}", self.message)
            }
            FailureReason::NoMatchingZone | FailureReason::NoEligibleMethods => {
                "Não há formas de envio disponíveis para este CEP.".to_string()
            }
            FailureReason::Internal => "Erro desconhecido ao calcular o frete.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.reason {
            FailureReason::InvalidPayload => {
                "Check the postcode (8 digits), the quantity and the product dimensions"
            }
            FailureReason::NoMatchingZone => {
                "Add a shipping zone whose postcodes cover this destination"
            }
            FailureReason::NoEligibleMethods => {
                "Enable a supported shipping method in the matching zone"
            }
            FailureReason::Internal => "Re-run with --verbose and inspect the logs",
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.reason {
            FailureReason::InvalidPayload => 2,
            FailureReason::NoMatchingZone | FailureReason::NoEligibleMethods => 3,
            FailureReason::Internal => 1,
        }
    }
}

impl From<ShippingError> for CalculatorError {
    fn from(error: ShippingError) -> Self {
        CalculatorError::new(error.failure_reason(), error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShippingError>;
