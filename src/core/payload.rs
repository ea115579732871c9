use crate::domain::model::{Product, Variation};
use crate::domain::postcode::{is_valid_postcode, normalize_postcode};
use crate::utils::error::PayloadError;
use rust_decimal::Decimal;

/// Quantity as received from the caller, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityInput {
    Number(u32),
    Text(String),
}

impl From<u32> for QuantityInput {
    fn from(value: u32) -> Self {
        QuantityInput::Number(value)
    }
}

impl From<&str> for QuantityInput {
    fn from(value: &str) -> Self {
        QuantityInput::Text(value.to_string())
    }
}

impl From<String> for QuantityInput {
    fn from(value: String) -> Self {
        QuantityInput::Text(value)
    }
}

impl QuantityInput {
    fn resolve(&self) -> Result<u32, PayloadError> {
        let parsed = match self {
            QuantityInput::Number(n) => Some(*n),
            QuantityInput::Text(text) => text.trim().parse::<u32>().ok(),
        };
        match parsed {
            Some(n) if n > 0 => Ok(n),
            _ => Err(PayloadError::InvalidQuantity {
                value: match self {
                    QuantityInput::Number(n) => n.to_string(),
                    QuantityInput::Text(text) => text.clone(),
                },
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
}

/// Validated, read-only input of one quote request.
///
/// Only `make_from` builds a payload, so every instance already passed all
/// field checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    product: Product,
    variation: Option<Variation>,
    postcode: String,
    quantity: u32,
    price: Decimal,
    total_price: Decimal,
    dimensions: Dimensions,
}

impl Payload {
    pub fn make_from(
        product: Product,
        destination_postcode: &str,
        quantity: impl Into<QuantityInput>,
        variation: Option<Variation>,
    ) -> Result<Self, PayloadError> {
        if !product.purchasable {
            return Err(PayloadError::NotPurchasable {
                product_id: product.id,
            });
        }

        if let Some(variation) = &variation {
            if variation.parent_id != product.id {
                return Err(PayloadError::VariationMismatch {
                    variation_id: variation.id,
                    product_id: product.id,
                });
            }
        }

        // 變體有值就優先使用
        let v = variation.as_ref();
        let price = v.and_then(|v| v.price).or(product.price);
        let price = price.ok_or(PayloadError::MissingAttribute { field: "price" })?;
        if price.is_sign_negative() {
            return Err(PayloadError::InvalidAttribute {
                field: "price",
                value: price.to_string(),
            });
        }

        let dimensions = Dimensions {
            height: known_measure("height", v.and_then(|v| v.height).or(product.height))?,
            width: known_measure("width", v.and_then(|v| v.width).or(product.width))?,
            length: known_measure("length", v.and_then(|v| v.length).or(product.length))?,
            weight: known_measure("weight", v.and_then(|v| v.weight).or(product.weight))?,
        };

        if !is_valid_postcode(destination_postcode) {
            return Err(PayloadError::InvalidPostcode {
                value: destination_postcode.to_string(),
            });
        }
        let postcode = normalize_postcode(destination_postcode);

        let quantity = quantity.into().resolve()?;
        let total_price = price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| PayloadError::InvalidQuantity {
                value: quantity.to_string(),
            })?;

        Ok(Self {
            product,
            variation,
            postcode,
            quantity,
            price,
            total_price,
            dimensions,
        })
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn variation(&self) -> Option<&Variation> {
        self.variation.as_ref()
    }

    /// Destination postcode, digits only.
    pub fn postcode(&self) -> &str {
        &self.postcode
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price of the selected variation (or the product).
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Unit price times quantity, checked when the payload was built.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn height(&self) -> f64 {
        self.dimensions.height
    }

    pub fn width(&self) -> f64 {
        self.dimensions.width
    }

    pub fn length(&self) -> f64 {
        self.dimensions.length
    }

    pub fn weight(&self) -> f64 {
        self.dimensions.weight
    }
}

fn known_measure(field: &'static str, value: Option<f64>) -> Result<f64, PayloadError> {
    let value = value.ok_or(PayloadError::MissingAttribute { field })?;
    if !value.is_finite() || value < 0.0 {
        return Err(PayloadError::InvalidAttribute {
            field,
            value: value.to_string(),
        });
    }
    Ok(value)
}
