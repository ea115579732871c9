use crate::domain::postcode::PostcodeMatcher;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

fn default_true() -> bool {
    true
}

/// Catalog snapshot of a product. Unknown attributes stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_true")]
    pub purchasable: bool,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// A product variation. Known fields shadow the parent product's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub id: u64,
    pub parent_id: u64,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Conventional,
    Corporate,
}

/// Per-method Correios options, as configured by the store owner.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorreiosSettings {
    pub declare_value: bool,
    pub own_hands: bool,
    pub receipt_notice: bool,
    pub service_type: ServiceType,
    pub login: Option<String>,
    pub password: Option<String>,
    pub minimum_height: f64,
    pub minimum_width: f64,
    pub minimum_length: f64,
    pub extra_weight: f64,
    /// 額外的配送天數
    pub additional_time: u32,
    /// "10%" 或固定金額 "5.00"
    pub fee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub instance_id: u32,
    /// Method slug, e.g. `pac`. Keys handlers and rule overrides.
    pub id: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub service_code: String,
    #[serde(default)]
    pub allowed_categories: Vec<String>,
    #[serde(default)]
    pub settings: CorreiosSettings,
}

impl ShippingMethod {
    pub fn new(instance_id: u32, id: &str, title: &str, service_code: &str) -> Self {
        Self {
            instance_id,
            id: id.to_string(),
            title: title.to_string(),
            enabled: true,
            service_code: service_code.to_string(),
            allowed_categories: Vec::new(),
            settings: CorreiosSettings::default(),
        }
    }

    /// Platform-level applicability: a category restriction must share at
    /// least one category with the product.
    pub fn is_available_for(&self, product: &Product) -> bool {
        self.enabled
            && (self.allowed_categories.is_empty()
                || self
                    .allowed_categories
                    .iter()
                    .any(|category| product.categories.contains(category)))
    }

    pub fn to_ref(&self) -> MethodRef {
        MethodRef {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// Label carried by a response so callers know which method answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingZone {
    pub id: u32,
    pub name: String,
    pub matchers: Vec<PostcodeMatcher>,
    pub methods: Vec<Arc<ShippingMethod>>,
}

impl ShippingZone {
    pub fn matches(&self, postcode: &str) -> bool {
        self.matchers.iter().any(|matcher| matcher.matches(postcode))
    }

    pub fn method_ids(&self) -> Vec<&str> {
        self.methods.iter().map(|m| m.id.as_str()).collect()
    }
}

/// What the Correios rate library needs to price one product line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorreiosPackage {
    pub destination_postcode: String,
    pub contents_cost: Decimal,
    pub contents: Vec<PackageLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageLine {
    pub product_id: u64,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
    pub quantity: u32,
}
