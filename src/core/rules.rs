use crate::core::hooks::isolate;
use crate::core::payload::Payload;
use crate::utils::error::{RuleViolation, ShippingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Physical attribute a rule set can constrain. Declaration order is the
/// order in which `ValidationRules::check` evaluates fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleField {
    Height,
    Width,
    Length,
    Weight,
    SumHeightWidthLength,
}

impl RuleField {
    pub const ALL: [RuleField; 5] = [
        RuleField::Height,
        RuleField::Width,
        RuleField::Length,
        RuleField::Weight,
        RuleField::SumHeightWidthLength,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleField::Height => "height",
            RuleField::Width => "width",
            RuleField::Length => "length",
            RuleField::Weight => "weight",
            RuleField::SumHeightWidthLength => "sum_height_width_length",
        }
    }

    fn value_of(&self, payload: &Payload) -> f64 {
        match self {
            RuleField::Height => payload.height(),
            RuleField::Width => payload.width(),
            RuleField::Length => payload.length(),
            RuleField::Weight => payload.weight(),
            RuleField::SumHeightWidthLength => {
                payload.height() + payload.width() + payload.length()
            }
        }
    }
}

impl fmt::Display for RuleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleField {
    type Err = ShippingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ShippingError::InvalidConfigValueError {
                field: "rules".to_string(),
                value: s.to_string(),
                reason: "Unknown rule field".to_string(),
            })
    }
}

/// Inclusive bounds. `None` leaves that side unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bound {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Bound {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// Per-field min/max policy of one handler invocation.
///
/// Writes are first-writer-wins: once a field has a bound, later
/// `set_default` calls for it are ignored. Overrides therefore have to be
/// written before the handler's own defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationRules {
    bounds: BTreeMap<RuleField, Bound>,
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default(&mut self, field: RuleField, min: Option<f64>, max: Option<f64>) -> &mut Self {
        if self.bounds.contains_key(&field) {
            tracing::trace!("Rule for {} already set, ignoring later default", field);
        } else {
            self.bounds.insert(field, Bound::new(min, max));
        }
        self
    }

    pub fn is_set(&self, field: RuleField) -> bool {
        self.bounds.contains_key(&field)
    }

    pub fn bound(&self, field: RuleField) -> Option<Bound> {
        self.bounds.get(&field).copied()
    }

    pub fn check(&self, payload: &Payload) -> Result<(), RuleViolation> {
        for (field, bound) in &self.bounds {
            let actual = field.value_of(payload);
            if !bound.contains(actual) {
                return Err(RuleViolation::DimensionOutOfRange {
                    field: *field,
                    actual,
                    min: bound.min,
                    max: bound.max,
                });
            }
        }
        Ok(())
    }
}

pub type RuleCallback = Arc<dyn Fn(&mut ValidationRules) + Send + Sync>;

/// Ordered rule writers for one handler slug. `build` runs them once and
/// hands back the finished, read-only rule set.
pub struct RuleRegistry {
    slug: String,
    callbacks: Vec<RuleCallback>,
}

impl RuleRegistry {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            callbacks: Vec::new(),
        }
    }

    pub fn with_callbacks(slug: &str, callbacks: Vec<RuleCallback>) -> Self {
        Self {
            slug: slug.to_string(),
            callbacks,
        }
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn register<F>(&mut self, callback: F)
    where
        F: Fn(&mut ValidationRules) + Send + Sync + 'static,
    {
        self.callbacks.push(Arc::new(callback));
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    pub fn build(self) -> ValidationRules {
        let mut rules = ValidationRules::new();
        let hook = format!("handler_rules_{}", self.slug);
        for callback in &self.callbacks {
            isolate(&hook, || callback(&mut rules));
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::payload::tests::sample_product;

    fn payload_with(height: f64, weight: f64) -> Payload {
        let mut product = sample_product();
        product.height = Some(height);
        product.weight = Some(weight);
        Payload::make_from(product, "04510000", 1u32, None).unwrap()
    }

    #[test]
    fn test_first_writer_wins() {
        let mut rules = ValidationRules::new();
        rules
            .set_default(RuleField::Height, Some(10.0), Some(50.0))
            .set_default(RuleField::Height, Some(1.0), Some(1.0));

        assert_eq!(
            rules.bound(RuleField::Height),
            Some(Bound::new(Some(10.0), Some(50.0)))
        );
        assert!(!rules.is_set(RuleField::Width));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut rules = ValidationRules::new();
        rules.set_default(RuleField::Height, Some(16.0), Some(105.0));

        assert!(rules.check(&payload_with(16.0, 1.0)).is_ok());
        assert!(rules.check(&payload_with(105.0, 1.0)).is_ok());

        let err = rules.check(&payload_with(106.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            RuleViolation::DimensionOutOfRange {
                field: RuleField::Height,
                actual: 106.0,
                min: Some(16.0),
                max: Some(105.0),
            }
        );
        assert!(rules.check(&payload_with(15.0, 1.0)).is_err());
    }

    #[test]
    fn test_absent_bound_is_unconstrained() {
        let mut rules = ValidationRules::new();
        rules.set_default(RuleField::Weight, None, Some(30.0));

        assert!(rules.check(&payload_with(16.0, 0.0)).is_ok());
        assert!(rules.check(&payload_with(16.0, 30.0)).is_ok());
        let err = rules.check(&payload_with(16.0, 30.5)).unwrap_err();
        assert_eq!(err.field(), RuleField::Weight);
    }

    #[test]
    fn test_sum_of_dimensions() {
        // 16 + 11 + 2
        let mut rules = ValidationRules::new();
        rules.set_default(RuleField::SumHeightWidthLength, Some(29.0), Some(200.0));
        assert!(rules.check(&payload_with(16.0, 1.0)).is_ok());

        let err = rules.check(&payload_with(15.0, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            RuleViolation::DimensionOutOfRange {
                field: RuleField::SumHeightWidthLength,
                actual,
                ..
            } if actual == 28.0
        ));
    }

    #[test]
    fn test_fields_checked_in_declaration_order() {
        let mut rules = ValidationRules::new();
        rules
            .set_default(RuleField::Weight, None, Some(1.0))
            .set_default(RuleField::Height, None, Some(1.0));

        let err = rules.check(&payload_with(50.0, 50.0)).unwrap_err();
        assert_eq!(err.field(), RuleField::Height);
    }

    #[test]
    fn test_registry_runs_callbacks_in_order() {
        let mut registry = RuleRegistry::new("pac");
        registry.register(|rules| {
            rules.set_default(RuleField::Weight, None, Some(20.0));
        });
        registry.register(|rules| {
            rules.set_default(RuleField::Weight, None, Some(30.0));
        });
        assert_eq!(registry.len(), 2);

        let rules = registry.build();
        assert_eq!(rules.bound(RuleField::Weight), Some(Bound::new(None, Some(20.0))));
    }

    #[test]
    fn test_registry_survives_panicking_callback() {
        let mut registry = RuleRegistry::new("pac");
        registry.register(|_| panic!("broken extension"));
        registry.register(|rules| {
            rules.set_default(RuleField::Width, Some(11.0), None);
        });

        let rules = registry.build();
        assert!(rules.is_set(RuleField::Width));
    }

    #[test]
    fn test_parse_rule_field() {
        assert_eq!(
            "sum_height_width_length".parse::<RuleField>().unwrap(),
            RuleField::SumHeightWidthLength
        );
        assert!("depth".parse::<RuleField>().is_err());
    }
}
