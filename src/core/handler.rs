use crate::core::hooks::Hooks;
use crate::core::payload::Payload;
use crate::core::response::Response;
use crate::core::rules::RuleRegistry;
use crate::domain::model::ShippingMethod;
use crate::utils::error::HandlerError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-method quoting strategy. One instance per eligible method per request.
#[async_trait]
pub trait ShippingMethodHandler: Send + Sync {
    /// Identity used to key rule overrides and extension hooks.
    fn slug(&self) -> &str;

    fn method(&self) -> &ShippingMethod;

    /// Chance to register field defaults before the rule set is built.
    fn before_validate(&self, _rules: &mut RuleRegistry) {}

    async fn calculate(&self, payload: &Payload) -> Result<Response, HandlerError>;
}

pub type HandlerFactory =
    Arc<dyn Fn(Arc<ShippingMethod>) -> Box<dyn ShippingMethodHandler> + Send + Sync>;

/// Method id -> handler implementation.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, method_id: &str, factory: F) -> &mut Self
    where
        F: Fn(Arc<ShippingMethod>) -> Box<dyn ShippingMethodHandler> + Send + Sync + 'static,
    {
        self.factories.insert(method_id.to_string(), Arc::new(factory));
        self
    }

    pub fn supports(&self, method_id: &str) -> bool {
        self.factories.contains_key(method_id)
    }

    pub fn create(&self, method: Arc<ShippingMethod>) -> Option<Box<dyn ShippingMethodHandler>> {
        self.factories.get(&method.id).map(|factory| factory(method))
    }

    pub fn method_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Validate-then-calculate sequence shared by every handler.
///
/// External overrides for the slug are registered first, then the handler's
/// own defaults; the resulting rule set is fixed before the payload is
/// checked against it.
pub async fn run_handler(
    handler: &dyn ShippingMethodHandler,
    payload: &Payload,
    hooks: &Hooks,
) -> Result<Response, HandlerError> {
    let mut registry = hooks.rule_registry(handler.slug());
    handler.before_validate(&mut registry);
    let rules = registry.build();

    if let Err(violation) = rules.check(payload) {
        tracing::debug!("Method {} rejected package: {}", handler.slug(), violation);
        return Err(HandlerError::Validation(violation));
    }

    handler.calculate(payload).await
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::payload::tests::sample_product;
    use crate::core::rules::RuleField;
    use crate::utils::error::RuleViolation;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scriptable handler for pipeline tests.
    pub(crate) struct StubHandler {
        pub method: Arc<ShippingMethod>,
        pub outcome: Result<Response, HandlerError>,
        pub delay: Option<Duration>,
        pub max_weight: Option<f64>,
        pub calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ShippingMethodHandler for StubHandler {
        fn slug(&self) -> &str {
            &self.method.id
        }

        fn method(&self) -> &ShippingMethod {
            &self.method
        }

        fn before_validate(&self, rules: &mut RuleRegistry) {
            if let Some(max) = self.max_weight {
                rules.register(move |r| {
                    r.set_default(RuleField::Weight, None, Some(max));
                });
            }
        }

        async fn calculate(&self, _payload: &Payload) -> Result<Response, HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }
    }

    pub(crate) fn stub(
        method: Arc<ShippingMethod>,
        outcome: Result<Response, HandlerError>,
    ) -> StubHandler {
        StubHandler {
            method,
            outcome,
            delay: None,
            max_weight: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn payload() -> Payload {
        Payload::make_from(sample_product(), "04510000", 2u32, None).unwrap()
    }

    #[tokio::test]
    async fn test_run_handler_calculates_when_rules_pass() {
        let method = Arc::new(ShippingMethod::new(1, "pac", "PAC", "04510"));
        let ok = Response::success(&method, Decimal::new(2000, 2), 5, serde_json::Value::Null);
        let mut handler = stub(method, Ok(ok.clone()));
        handler.max_weight = Some(30.0);

        let response = run_handler(&handler, &payload(), &Hooks::new()).await.unwrap();
        assert_eq!(response, ok);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_handler_skips_calculation_on_violation() {
        let method = Arc::new(ShippingMethod::new(1, "pac", "PAC", "04510"));
        let mut handler = stub(method.clone(), Ok(Response::error(&method, "unused")));
        handler.max_weight = Some(1.0);

        let err = run_handler(&handler, &payload(), &Hooks::new()).await.unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Validation(RuleViolation::DimensionOutOfRange {
                field: RuleField::Weight,
                ..
            })
        ));
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_override_beats_handler_default() {
        let method = Arc::new(ShippingMethod::new(1, "pac", "PAC", "04510"));
        let mut handler = stub(method.clone(), Ok(Response::error(&method, "reached")));
        handler.max_weight = Some(1.0);

        let mut hooks = Hooks::new();
        hooks.add_rules("pac", |rules| {
            rules.set_default(RuleField::Weight, None, Some(50.0));
        });

        let response = run_handler(&handler, &payload(), &hooks).await.unwrap();
        assert_eq!(response.error_message(), Some("reached"));
    }

    #[test]
    fn test_registry_creates_registered_handlers_only() {
        let mut registry = HandlerRegistry::new();
        registry.register("pac", |method| {
            let outcome = Ok(Response::error(&method, "stub"));
            Box::new(stub(method, outcome))
        });

        assert!(registry.supports("pac"));
        assert!(!registry.supports("sedex"));
        assert_eq!(registry.method_ids(), vec!["pac"]);

        let sedex = Arc::new(ShippingMethod::new(2, "sedex", "SEDEX", "04014"));
        assert!(registry.create(sedex).is_none());
        let pac = Arc::new(ShippingMethod::new(1, "pac", "PAC", "04510"));
        assert_eq!(registry.create(pac).unwrap().slug(), "pac");
    }
}
