use crate::core::handler::{run_handler, HandlerRegistry};
use crate::core::hooks::{HookEvent, Hooks};
use crate::core::payload::Payload;
use crate::core::response::Response;
use crate::domain::model::ShippingMethod;
use crate::utils::error::HandlerError;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(10);

/// Fans a payload out to every eligible method's handler.
pub struct CostAggregator<'a> {
    registry: &'a HandlerRegistry,
    hooks: &'a Hooks,
    timeout: Duration,
}

impl<'a> CostAggregator<'a> {
    pub fn new(registry: &'a HandlerRegistry, hooks: &'a Hooks, timeout: Duration) -> Self {
        Self {
            registry,
            hooks,
            timeout,
        }
    }

    /// One response per method, in the given order. Never fails as a whole:
    /// a method's `HandlerError` becomes that method's error response.
    pub async fn quote(&self, methods: &[Arc<ShippingMethod>], payload: &Payload) -> Vec<Response> {
        let mut responses = Vec::with_capacity(methods.len());

        for method in methods {
            let response = match self.quote_method(method.clone(), payload).await {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!("⚠️ Method '{}' failed: {}", method.id, error);
                    if matches!(error, HandlerError::UnableToReflect { .. }) {
                        self.hooks.notify(HookEvent::HandlerError {
                            method,
                            error: &error,
                            payload,
                        });
                    }
                    Response::error(method, error.to_string())
                }
            };
            responses.push(response);
        }

        responses
    }

    async fn quote_method(
        &self,
        method: Arc<ShippingMethod>,
        payload: &Payload,
    ) -> Result<Response, HandlerError> {
        let method_id = method.id.clone();
        let handler = self.registry.create(method).ok_or_else(|| {
            HandlerError::External(format!("No handler registered for method '{}'", method_id))
        })?;

        match tokio::time::timeout(self.timeout, run_handler(handler.as_ref(), payload, self.hooks)).await {
            Ok(result) => result,
            Err(_) => Err(HandlerError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::handler::tests::stub;
    use crate::core::hooks::HookPoint;
    use crate::core::payload::tests::sample_product;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn payload() -> Payload {
        Payload::make_from(sample_product(), "04510000", 2u32, None).unwrap()
    }

    fn methods(ids: &[&str]) -> Vec<Arc<ShippingMethod>> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Arc::new(ShippingMethod::new(i as u32 + 1, id, &id.to_uppercase(), "")))
            .collect()
    }

    #[tokio::test]
    async fn test_failing_method_does_not_suppress_sibling() {
        let mut registry = HandlerRegistry::new();
        registry.register("a", |method| {
            Box::new(stub(method, Err(HandlerError::External("boom".to_string()))))
        });
        registry.register("b", |method| {
            let ok = Response::success(&method, Decimal::new(1500, 2), 4, serde_json::Value::Null);
            Box::new(stub(method, Ok(ok)))
        });
        let hooks = Hooks::new();

        let responses = CostAggregator::new(&registry, &hooks, DEFAULT_HANDLER_TIMEOUT)
            .quote(&methods(&["a", "b"]), &payload())
            .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].method().id, "a");
        assert!(!responses[0].is_success());
        assert!(responses[0].error_message().unwrap().contains("boom"));
        assert_eq!(responses[1].method().id, "b");
        assert_eq!(responses[1].price(), Some(Decimal::new(1500, 2)));
    }

    #[tokio::test]
    async fn test_slow_handler_times_out_without_affecting_others() {
        let mut registry = HandlerRegistry::new();
        registry.register("slow", |method| {
            let ok = Response::success(&method, Decimal::ONE, 1, serde_json::Value::Null);
            let mut handler = stub(method, Ok(ok));
            handler.delay = Some(Duration::from_secs(5));
            Box::new(handler)
        });
        registry.register("fast", |method| {
            let ok = Response::success(&method, Decimal::TWO, 2, serde_json::Value::Null);
            Box::new(stub(method, Ok(ok)))
        });
        let hooks = Hooks::new();

        let responses = CostAggregator::new(&registry, &hooks, Duration::from_millis(50))
            .quote(&methods(&["slow", "fast"]), &payload())
            .await;

        assert!(responses[0].error_message().unwrap().contains("timed out"));
        assert_eq!(responses[1].price(), Some(Decimal::TWO));
    }

    #[tokio::test]
    async fn test_weight_violation_is_reported_per_method() {
        let mut registry = HandlerRegistry::new();
        registry.register("light", |method| {
            let ok = Response::success(&method, Decimal::ONE, 1, serde_json::Value::Null);
            let mut handler = stub(method, Ok(ok));
            handler.max_weight = Some(1.0);
            Box::new(handler)
        });
        registry.register("heavy", |method| {
            let ok = Response::success(&method, Decimal::TWO, 2, serde_json::Value::Null);
            Box::new(stub(method, Ok(ok)))
        });
        let hooks = Hooks::new();

        let responses = CostAggregator::new(&registry, &hooks, DEFAULT_HANDLER_TIMEOUT)
            .quote(&methods(&["light", "heavy"]), &payload())
            .await;

        assert!(responses[0].error_message().unwrap().contains("weight"));
        assert!(responses[1].is_success());
    }

    #[tokio::test]
    async fn test_reflection_failure_fires_handler_error_hook() {
        let mut registry = HandlerRegistry::new();
        registry.register("pac", |method| {
            Box::new(stub(
                method,
                Err(HandlerError::UnableToReflect {
                    class: "correios_shipping".to_string(),
                }),
            ))
        });
        registry.register("sedex", |method| {
            Box::new(stub(method, Err(HandlerError::External("down".to_string()))))
        });

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let mut hooks = Hooks::new();
        hooks.on(HookPoint::HandlerError, move |event| {
            if let HookEvent::HandlerError { method, .. } = event {
                assert_eq!(method.id, "pac");
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let responses = CostAggregator::new(&registry, &hooks, DEFAULT_HANDLER_TIMEOUT)
            .quote(&methods(&["pac", "sedex"]), &payload())
            .await;

        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| !r.is_success()));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
