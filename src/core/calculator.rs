use crate::core::costs::{CostAggregator, DEFAULT_HANDLER_TIMEOUT};
use crate::core::handler::HandlerRegistry;
use crate::core::hooks::{HookEvent, Hooks};
use crate::core::methods::MethodFilter;
use crate::core::payload::{Payload, QuantityInput};
use crate::core::response::Response;
use crate::core::zone::{ZoneResolver, ZoneStore};
use crate::domain::model::{Product, Variation};
use crate::utils::error::{CalculatorError, ShippingError};
use std::sync::Arc;
use std::time::Duration;

/// Read-only collaborators shared by every quote request.
#[derive(Clone)]
pub struct QuoteContext {
    pub zones: Arc<ZoneStore>,
    pub handlers: Arc<HandlerRegistry>,
    pub hooks: Arc<Hooks>,
    pub handler_timeout: Duration,
}

impl QuoteContext {
    pub fn new(zones: ZoneStore, handlers: HandlerRegistry, hooks: Hooks) -> Self {
        Self {
            zones: Arc::new(zones),
            handlers: Arc::new(handlers),
            hooks: Arc::new(hooks),
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }

    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }
}

/// Entry point of a quote request: payload -> zone -> methods -> costs.
pub struct ShippingCalculator {
    context: QuoteContext,
    payload: Payload,
}

impl ShippingCalculator {
    /// Builds the payload right away, so invalid input fails here.
    pub fn new(
        context: QuoteContext,
        product: Product,
        destination_postcode: &str,
        quantity: impl Into<QuantityInput>,
        variation: Option<Variation>,
    ) -> Result<Self, CalculatorError> {
        let payload = Payload::make_from(product, destination_postcode, quantity, variation)
            .map_err(|e| {
                tracing::info!("Rejected quote request: {}", e);
                CalculatorError::from(ShippingError::from(e))
            })?;

        Ok(Self { context, payload })
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub async fn process_request(&self) -> Result<Vec<Response>, CalculatorError> {
        let hooks = self.context.hooks.as_ref();
        let payload = &self.payload;

        tracing::info!(
            "🚚 Quoting product {} x{} to {}",
            payload.product().id,
            payload.quantity(),
            payload.postcode()
        );

        let zone = match ZoneResolver::new(&self.context.zones, hooks).resolve(payload) {
            Ok(zone) => zone,
            Err(e) => {
                tracing::error!("❌ {}", e);
                hooks.notify(HookEvent::InvalidShippingZone { payload });
                return Err(e.into());
            }
        };

        let methods = match MethodFilter::new(&self.context.handlers).filter(&zone, payload.product()) {
            Ok(methods) => methods,
            Err(e) => {
                tracing::error!("❌ {} (configured: {:?})", e, zone.method_ids());
                hooks.notify(HookEvent::InvalidShippingMethods {
                    zone: &zone,
                    payload,
                });
                return Err(e.into());
            }
        };

        let responses = CostAggregator::new(&self.context.handlers, hooks, self.context.handler_timeout)
            .quote(&methods, payload)
            .await;

        tracing::info!(
            "✅ Quote complete: {}/{} methods answered in zone '{}'",
            responses.iter().filter(|r| r.is_success()).count(),
            responses.len(),
            zone.name
        );
        Ok(responses)
    }
}
