use crate::core::handler::HandlerRegistry;
use crate::domain::model::{Product, ShippingMethod, ShippingZone};
use crate::utils::error::{Result, ShippingError};
use std::sync::Arc;

pub struct MethodFilter<'a> {
    registry: &'a HandlerRegistry,
}

impl<'a> MethodFilter<'a> {
    pub fn new(registry: &'a HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Methods of the zone that have a handler and accept the product, in
    /// the zone's order.
    pub fn filter(&self, zone: &ShippingZone, product: &Product) -> Result<Vec<Arc<ShippingMethod>>> {
        let eligible: Vec<Arc<ShippingMethod>> = zone
            .methods
            .iter()
            .filter(|method| {
                if !self.registry.supports(&method.id) {
                    tracing::debug!("No handler registered for method '{}'", method.id);
                    return false;
                }
                if !method.is_available_for(product) {
                    tracing::debug!("Method '{}' not available for product {}", method.id, product.id);
                    return false;
                }
                true
            })
            .cloned()
            .collect();

        if eligible.is_empty() {
            return Err(ShippingError::NoEligibleMethods {
                zone: zone.name.clone(),
            });
        }
        Ok(eligible)
    }
}
