use crate::adapters::correios::request::{apply_fee, normalize_price};
use crate::adapters::correios::{CorreiosServiceResponse, CORREIOS_SHIPPING_CLASS, GET_RATE_ENTRY};
use crate::core::handler::ShippingMethodHandler;
use crate::core::payload::Payload;
use crate::core::response::Response;
use crate::core::rules::{RuleField, RuleRegistry};
use crate::domain::model::{CorreiosPackage, PackageLine, ShippingMethod};
use crate::domain::ports::RateLibrary;
use crate::utils::error::HandlerError;
use async_trait::async_trait;
use std::sync::Arc;

type FieldDefault = (RuleField, Option<f64>, Option<f64>);

/// Correios limits for a single package.
const CORREIOS_DEFAULTS: [FieldDefault; 5] = [
    (RuleField::Height, Some(2.0), Some(105.0)),
    (RuleField::Width, Some(11.0), Some(105.0)),
    (RuleField::Length, Some(16.0), Some(105.0)),
    (RuleField::Weight, None, Some(30.0)),
    (RuleField::SumHeightWidthLength, Some(29.0), Some(200.0)),
];

/// PAC and SEDEX get height and length swapped: the rate library mixes
/// those two axes up for these services.
const SWAPPED_AXES_DEFAULTS: [FieldDefault; 5] = [
    (RuleField::Height, Some(16.0), Some(105.0)),
    (RuleField::Width, Some(11.0), Some(105.0)),
    (RuleField::Length, Some(2.0), Some(105.0)),
    (RuleField::Weight, None, Some(30.0)),
    (RuleField::SumHeightWidthLength, Some(29.0), Some(200.0)),
];

/// Method id -> default bounds. Methods missing here use `CORREIOS_DEFAULTS`.
pub const CORREIOS_DEFAULT_RULES: &[(&str, &[FieldDefault])] = &[
    ("pac", &SWAPPED_AXES_DEFAULTS),
    ("sedex", &SWAPPED_AXES_DEFAULTS),
];

pub fn default_rules_for(method_id: &str) -> &'static [FieldDefault] {
    CORREIOS_DEFAULT_RULES
        .iter()
        .find(|(id, _)| *id == method_id)
        .map(|(_, defaults)| *defaults)
        .unwrap_or(&CORREIOS_DEFAULTS)
}

/// Quotes a Correios method through the rate library's private `get_rate`.
pub struct CorreiosWebserviceHandler {
    method: Arc<ShippingMethod>,
    library: Arc<dyn RateLibrary>,
}

impl CorreiosWebserviceHandler {
    pub fn new(method: Arc<ShippingMethod>, library: Arc<dyn RateLibrary>) -> Self {
        Self { method, library }
    }

    pub fn generate_package(&self, payload: &Payload) -> CorreiosPackage {
        CorreiosPackage {
            destination_postcode: payload.postcode().to_string(),
            contents_cost: payload.total_price(),
            contents: vec![PackageLine {
                product_id: payload.product().id,
                height: payload.height(),
                width: payload.width(),
                length: payload.length(),
                weight: payload.weight(),
                quantity: payload.quantity(),
            }],
        }
    }

    async fn reflection_response(
        &self,
        package: &CorreiosPackage,
    ) -> Result<Box<CorreiosServiceResponse>, HandlerError> {
        let entry = self
            .library
            .private_entry(CORREIOS_SHIPPING_CLASS, GET_RATE_ENTRY)
            .ok_or_else(|| HandlerError::UnableToReflect {
                class: CORREIOS_SHIPPING_CLASS.to_string(),
            })?;

        let raw = entry
            .invoke(&self.method, package)
            .await
            .map_err(|e| HandlerError::External(e.to_string()))?;

        raw.downcast::<CorreiosServiceResponse>()
            .map_err(|_| HandlerError::UnexpectedResponseShape {
                expected: "CorreiosServiceResponse",
            })
    }
}

#[async_trait]
impl ShippingMethodHandler for CorreiosWebserviceHandler {
    fn slug(&self) -> &str {
        &self.method.id
    }

    fn method(&self) -> &ShippingMethod {
        &self.method
    }

    fn before_validate(&self, rules: &mut RuleRegistry) {
        let defaults = default_rules_for(&self.method.id);
        rules.register(move |r| {
            for (field, min, max) in defaults {
                r.set_default(*field, *min, *max);
            }
        });
    }

    async fn calculate(&self, payload: &Payload) -> Result<Response, HandlerError> {
        let package = self.generate_package(payload);
        let service = self.reflection_response(&package).await?;

        if !service.is_ok() {
            tracing::debug!(
                "Correios reported error {} for {}: {}",
                service.erro,
                self.method.id,
                service.msg_erro
            );
            return Ok(Response::error(&self.method, service.msg_erro.clone()));
        }

        let price = normalize_price(&service.valor).ok_or(HandlerError::UnexpectedResponseShape {
            expected: "numeric Valor",
        })?;
        let days = service
            .prazo_entrega
            .trim()
            .parse::<u32>()
            .map_err(|_| HandlerError::UnexpectedResponseShape {
                expected: "numeric PrazoEntrega",
            })?;

        let settings = &self.method.settings;
        let price = apply_fee(price, settings.fee.as_deref());
        let days = days
            .checked_add(settings.additional_time)
            .ok_or(HandlerError::UnexpectedResponseShape {
                expected: "numeric PrazoEntrega",
            })?;

        let raw = serde_json::to_value(service.as_ref()).unwrap_or_default();
        Ok(Response::success(&self.method, price, days, raw))
    }
}
