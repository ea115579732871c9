use crate::domain::model::{MethodRef, ShippingMethod};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Normalized outcome of one method's quote attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response {
    Success {
        method: MethodRef,
        price: Decimal,
        lead_time_days: u32,
        raw: Value,
    },
    Error {
        method: MethodRef,
        message: String,
    },
}

impl Response {
    pub fn success(method: &ShippingMethod, price: Decimal, lead_time_days: u32, raw: Value) -> Self {
        Response::Success {
            method: method.to_ref(),
            price,
            lead_time_days,
            raw,
        }
    }

    pub fn error(method: &ShippingMethod, message: impl Into<String>) -> Self {
        Response::Error {
            method: method.to_ref(),
            message: message.into(),
        }
    }

    pub fn method(&self) -> &MethodRef {
        match self {
            Response::Success { method, .. } | Response::Error { method, .. } => method,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn price(&self) -> Option<Decimal> {
        match self {
            Response::Success { price, .. } => Some(*price),
            Response::Error { .. } => None,
        }
    }

    pub fn lead_time_days(&self) -> Option<u32> {
        match self {
            Response::Success { lead_time_days, .. } => Some(*lead_time_days),
            Response::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Error { message, .. } => Some(message.as_str()),
            Response::Success { .. } => None,
        }
    }

    /// Entry in the shape the product page script consumes.
    pub fn to_legacy_json(&self) -> Value {
        match self {
            Response::Success {
                price,
                lead_time_days,
                raw,
                ..
            } => json!({
                "price": price.round_dp(2).to_string(),
                "days": lead_time_days,
                "debug": raw,
            }),
            Response::Error { message, .. } => json!({
                "status": "erro",
                "mensagem": message,
            }),
        }
    }
}

/// `{ "<method id>": {...}, ... }` in response order.
///
/// The legacy shape is keyed by method id, so a zone listing the same id
/// twice keeps only the first response for it.
pub fn responses_to_legacy_json(responses: &[Response]) -> Value {
    let mut output = Map::new();
    for response in responses {
        let id = &response.method().id;
        if output.contains_key(id) {
            tracing::warn!("⚠️ Duplicate method id '{}' dropped from legacy output", id);
            continue;
        }
        output.insert(id.clone(), response.to_legacy_json());
    }
    Value::Object(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_json_shape() {
        let pac = ShippingMethod::new(1, "pac", "PAC", "04510");
        let sedex = ShippingMethod::new(2, "sedex", "SEDEX", "04014");
        let responses = vec![
            Response::success(&pac, Decimal::new(2350, 2), 7, json!({"Codigo": "04510"})),
            Response::error(&sedex, "CEP de destino invalido."),
        ];

        let output = responses_to_legacy_json(&responses);
        assert_eq!(output["pac"]["price"], "23.50");
        assert_eq!(output["pac"]["days"], 7);
        assert_eq!(output["pac"]["debug"]["Codigo"], "04510");
        assert_eq!(output["sedex"]["status"], "erro");
        assert_eq!(output["sedex"]["mensagem"], "CEP de destino invalido.");

        let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["pac", "sedex"]);
    }

    #[test]
    fn test_accessors() {
        let pac = ShippingMethod::new(1, "pac", "PAC", "04510");
        let ok = Response::success(&pac, Decimal::new(1000, 2), 3, Value::Null);
        assert!(ok.is_success());
        assert_eq!(ok.price(), Some(Decimal::new(1000, 2)));
        assert_eq!(ok.lead_time_days(), Some(3));
        assert_eq!(ok.method().title, "PAC");

        let err = Response::error(&pac, "timeout");
        assert!(!err.is_success());
        assert_eq!(err.error_message(), Some("timeout"));
        assert_eq!(err.price(), None);
    }

    #[test]
    fn test_duplicate_method_id_keeps_first_response() {
        let pac = ShippingMethod::new(1, "pac", "PAC", "04510");
        let pac_again = ShippingMethod::new(7, "pac", "PAC contrato", "03298");
        let responses = vec![
            Response::success(&pac, Decimal::new(2350, 2), 7, Value::Null),
            Response::error(&pac_again, "segunda instancia"),
        ];

        let output = responses_to_legacy_json(&responses);
        let object = output.as_object().unwrap();
        assert_eq!(object.len(), 1);
        assert_eq!(output["pac"]["price"], "23.50");
    }
}
