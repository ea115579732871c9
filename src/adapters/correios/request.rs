//! Correios webservice request building, shared by every Correios method.

use crate::domain::model::{CorreiosPackage, ServiceType, ShippingMethod};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Correios refuses a declared value under R$ 18,50.
pub fn declared_value_minimum() -> Decimal {
    Decimal::new(1850, 2)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorreiosRequest {
    pub service_code: String,
    pub origin_postcode: String,
    pub destination_postcode: String,
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub weight: f64,
    pub declared_value: Option<Decimal>,
    pub own_hands: bool,
    pub receipt_notice: bool,
    pub login: Option<String>,
    pub password: Option<String>,
}

impl CorreiosRequest {
    /// Items are stacked on height; width and length take the largest item.
    pub fn build(method: &ShippingMethod, package: &CorreiosPackage, origin_postcode: &str) -> Self {
        let settings = &method.settings;

        let (mut height, mut width, mut length, mut weight) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
        for line in &package.contents {
            let quantity = f64::from(line.quantity);
            height += line.height * quantity;
            width = width.max(line.width);
            length = length.max(line.length);
            weight += line.weight * quantity;
        }

        let declared_value = (settings.declare_value
            && package.contents_cost >= declared_value_minimum())
        .then_some(package.contents_cost);

        let corporate = settings.service_type == ServiceType::Corporate;

        Self {
            service_code: method.service_code.clone(),
            origin_postcode: origin_postcode.to_string(),
            destination_postcode: package.destination_postcode.clone(),
            height: height.max(settings.minimum_height),
            width: width.max(settings.minimum_width),
            length: length.max(settings.minimum_length),
            weight: weight + settings.extra_weight,
            declared_value,
            own_hands: settings.own_hands,
            receipt_notice: settings.receipt_notice,
            login: if corporate { settings.login.clone() } else { None },
            password: if corporate { settings.password.clone() } else { None },
        }
    }

    /// CalcPrecoPrazo query string.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("nCdEmpresa", self.login.clone().unwrap_or_default()),
            ("sDsSenha", self.password.clone().unwrap_or_default()),
            ("nCdServico", self.service_code.clone()),
            ("sCepOrigem", self.origin_postcode.clone()),
            ("sCepDestino", self.destination_postcode.clone()),
            ("nVlPeso", format_number(self.weight)),
            ("nCdFormato", "1".to_string()),
            ("nVlComprimento", format_number(self.length)),
            ("nVlAltura", format_number(self.height)),
            ("nVlLargura", format_number(self.width)),
            ("nVlDiametro", "0".to_string()),
            ("sCdMaoPropria", yes_no(self.own_hands).to_string()),
            (
                "nVlValorDeclarado",
                self.declared_value
                    .map(|v| v.round_dp(2).to_string().replace('.', ","))
                    .unwrap_or_else(|| "0".to_string()),
            ),
            ("sCdAvisoRecebimento", yes_no(self.receipt_notice).to_string()),
            ("StrRetorno", "xml".to_string()),
            ("nIndicaCalculo", "3".to_string()),
        ]
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "S"
    } else {
        "N"
    }
}

fn format_number(value: f64) -> String {
    value.to_string().replace('.', ",")
}

/// "1.234,56" -> 1234.56
pub fn normalize_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace('.', "").replace(',', ".");
    Decimal::from_str(&cleaned).ok()
}

/// Applies a store fee: "10%" adds a percentage, "5.00" a fixed amount.
pub fn apply_fee(price: Decimal, fee: Option<&str>) -> Decimal {
    let Some(fee) = fee.map(str::trim).filter(|f| !f.is_empty()) else {
        return price;
    };

    let adjusted = if let Some(percentage) = fee.strip_suffix('%') {
        match Decimal::from_str(&percentage.trim().replace(',', ".")) {
            Ok(p) => (Decimal::ONE_HUNDRED + p)
                .checked_mul(price)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
            Err(_) => {
                tracing::warn!("Ignoring malformed percentage fee '{}'", fee);
                return price;
            }
        }
    } else {
        match Decimal::from_str(&fee.replace(',', ".")) {
            Ok(amount) => price.checked_add(amount),
            Err(_) => {
                tracing::warn!("Ignoring malformed fee '{}'", fee);
                return price;
            }
        }
    };

    adjusted.unwrap_or_else(|| {
        tracing::warn!("Ignoring fee '{}': price {} out of range", fee, price);
        price
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PackageLine;

    fn package(cost: Decimal, quantity: u32) -> CorreiosPackage {
        CorreiosPackage {
            destination_postcode: "04510000".to_string(),
            contents_cost: cost,
            contents: vec![PackageLine {
                product_id: 1,
                height: 2.0,
                width: 11.0,
                length: 16.0,
                weight: 0.5,
                quantity,
            }],
        }
    }

    #[test]
    fn test_stacks_items_and_applies_minimums() {
        let mut method = ShippingMethod::new(1, "pac", "PAC", "04510");
        method.settings.minimum_length = 20.0;
        method.settings.extra_weight = 0.1;

        let request = CorreiosRequest::build(&method, &package(Decimal::TEN, 3), "01310100");
        assert_eq!(request.height, 6.0);
        assert_eq!(request.width, 11.0);
        assert_eq!(request.length, 20.0);
        assert!((request.weight - 1.6).abs() < 1e-9);
        assert_eq!(request.service_code, "04510");
    }

    #[test]
    fn test_declared_value_threshold() {
        let mut method = ShippingMethod::new(1, "pac", "PAC", "04510");
        method.settings.declare_value = true;

        let below = CorreiosRequest::build(&method, &package(Decimal::new(1849, 2), 1), "01310100");
        assert_eq!(below.declared_value, None);

        let at = CorreiosRequest::build(&method, &package(Decimal::new(1850, 2), 1), "01310100");
        assert_eq!(at.declared_value, Some(Decimal::new(1850, 2)));

        method.settings.declare_value = false;
        let off = CorreiosRequest::build(&method, &package(Decimal::new(20000, 2), 1), "01310100");
        assert_eq!(off.declared_value, None);
    }

    #[test]
    fn test_credentials_only_for_corporate_contracts() {
        let mut method = ShippingMethod::new(1, "sedex", "SEDEX", "04014");
        method.settings.login = Some("empresa".to_string());
        method.settings.password = Some("segredo".to_string());

        let request = CorreiosRequest::build(&method, &package(Decimal::TEN, 1), "01310100");
        assert!(request.login.is_none());

        method.settings.service_type = ServiceType::Corporate;
        let request = CorreiosRequest::build(&method, &package(Decimal::TEN, 1), "01310100");
        assert_eq!(request.login.as_deref(), Some("empresa"));
        assert_eq!(request.password.as_deref(), Some("segredo"));
    }

    #[test]
    fn test_query_params_use_correios_number_format() {
        let mut method = ShippingMethod::new(1, "pac", "PAC", "04510");
        method.settings.own_hands = true;
        let request = CorreiosRequest::build(&method, &package(Decimal::TEN, 1), "01310100");
        let params = request.query_params();

        let get = |key: &str| params.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone());
        assert_eq!(get("nVlPeso").as_deref(), Some("0,5"));
        assert_eq!(get("sCdMaoPropria").as_deref(), Some("S"));
        assert_eq!(get("sCdAvisoRecebimento").as_deref(), Some("N"));
        assert_eq!(get("nVlValorDeclarado").as_deref(), Some("0"));
        assert_eq!(get("sCepDestino").as_deref(), Some("04510000"));
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("23,50"), Some(Decimal::new(2350, 2)));
        assert_eq!(normalize_price("1.234,56"), Some(Decimal::new(123456, 2)));
        assert_eq!(normalize_price(""), None);
    }

    #[test]
    fn test_apply_fee() {
        let price = Decimal::new(2000, 2);
        assert_eq!(apply_fee(price, None), price);
        assert_eq!(apply_fee(price, Some("10%")), Decimal::new(2200, 2));
        assert_eq!(apply_fee(price, Some("5.00")), Decimal::new(2500, 2));
        assert_eq!(apply_fee(price, Some("2,50")), Decimal::new(2250, 2));
        assert_eq!(apply_fee(price, Some("abc")), price);
        assert_eq!(apply_fee(Decimal::MAX, Some("10%")), Decimal::MAX);
        assert_eq!(apply_fee(Decimal::MAX, Some("5.00")), Decimal::MAX);
    }
}
