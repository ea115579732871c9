//! Correios CalcPrecoPrazo webservice, exposed as a [`RateLibrary`].
//!
//! The library only publishes its rate computation as the private
//! `correios_shipping::get_rate` entry point; callers locate it through
//! [`RateLibrary::private_entry`] and downcast what it returns.

pub mod request;
pub mod xml;

use crate::domain::model::{CorreiosPackage, ShippingMethod};
use crate::domain::ports::{PrivateRateEntry, RateLibrary, RateLibraryError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

pub use request::CorreiosRequest;

pub const CORREIOS_SHIPPING_CLASS: &str = "correios_shipping";
pub const GET_RATE_ENTRY: &str = "get_rate";
pub const DEFAULT_ENDPOINT: &str = "http://ws.correios.com.br/calculador/CalcPrecoPrazo.aspx";

/// Internal `cServico` record of the webservice reply.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CorreiosServiceResponse {
    pub codigo: String,
    pub valor: String,
    pub prazo_entrega: String,
    pub valor_sem_adicionais: String,
    pub erro: String,
    pub msg_erro: String,
}

impl CorreiosServiceResponse {
    /// Correios reports success with the "0" sentinel in `Erro`.
    pub fn is_ok(&self) -> bool {
        self.erro == "0"
    }
}

struct WebserviceClient {
    client: Client,
    endpoint: String,
    origin_postcode: String,
    timeout: Option<Duration>,
}

impl WebserviceClient {
    async fn get_shipping(
        &self,
        request: &CorreiosRequest,
    ) -> Result<Box<dyn Any + Send>, RateLibraryError> {
        let mut http = self.client.get(&self.endpoint).query(&request.query_params());
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        tracing::debug!(
            "Calling Correios webservice for service {} to {}",
            request.service_code,
            request.destination_postcode
        );
        let response = http.send().await?;
        let status = response.status();
        tracing::debug!("Correios response status: {}", status);

        if !status.is_success() {
            return Err(RateLibraryError::Api(format!("HTTP {}", status)));
        }

        let body = response.text().await?;
        match xml::parse_service(&body) {
            Some(service) => Ok(Box::new(service)),
            // 沒有 cServico: 原樣回傳，由呼叫端判斷
            None => Ok(Box::new(body)),
        }
    }
}

#[derive(Clone)]
pub struct CorreiosWebservice {
    inner: Arc<WebserviceClient>,
}

impl CorreiosWebservice {
    pub fn new(endpoint: &str, origin_postcode: &str, timeout: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(WebserviceClient {
                client: Client::new(),
                endpoint: endpoint.to_string(),
                origin_postcode: crate::domain::postcode::normalize_postcode(origin_postcode),
                timeout,
            }),
        }
    }

    pub fn origin_postcode(&self) -> &str {
        &self.inner.origin_postcode
    }
}

impl RateLibrary for CorreiosWebservice {
    fn private_entry(&self, class: &str, name: &str) -> Option<Arc<dyn PrivateRateEntry>> {
        match (class, name) {
            (CORREIOS_SHIPPING_CLASS, GET_RATE_ENTRY) => Some(Arc::new(GetRate {
                client: self.inner.clone(),
            })),
            _ => None,
        }
    }
}

struct GetRate {
    client: Arc<WebserviceClient>,
}

#[async_trait]
impl PrivateRateEntry for GetRate {
    async fn invoke(
        &self,
        method: &ShippingMethod,
        package: &CorreiosPackage,
    ) -> Result<Box<dyn Any + Send>, RateLibraryError> {
        let request = CorreiosRequest::build(method, package, &self.client.origin_postcode);
        self.client.get_shipping(&request).await
    }
}
