use crate::domain::model::{CorreiosPackage, ShippingMethod};
use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateLibraryError {
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webservice error: {0}")]
    Api(String),
}

/// External rate computation library.
///
/// The library keeps its rate computation out of its public surface.
/// `private_entry` is the introspection seam: it looks an entry point up by
/// class and name, the way a caller would reach a non-public method, and
/// returns `None` when the library does not expose one under that name.
pub trait RateLibrary: Send + Sync {
    fn private_entry(&self, class: &str, name: &str) -> Option<Arc<dyn PrivateRateEntry>>;
}

/// A located non-public entry point. Its return value is type-erased; the
/// caller must downcast it to the internal response type it expects.
#[async_trait]
pub trait PrivateRateEntry: Send + Sync {
    async fn invoke(
        &self,
        method: &ShippingMethod,
        package: &CorreiosPackage,
    ) -> Result<Box<dyn Any + Send>, RateLibraryError>;
}
