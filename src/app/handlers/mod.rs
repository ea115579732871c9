pub mod correios_webservice;

use crate::core::handler::{HandlerRegistry, ShippingMethodHandler};
use crate::domain::ports::RateLibrary;
use std::sync::Arc;

pub use correios_webservice::CorreiosWebserviceHandler;

/// Method ids quoted through the Correios webservice.
pub const CORREIOS_METHOD_IDS: [&str; 6] = ["pac", "sedex", "sedex10", "sedex12", "sedex_hoje", "esedex"];

/// Registry with every Correios method bound to `library`.
pub fn correios_registry(library: Arc<dyn RateLibrary>) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for id in CORREIOS_METHOD_IDS {
        let library = library.clone();
        registry.register(id, move |method| {
            Box::new(CorreiosWebserviceHandler::new(method, library.clone()))
                as Box<dyn ShippingMethodHandler>
        });
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::correios::{CorreiosWebservice, DEFAULT_ENDPOINT};
    use crate::domain::model::ShippingMethod;

    #[test]
    fn test_registry_covers_correios_methods() {
        let library = Arc::new(CorreiosWebservice::new(DEFAULT_ENDPOINT, "01310100", None));
        let registry = correios_registry(library);

        assert_eq!(
            registry.method_ids(),
            vec!["esedex", "pac", "sedex", "sedex10", "sedex12", "sedex_hoje"]
        );
        assert!(!registry.supports("jadlog"));

        let handler = registry
            .create(Arc::new(ShippingMethod::new(3, "sedex10", "SEDEX 10", "40215")))
            .unwrap();
        assert_eq!(handler.slug(), "sedex10");
        assert_eq!(handler.method().service_code, "40215");
    }
}
