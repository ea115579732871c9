use crate::core::hooks::Hooks;
use crate::core::payload::Payload;
use crate::domain::model::ShippingZone;
use crate::utils::error::{Result, ShippingError};

/// Zones in configuration order, owned by the host configuration.
#[derive(Debug, Clone, Default)]
pub struct ZoneStore {
    zones: Vec<ShippingZone>,
}

impl ZoneStore {
    pub fn new(zones: Vec<ShippingZone>) -> Self {
        Self { zones }
    }

    pub fn zones(&self) -> &[ShippingZone] {
        &self.zones
    }

    pub fn first_matching(&self, postcode: &str) -> Option<&ShippingZone> {
        self.zones.iter().find(|zone| zone.matches(postcode))
    }
}

pub struct ZoneResolver<'a> {
    store: &'a ZoneStore,
    hooks: &'a Hooks,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(store: &'a ZoneStore, hooks: &'a Hooks) -> Self {
        Self { store, hooks }
    }

    /// First zone accepting the payload's destination code, after the zone
    /// filters had their say.
    pub fn resolve(&self, payload: &Payload) -> Result<ShippingZone> {
        let postcode = payload.postcode();
        let zone = self
            .store
            .first_matching(postcode)
            .cloned()
            .ok_or_else(|| ShippingError::NoMatchingZone {
                postcode: postcode.to_string(),
            })?;

        tracing::debug!("Postcode {} matched zone '{}'", postcode, zone.name);
        Ok(self.hooks.apply_zone_filters(zone, payload))
    }
}
