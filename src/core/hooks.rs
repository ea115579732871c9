//! Named extension points of the quote pipeline.
//!
//! Callers build a [`Hooks`] registry and hand it to the calculator; nothing
//! here is global. Every callback runs to completion on the calling task. A
//! callback that panics is logged and skipped, it never fails the quote.

use crate::core::payload::Payload;
use crate::core::rules::{RuleCallback, RuleRegistry, ValidationRules};
use crate::domain::model::{ShippingMethod, ShippingZone};
use crate::utils::error::HandlerError;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    InvalidShippingZone,
    InvalidShippingMethods,
    HandlerError,
}

impl HookPoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::InvalidShippingZone => "exception_invalid_shipping_zone",
            HookPoint::InvalidShippingMethods => "exception_invalid_shipping_method_provided",
            HookPoint::HandlerError => "exception_handler_error",
        }
    }
}

/// In-flight context handed to notification listeners.
#[derive(Debug, Clone, Copy)]
pub enum HookEvent<'a> {
    InvalidShippingZone {
        payload: &'a Payload,
    },
    InvalidShippingMethods {
        zone: &'a ShippingZone,
        payload: &'a Payload,
    },
    HandlerError {
        method: &'a ShippingMethod,
        error: &'a HandlerError,
        payload: &'a Payload,
    },
}

impl HookEvent<'_> {
    pub fn point(&self) -> HookPoint {
        match self {
            HookEvent::InvalidShippingZone { .. } => HookPoint::InvalidShippingZone,
            HookEvent::InvalidShippingMethods { .. } => HookPoint::InvalidShippingMethods,
            HookEvent::HandlerError { .. } => HookPoint::HandlerError,
        }
    }
}

pub type Listener = Arc<dyn Fn(&HookEvent<'_>) + Send + Sync>;
pub type ZoneFilter = Arc<dyn Fn(ShippingZone, &Payload) -> ShippingZone + Send + Sync>;

#[derive(Clone, Default)]
pub struct Hooks {
    rules: HashMap<String, Vec<RuleCallback>>,
    zone_filters: Vec<ZoneFilter>,
    listeners: HashMap<HookPoint, Vec<Listener>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule writer for one handler slug. Runs before the handler's own
    /// defaults, so whatever it sets wins.
    pub fn add_rules<F>(&mut self, slug: &str, callback: F) -> &mut Self
    where
        F: Fn(&mut ValidationRules) + Send + Sync + 'static,
    {
        self.rules
            .entry(slug.to_string())
            .or_default()
            .push(Arc::new(callback));
        self
    }

    /// Filter that may substitute the resolved zone.
    pub fn add_zone_filter<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(ShippingZone, &Payload) -> ShippingZone + Send + Sync + 'static,
    {
        self.zone_filters.push(Arc::new(filter));
        self
    }

    pub fn on<F>(&mut self, point: HookPoint, listener: F) -> &mut Self
    where
        F: Fn(&HookEvent<'_>) + Send + Sync + 'static,
    {
        self.listeners
            .entry(point)
            .or_default()
            .push(Arc::new(listener));
        self
    }

    pub fn rule_registry(&self, slug: &str) -> RuleRegistry {
        RuleRegistry::with_callbacks(slug, self.rules.get(slug).cloned().unwrap_or_default())
    }

    pub fn apply_zone_filters(&self, zone: ShippingZone, payload: &Payload) -> ShippingZone {
        let mut zone = zone;
        for filter in &self.zone_filters {
            let candidate = zone.clone();
            if let Some(filtered) = isolate("get_shipping_zone", || filter(candidate, payload)) {
                if filtered.id != zone.id {
                    tracing::debug!("Zone {} substituted by {}", zone.name, filtered.name);
                }
                zone = filtered;
            }
        }
        zone
    }

    pub fn notify(&self, event: HookEvent<'_>) {
        let point = event.point();
        if let Some(listeners) = self.listeners.get(&point) {
            for listener in listeners {
                isolate(point.as_str(), || listener(&event));
            }
        }
    }
}

/// Runs an extension callback, swallowing (and logging) a panic.
pub(crate) fn isolate<R>(hook: &str, callback: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(value) => Some(value),
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("❌ Extension callback for '{}' panicked: {}", hook, message);
            None
        }
    }
}
