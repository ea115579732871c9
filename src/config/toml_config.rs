use crate::adapters::correios::{CorreiosWebservice, DEFAULT_ENDPOINT};
use crate::app::handlers::{correios_registry, CORREIOS_METHOD_IDS};
use crate::core::calculator::QuoteContext;
use crate::core::costs::DEFAULT_HANDLER_TIMEOUT;
use crate::core::hooks::Hooks;
use crate::core::rules::{Bound, RuleField};
use crate::core::zone::ZoneStore;
use crate::domain::model::{ServiceType, ShippingMethod, ShippingZone};
use crate::domain::postcode::PostcodeMatcher;
use crate::utils::error::{Result, ShippingError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub webservice: WebserviceConfig,
    #[serde(default)]
    pub methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub zones: Vec<ZoneConfig>,
    /// slug -> field -> bound, e.g. `[rules.pac] weight = { max = 20 }`
    #[serde(default)]
    pub rules: BTreeMap<String, BTreeMap<String, Bound>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub origin_postcode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebserviceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    /// 每個運送方式的總時限
    pub handler_timeout_seconds: Option<u64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for WebserviceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: None,
            handler_timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub id: u32,
    pub name: String,
    pub postcodes: Vec<PostcodeMatcher>,
    /// Method ids in quoting order.
    #[serde(default)]
    pub methods: Vec<String>,
}

impl ShippingConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ShippingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ShippingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CORREIOS_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ShippingError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });
        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_postcode("store.origin_postcode", &self.store.origin_postcode)?;
        validation::validate_url("webservice.endpoint", &self.webservice.endpoint)?;

        if let Some(timeout) = self.webservice.timeout_seconds {
            validation::validate_range("webservice.timeout_seconds", timeout, 1, 300)?;
        }
        if let Some(timeout) = self.webservice.handler_timeout_seconds {
            validation::validate_positive_number("webservice.handler_timeout_seconds", timeout, 1)?;
        }

        let mut method_ids = HashSet::new();
        for method in &self.methods {
            validation::validate_non_empty_string("methods.id", &method.id)?;
            if !method_ids.insert(method.id.as_str()) {
                return Err(ShippingError::InvalidConfigValueError {
                    field: "methods.id".to_string(),
                    value: method.id.clone(),
                    reason: "Duplicate method id".to_string(),
                });
            }

            if CORREIOS_METHOD_IDS.contains(&method.id.as_str()) {
                validation::validate_non_empty_string(
                    &format!("methods.{}.service_code", method.id),
                    &method.service_code,
                )?;
            } else {
                tracing::warn!("⚠️  Method '{}' has no handler and will never be quoted", method.id);
            }

            if method.settings.service_type == ServiceType::Corporate {
                validation::validate_required_field(
                    &format!("methods.{}.settings.login", method.id),
                    &method.settings.login,
                )?;
                validation::validate_required_field(
                    &format!("methods.{}.settings.password", method.id),
                    &method.settings.password,
                )?;
            }
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                return Err(ShippingError::InvalidConfigValueError {
                    field: "zones.id".to_string(),
                    value: zone.id.to_string(),
                    reason: "Duplicate zone id".to_string(),
                });
            }
            let mut zone_methods = HashSet::new();
            for id in &zone.methods {
                if !zone_methods.insert(id.as_str()) {
                    return Err(ShippingError::InvalidConfigValueError {
                        field: format!("zones.{}.methods", zone.name),
                        value: id.clone(),
                        reason: "Method listed twice in the same zone".to_string(),
                    });
                }
                if !method_ids.contains(id.as_str()) {
                    return Err(ShippingError::InvalidConfigValueError {
                        field: format!("zones.{}.methods", zone.name),
                        value: id.clone(),
                        reason: "Unknown method id".to_string(),
                    });
                }
            }
        }

        for (slug, fields) in &self.rules {
            for (field, bound) in fields {
                field.parse::<RuleField>().map_err(|_| ShippingError::InvalidConfigValueError {
                    field: format!("rules.{}", slug),
                    value: field.clone(),
                    reason: format!(
                        "Unknown rule field. Valid fields: {}",
                        RuleField::ALL.map(|f| f.as_str()).join(", ")
                    ),
                })?;
                if let (Some(min), Some(max)) = (bound.min, bound.max) {
                    if min > max {
                        return Err(ShippingError::InvalidConfigValueError {
                            field: format!("rules.{}.{}", slug, field),
                            value: format!("{}..{}", min, max),
                            reason: "min is greater than max".to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// 區域依設定檔順序建立，方法依區域列出的順序排列
    pub fn to_zone_store(&self) -> ZoneStore {
        let methods: HashMap<&str, Arc<ShippingMethod>> = self
            .methods
            .iter()
            .map(|m| (m.id.as_str(), Arc::new(m.clone())))
            .collect();

        let zones = self
            .zones
            .iter()
            .map(|zone| ShippingZone {
                id: zone.id,
                name: zone.name.clone(),
                matchers: zone.postcodes.clone(),
                methods: zone
                    .methods
                    .iter()
                    .filter_map(|id| methods.get(id.as_str()).cloned())
                    .collect(),
            })
            .collect();

        ZoneStore::new(zones)
    }

    /// Hooks seeded with the `[rules.<slug>]` overrides.
    pub fn hooks(&self) -> Result<Hooks> {
        let mut hooks = Hooks::new();
        for (slug, fields) in &self.rules {
            let mut bounds = Vec::with_capacity(fields.len());
            for (field, bound) in fields {
                let field = field.parse::<RuleField>()?;
                bounds.push((field, *bound));
            }
            hooks.add_rules(slug, move |rules| {
                for (field, bound) in &bounds {
                    rules.set_default(*field, bound.min, bound.max);
                }
            });
        }
        Ok(hooks)
    }

    pub fn handler_timeout(&self) -> Duration {
        self.webservice
            .handler_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_HANDLER_TIMEOUT)
    }

    pub fn webservice(&self) -> CorreiosWebservice {
        CorreiosWebservice::new(
            &self.webservice.endpoint,
            &self.store.origin_postcode,
            self.webservice.timeout_seconds.map(Duration::from_secs),
        )
    }

    /// Everything a calculator needs, wired against the live webservice.
    pub fn quote_context(&self) -> Result<QuoteContext> {
        let registry = correios_registry(Arc::new(self.webservice()));
        Ok(QuoteContext::new(self.to_zone_store(), registry, self.hooks()?)
            .with_handler_timeout(self.handler_timeout()))
    }
}

impl Validate for ShippingConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
