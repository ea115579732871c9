use crate::utils::error::ShippingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CEP digits after normalization.
pub const POSTCODE_LENGTH: usize = 8;

/// 只保留數字 ("04510-000" -> "04510000")
pub fn normalize_postcode(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn is_valid_postcode(raw: &str) -> bool {
    normalize_postcode(raw).len() == POSTCODE_LENGTH
}

/// A postcode rule as written in a zone configuration.
///
/// - `04510000` or `04510-000` matches exactly that code
/// - `045*` matches every code starting with `045`
/// - `01000000...09999999` matches the inclusive numeric range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PostcodeMatcher {
    Exact(String),
    Wildcard(String),
    Range(u64, u64),
}

impl PostcodeMatcher {
    pub fn matches(&self, postcode: &str) -> bool {
        match self {
            PostcodeMatcher::Exact(code) => code == postcode,
            PostcodeMatcher::Wildcard(prefix) => postcode.starts_with(prefix.as_str()),
            PostcodeMatcher::Range(low, high) => postcode
                .parse::<u64>()
                .map(|value| (*low..=*high).contains(&value))
                .unwrap_or(false),
        }
    }
}

impl FromStr for PostcodeMatcher {
    type Err = ShippingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ShippingError::InvalidConfigValueError {
            field: "zones.postcodes".to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if let Some((low, high)) = trimmed.split_once("...") {
            let low = normalize_postcode(low)
                .parse::<u64>()
                .map_err(|_| invalid("Range start is not numeric"))?;
            let high = normalize_postcode(high)
                .parse::<u64>()
                .map_err(|_| invalid("Range end is not numeric"))?;
            if low > high {
                return Err(invalid("Range start is greater than range end"));
            }
            return Ok(PostcodeMatcher::Range(low, high));
        }

        if let Some(prefix) = trimmed.strip_suffix('*') {
            let prefix = normalize_postcode(prefix);
            if prefix.is_empty() || prefix.len() > POSTCODE_LENGTH {
                return Err(invalid("Wildcard prefix must have 1 to 8 digits"));
            }
            return Ok(PostcodeMatcher::Wildcard(prefix));
        }

        let code = normalize_postcode(trimmed);
        if code.len() != POSTCODE_LENGTH {
            return Err(invalid("Postcode must have exactly 8 digits"));
        }
        Ok(PostcodeMatcher::Exact(code))
    }
}

impl TryFrom<String> for PostcodeMatcher {
    type Error = ShippingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PostcodeMatcher> for String {
    fn from(matcher: PostcodeMatcher) -> Self {
        matcher.to_string()
    }
}

impl fmt::Display for PostcodeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostcodeMatcher::Exact(code) => write!(f, "{}", code),
            PostcodeMatcher::Wildcard(prefix) => write!(f, "{}*", prefix),
            PostcodeMatcher::Range(low, high) => write!(
                f,
                "{:0width$}...{:0width$}",
                low,
                high,
                width = POSTCODE_LENGTH
            ),
        }
    }
}
