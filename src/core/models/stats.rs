use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::models::trend::TrendPoint;

/// Aggregated usage for one cat over the selected range.
///
/// Every counter defaults to zero when the backend omits it or sends `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    #[serde(default, deserialize_with = "lenient_count")]
    pub call_count: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_read_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_creation_tokens: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cost_usd: f64,
}

/// Catalog id -> usage. May cover only part of the catalog and may carry
/// ids the catalog does not know about.
pub type StatsPayload = HashMap<String, UsageStats>;

/// Body of `GET /api/stats`. Backends that do not report a trend omit it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatsResponse {
    pub stats: StatsPayload,
    #[serde(default)]
    pub trend: Vec<TrendPoint>,
}

impl From<StatsPayload> for StatsResponse {
    fn from(stats: StatsPayload) -> Self {
        Self {
            stats,
            trend: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(u64),
    Float(f64),
}

// SQL SUM() over an empty set can come back as null or as a float.
pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    Ok(match Option::<RawNumber>::deserialize(d)? {
        Some(RawNumber::Int(n)) => n,
        Some(RawNumber::Float(f)) if f.is_finite() && f > 0.0 => f.round() as u64,
        _ => 0,
    })
}

pub(crate) fn lenient_amount<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(match Option::<RawNumber>::deserialize(d)? {
        Some(RawNumber::Int(n)) => n as f64,
        Some(RawNumber::Float(f)) if f.is_finite() => f,
        _ => 0.0,
    })
}
