use serde::{Deserialize, Serialize};

use crate::core::catalog::CatalogEntry;
use crate::core::models::stats::{lenient_amount, lenient_count};

/// Usage of one cat in one time slot of the selected range.
///
/// Slots are hourly (`2026-03-01-14`) for the day range and daily
/// (`2026-03-01`) otherwise. Both shapes sort chronologically as strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    #[serde(alias = "hour_slot", alias = "date_slot")]
    pub time_slot: String,
    pub cat_id: String,
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: u64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cost_usd: f64,
}

impl TrendPoint {
    pub fn entry(&self) -> Option<&'static CatalogEntry> {
        CatalogEntry::from_id(&self.cat_id)
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Tokens per slot for `cat_id`, oldest slot first. Points sharing a slot
/// are summed; points for cats outside the catalog never match.
pub fn token_series(points: &[TrendPoint], cat_id: &str) -> Vec<f64> {
    let mut slots: Vec<(&str, u64)> = Vec::new();
    for point in points {
        if point.entry().map(|e| e.id) != Some(cat_id) {
            continue;
        }
        match slots.iter_mut().find(|(slot, _)| *slot == point.time_slot) {
            Some((_, tokens)) => *tokens = tokens.saturating_add(point.total_tokens()),
            None => slots.push((point.time_slot.as_str(), point.total_tokens())),
        }
    }
    slots.sort_by(|a, b| a.0.cmp(b.0));
    slots.into_iter().map(|(_, tokens)| tokens as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(slot: &str, cat: &str, input: u64) -> TrendPoint {
        TrendPoint {
            time_slot: slot.to_string(),
            cat_id: cat.to_string(),
            input_tokens: input,
            output_tokens: 10,
            ..Default::default()
        }
    }

    #[test]
    fn hourly_and_daily_slot_keys_both_parse() {
        let hourly: TrendPoint = serde_json::from_str(
            r#"{"hour_slot": "2026-03-01-14", "cat_id": "arch", "input_tokens": 5, "output_tokens": null, "cost_usd": 0.01}"#,
        )
        .unwrap();
        assert_eq!(hourly.time_slot, "2026-03-01-14");
        assert_eq!(hourly.total_tokens(), 5);

        let daily: TrendPoint =
            serde_json::from_str(r#"{"time_slot": "2026-03-01", "cat_id": "stack"}"#).unwrap();
        assert_eq!(daily.time_slot, "2026-03-01");
        assert_eq!(daily.cost_usd, 0.0);
    }

    #[test]
    fn token_series_orders_slots_and_merges_duplicates() {
        let points = vec![
            point("2026-03-03", "arch", 90),
            point("2026-03-01", "arch", 0),
            point("2026-03-02", "pixel", 500),
            point("2026-03-01", "arch", 20),
            point("2026-03-02", "ghost", 1),
        ];
        assert_eq!(token_series(&points, "arch"), vec![40.0, 100.0]);
        assert_eq!(token_series(&points, "pixel"), vec![510.0]);
        assert!(token_series(&points, "stack").is_empty());
        assert!(token_series(&points, "ghost").is_empty());
    }
}
