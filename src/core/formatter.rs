use chrono::{DateTime, TimeZone};
use num_format::{Locale, ToFormattedString};

/// Returns a token count with digit grouping, e.g. "1,234,567".
pub fn format_grouped(count: u64) -> String {
    count.to_formatted_string(&Locale::en)
}

/// Returns "$1.2346": dollar prefix, exactly four decimals.
pub fn format_cost(cost_usd: f64) -> String {
    format!("${:.4}", cost_usd)
}

/// Returns "Updated 14:05:09" in the timestamp's own timezone.
pub fn format_updated_at<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("Updated {}", at.format("%H:%M:%S"))
}

/// Block sparkline scaled to the series maximum, one glyph per value.
pub fn sparkline(values: &[f64]) -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return LEVELS[0].to_string().repeat(values.len());
    }
    values
        .iter()
        .map(|v| {
            let ratio = (v / max).clamp(0.0, 1.0);
            LEVELS[(ratio * (LEVELS.len() - 1) as f64).round() as usize]
        })
        .collect()
}
