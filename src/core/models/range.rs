use serde::{Deserialize, Serialize};

/// Aggregation window for the statistics query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Range {
    Day,
    #[default]
    Week,
    Month,
}

impl Range {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// Value sent as the `range` query parameter.
    pub fn id(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Button label in the range group.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "24 hours",
            Self::Week => "7 days",
            Self::Month => "30 days",
        }
    }

    /// All ranges in button order.
    pub fn all() -> &'static [Range] {
        &[Range::Day, Range::Week, Range::Month]
    }
}
