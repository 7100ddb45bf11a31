use chrono::Local;
use tracing::debug;

use crate::core::catalog::{CatalogEntry, CATALOG};
use crate::core::dom::{Document, NodeId, SharedDocument};
use crate::core::formatter::{format_cost, format_grouped, format_updated_at, sparkline};
use crate::core::models::stats::StatsPayload;
use crate::core::models::trend::{token_series, TrendPoint};
use crate::overlay::drawer::content_slot;

pub const CARD_CLASS: &str = "catstats-card";
pub const EMPTY_CLASS: &str = "catstats-empty";
pub const LOADING_CLASS: &str = "catstats-loading";
pub const ERROR_CLASS: &str = "catstats-error";
pub const FOOTER_CLASS: &str = "catstats-footer";

pub const EMPTY_TEXT: &str = "No usage data";
pub const LOADING_TEXT: &str = "Loading…";

/// Display-ready values for one cat.
#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub entry: &'static CatalogEntry,
    pub avatar: String,
    pub calls: String,
    pub input_tokens: String,
    pub output_tokens: String,
    pub cache_read_tokens: String,
    pub cost: String,
    /// Token sparkline across the range's slots; empty without trend data.
    pub trend: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsView {
    /// No catalog entry made a call in the range.
    Empty,
    Cards { cards: Vec<StatCard>, total_cost: String },
}

/// Map a payload to cards: catalog order, absent entries skipped, unknown
/// ids ignored.
pub fn build_view(stats: &StatsPayload, trend: &[TrendPoint], avatar_base: &str) -> StatsView {
    let any_calls = CATALOG
        .iter()
        .filter_map(|e| stats.get(e.id))
        .any(|s| s.call_count > 0);
    if !any_calls {
        return StatsView::Empty;
    }

    let mut total = 0.0;
    let cards = CATALOG
        .iter()
        .filter_map(|entry| {
            let s = stats.get(entry.id)?;
            total += s.cost_usd;
            Some(StatCard {
                entry,
                avatar: entry.avatar_path(avatar_base),
                calls: format_grouped(s.call_count),
                input_tokens: format_grouped(s.input_tokens),
                output_tokens: format_grouped(s.output_tokens),
                cache_read_tokens: format_grouped(s.cache_read_tokens),
                cost: format_cost(s.cost_usd),
                trend: sparkline(&token_series(trend, entry.id)),
            })
        })
        .collect();

    StatsView::Cards {
        cards,
        total_cost: format_cost(total),
    }
}

/// Writes loading, error and card output into the panel's content slot.
#[derive(Clone)]
pub struct StatsRenderer {
    doc: SharedDocument,
    panel_id: String,
    avatar_base: String,
}

impl StatsRenderer {
    pub fn new(doc: SharedDocument, panel_id: &str, avatar_base: &str) -> Self {
        Self {
            doc,
            panel_id: panel_id.to_string(),
            avatar_base: avatar_base.to_string(),
        }
    }

    pub fn render(&self, stats: &StatsPayload) {
        self.render_with_trend(stats, &[]);
    }

    pub fn render_with_trend(&self, stats: &StatsPayload, trend: &[TrendPoint]) {
        let view = build_view(stats, trend, &self.avatar_base);
        self.fill_slot(|doc| match &view {
            StatsView::Empty => vec![doc.create_with("div", &[EMPTY_CLASS], EMPTY_TEXT)],
            StatsView::Cards { cards, total_cost } => {
                let mut nodes: Vec<NodeId> = cards.iter().map(|c| card_node(doc, c)).collect();
                let footer = doc.create_with("div", &[FOOTER_CLASS], "");
                let total = doc.create_with("span", &["catstats-total"], &format!("Total {}", total_cost));
                let updated = doc.create_with(
                    "span",
                    &["catstats-updated"],
                    &format_updated_at(&Local::now()),
                );
                doc.append_child(footer, total);
                doc.append_child(footer, updated);
                nodes.push(footer);
                nodes
            }
        });
    }

    pub fn show_loading(&self) {
        self.fill_slot(|doc| vec![doc.create_with("div", &[LOADING_CLASS], LOADING_TEXT)]);
    }

    pub fn show_error(&self, message: &str) {
        self.fill_slot(|doc| {
            vec![doc.create_with(
                "div",
                &[ERROR_CLASS],
                &format!("Failed to load stats: {}", message),
            )]
        });
    }

    fn fill_slot(&self, build: impl FnOnce(&mut Document) -> Vec<NodeId>) {
        let mut doc = self.doc.borrow_mut();
        let Some(slot) = content_slot(&doc, &self.panel_id) else {
            debug!(panel = %self.panel_id, "content slot missing; skipping render");
            return;
        };
        let nodes = build(&mut doc);
        doc.replace_children(slot, &nodes);
    }
}

fn card_node(doc: &mut Document, card: &StatCard) -> NodeId {
    let node = doc.create_with("div", &[CARD_CLASS], "");
    doc.set_attr(node, "data-cat", card.entry.id);

    let head = doc.create_with("div", &["catstats-card-head"], "");
    let avatar = doc.create_with("img", &["catstats-avatar"], "");
    doc.set_attr(avatar, "src", &card.avatar);
    doc.set_attr(avatar, "alt", card.entry.display_name);
    let name = doc.create_with("span", &["catstats-name"], card.entry.display_name);
    let badge = doc.create_with("span", &["catstats-badge"], card.entry.theme_badge);
    for child in [avatar, name, badge] {
        doc.append_child(head, child);
    }
    doc.append_child(node, head);

    let rows = [
        ("calls", "Calls", &card.calls),
        ("input", "Input", &card.input_tokens),
        ("output", "Output", &card.output_tokens),
        ("cache-read", "Cache read", &card.cache_read_tokens),
        ("cost", "Cost", &card.cost),
    ];
    for (key, label, value) in rows {
        let row = doc.create_with("div", &["catstats-row"], "");
        doc.set_attr(row, "data-field", key);
        let l = doc.create_with("span", &["catstats-label"], label);
        let v = doc.create_with("span", &["catstats-value"], value);
        doc.append_child(row, l);
        doc.append_child(row, v);
        doc.append_child(node, row);
    }

    if !card.trend.is_empty() {
        let row = doc.create_with("div", &["catstats-row", "catstats-trend"], "");
        doc.set_attr(row, "data-field", "trend");
        let l = doc.create_with("span", &["catstats-label"], "Trend");
        let v = doc.create_with("span", &["catstats-value"], &card.trend);
        doc.append_child(row, l);
        doc.append_child(row, v);
        doc.append_child(node, row);
    }
    node
}
