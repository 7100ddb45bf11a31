use tracing::debug;

use crate::core::dom::SharedDocument;
use crate::core::models::range::Range;
use crate::overlay::drawer::{ACTIVE_CLASS, RANGE_ATTR, RANGE_CLASS};
use crate::overlay::fetcher::{FetchTask, StatsFetcher};

/// Keeps exactly one range button marked active. The marker in the tree is
/// the only record of the selection.
#[derive(Clone)]
pub struct RangeSelector {
    doc: SharedDocument,
    panel_id: String,
    fetcher: StatsFetcher,
}

impl RangeSelector {
    pub fn new(doc: SharedDocument, panel_id: &str, fetcher: StatsFetcher) -> Self {
        Self {
            doc,
            panel_id: panel_id.to_string(),
            fetcher,
        }
    }

    /// Mark `range` active and fetch it, whether or not the panel is open.
    pub fn select(&self, range: Range) -> FetchTask {
        {
            let mut doc = self.doc.borrow_mut();
            if let Some(panel) = doc.get_element_by_id(&self.panel_id) {
                for option in doc.find_by_class(panel, RANGE_CLASS) {
                    if doc.attr(option, RANGE_ATTR) == Some(range.id()) {
                        doc.add_class(option, ACTIVE_CLASS);
                    } else {
                        doc.remove_class(option, ACTIVE_CLASS);
                    }
                }
            }
        }
        debug!(range = range.id(), "range selected");
        self.fetcher.fetch_stats(range)
    }

    /// The range whose button carries the active marker; `week` if none does.
    pub fn active(&self) -> Range {
        let doc = self.doc.borrow();
        doc.get_element_by_id(&self.panel_id)
            .and_then(|panel| {
                doc.find_by_class(panel, RANGE_CLASS)
                    .into_iter()
                    .find(|&o| doc.has_class(o, ACTIVE_CLASS))
            })
            .and_then(|o| doc.attr(o, RANGE_ATTR))
            .and_then(Range::from_id)
            .unwrap_or_default()
    }
}
