use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::core::dom::SharedDocument;
use crate::overlay::drawer::OPEN_CLASS;
use crate::overlay::fetcher::{FetchTask, StatsFetcher};
use crate::overlay::range_selector::RangeSelector;

/// Open/closed state of the panel. Opening is the only transition that
/// fetches.
#[derive(Clone)]
pub struct ToggleController {
    doc: SharedDocument,
    panel_id: String,
    open: Rc<Cell<bool>>,
    selector: RangeSelector,
    fetcher: StatsFetcher,
}

impl ToggleController {
    pub fn new(
        doc: SharedDocument,
        panel_id: &str,
        selector: RangeSelector,
        fetcher: StatsFetcher,
    ) -> Self {
        Self {
            doc,
            panel_id: panel_id.to_string(),
            open: Rc::new(Cell::new(false)),
            selector,
            fetcher,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.get()
    }

    /// Flip the panel. Returns the fetch started by a closed→open flip.
    pub fn toggle(&self) -> Option<FetchTask> {
        if self.is_open() {
            self.close();
            None
        } else {
            self.open()
        }
    }

    /// Open the panel and fetch the active range. No-op if already open.
    pub fn open(&self) -> Option<FetchTask> {
        if self.is_open() {
            return None;
        }
        self.set_open(true);
        Some(self.fetcher.fetch_stats(self.selector.active()))
    }

    /// Close the panel. Returns false if it was already closed.
    pub fn close(&self) -> bool {
        if !self.is_open() {
            return false;
        }
        self.set_open(false);
        true
    }

    fn set_open(&self, open: bool) {
        self.open.set(open);
        let mut doc = self.doc.borrow_mut();
        let body = doc.body();
        let targets = [doc.get_element_by_id(&self.panel_id), Some(body)];
        for node in targets.into_iter().flatten() {
            if open {
                doc.add_class(node, OPEN_CLASS);
            } else {
                doc.remove_class(node, OPEN_CLASS);
            }
        }
        debug!(open, "panel visibility changed");
    }
}
