use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::core::config::MAX_REASSERTIONS;
use crate::core::dom::SharedDocument;

/// Keeps the overlay stylesheet present in the document head.
///
/// Host re-renders may drop foreign nodes from `<head>`; the guard puts the
/// stylesheet back whenever it is found missing.
#[derive(Clone)]
pub struct StyleGuard {
    doc: SharedDocument,
    marker_id: String,
    payload: String,
}

impl StyleGuard {
    pub fn new(doc: SharedDocument, marker_id: &str, payload: &str) -> Self {
        Self {
            doc,
            marker_id: marker_id.to_string(),
            payload: payload.to_string(),
        }
    }

    /// Append the stylesheet to the live `<head>` if no attached element
    /// carries the marker id. Returns true if a node was inserted.
    pub fn ensure_injected(&self) -> bool {
        let mut doc = self.doc.borrow_mut();
        if doc.get_element_by_id(&self.marker_id).is_some() {
            return false;
        }
        let style = doc.create_element("style");
        doc.set_id(style, &self.marker_id);
        doc.set_text(style, &self.payload);
        let head = doc.head();
        doc.append_child(head, style);
        debug!(marker = %self.marker_id, "stylesheet injected");
        true
    }

    /// Re-check the stylesheet after every batch of structural changes.
    /// Must run inside a `LocalSet`.
    pub fn spawn_watcher(&self) -> JoinHandle<()> {
        let mut rx = self.doc.borrow_mut().subscribe();
        let guard = self.clone();
        tokio::task::spawn_local(async move {
            while let Some(first) = rx.recv().await {
                // Coalesce everything already queued into one check.
                let mut removed = first.removed.len();
                let mut batch = 1;
                while let Ok(more) = rx.try_recv() {
                    removed += more.removed.len();
                    batch += 1;
                }
                trace!(
                    target_node = first.target,
                    added = first.added.len(),
                    removed,
                    batch,
                    "document changed"
                );
                if guard.ensure_injected() {
                    debug!(batch, "stylesheet restored after host change");
                }
            }
        })
    }

    /// Re-check at fixed offsets from now. At most `MAX_REASSERTIONS` are honored.
    pub fn spawn_reassertions(&self, delays_ms: &[u64]) -> JoinHandle<()> {
        let mut delays = delays_ms.to_vec();
        delays.sort_unstable();
        delays.truncate(MAX_REASSERTIONS);
        let start = tokio::time::Instant::now();
        let guard = self.clone();
        tokio::task::spawn_local(async move {
            for delay in delays {
                tokio::time::sleep_until(start + Duration::from_millis(delay)).await;
                if guard.ensure_injected() {
                    debug!(delay_ms = delay, "stylesheet restored by timed check");
                }
            }
        })
    }
}
