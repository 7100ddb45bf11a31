use std::cell::Cell;
use std::rc::Rc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::client::StatsSource;
use crate::core::models::range::Range;
use crate::overlay::renderer::StatsRenderer;

/// Handle to one in-flight fetch-and-render cycle.
pub type FetchTask = JoinHandle<()>;

/// Runs one request per trigger and routes the outcome to the renderer.
///
/// Requests are never cancelled. Each one is tagged with a generation and
/// only the newest generation may write the content slot, so a slow
/// response for an old range cannot overwrite a newer one.
#[derive(Clone)]
pub struct StatsFetcher {
    source: Rc<dyn StatsSource>,
    renderer: StatsRenderer,
    generation: Rc<Cell<u64>>,
}

impl StatsFetcher {
    pub fn new(source: Rc<dyn StatsSource>, renderer: StatsRenderer) -> Self {
        Self {
            source,
            renderer,
            generation: Rc::new(Cell::new(0)),
        }
    }

    /// Number of fetches triggered so far.
    pub fn requests_issued(&self) -> u64 {
        self.generation.get()
    }

    /// Show the loading placeholder and start a request for `range`.
    /// Must run inside a `LocalSet`.
    pub fn fetch_stats(&self, range: Range) -> FetchTask {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.renderer.show_loading();
        debug!(range = range.id(), generation, "fetching usage stats");

        let request = self.source.fetch(range);
        let this = self.clone();
        tokio::task::spawn_local(async move {
            let outcome = request.await;
            if this.generation.get() != generation {
                debug!(
                    range = range.id(),
                    generation,
                    latest = this.generation.get(),
                    "discarding stale stats response"
                );
                return;
            }
            match outcome {
                Ok(response) => this.renderer.render_with_trend(&response.stats, &response.trend),
                Err(err) => {
                    warn!(
                        range = range.id(),
                        status = ?err.status(),
                        error = %err,
                        "failed to load usage stats"
                    );
                    this.renderer.show_error(&err.to_string());
                }
            }
        })
    }
}
