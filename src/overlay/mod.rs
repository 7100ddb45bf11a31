pub mod drawer;
pub mod fetcher;
pub mod range_selector;
pub mod renderer;
pub mod style_guard;
pub mod toggle;

#[cfg(test)]
pub(crate) mod testing;

use std::rc::Rc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::core::client::StatsSource;
use crate::core::config::OverlayConfig;
use crate::core::dom::{NodeId, SharedDocument};
use crate::core::models::range::Range;

use drawer::{content_slot, DrawerMount, ACTION_ATTR, RANGE_ATTR};
use fetcher::{FetchTask, StatsFetcher};
use range_selector::RangeSelector;
use renderer::StatsRenderer;
use style_guard::StyleGuard;
use toggle::ToggleController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawerState {
    pub mounted: bool,
    pub open: bool,
}

/// A control the user can click inside the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle,
    Close,
    Refresh,
    Select(Range),
}

impl Action {
    fn from_attr(value: &str) -> Option<Self> {
        match value {
            "toggle" => Some(Self::Toggle),
            "close" => Some(Self::Close),
            "refresh" => Some(Self::Refresh),
            _ => None,
        }
    }
}

/// One overlay session on one page. Everything runs on the current thread;
/// [`Overlay::install`] and every trigger must be called inside a `LocalSet`.
pub struct Overlay {
    doc: SharedDocument,
    config: Rc<OverlayConfig>,
    style: StyleGuard,
    drawer: DrawerMount,
    fetcher: StatsFetcher,
    selector: RangeSelector,
    toggle: ToggleController,
    background: Vec<JoinHandle<()>>,
}

impl Overlay {
    pub fn new(doc: SharedDocument, config: OverlayConfig, source: Rc<dyn StatsSource>) -> Self {
        let ids = &config.ids;
        let style = StyleGuard::new(doc.clone(), &ids.style, &config.style_payload);
        let drawer = DrawerMount::new(doc.clone(), ids.clone());
        let renderer = StatsRenderer::new(doc.clone(), &ids.panel, &config.avatar_base);
        let fetcher = StatsFetcher::new(source, renderer);
        let selector = RangeSelector::new(doc.clone(), &ids.panel, fetcher.clone());
        let toggle = ToggleController::new(doc.clone(), &ids.panel, selector.clone(), fetcher.clone());
        Self {
            doc,
            config: Rc::new(config),
            style,
            drawer,
            fetcher,
            selector,
            toggle,
            background: Vec::new(),
        }
    }

    /// Assert the stylesheet, start its watcher and timed checks, and mount
    /// the drawer. Safe to call repeatedly; background tasks start once.
    pub fn install(&mut self) -> bool {
        self.style.ensure_injected();
        if self.background.is_empty() {
            self.background.push(self.style.spawn_watcher());
            self.background
                .push(self.style.spawn_reassertions(&self.config.reassert_delays_ms));
        }
        let built = self.drawer.mount();
        debug!(built, "overlay installed");
        built
    }

    pub fn document(&self) -> &SharedDocument {
        &self.doc
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn state(&self) -> DrawerState {
        DrawerState {
            mounted: self.drawer.is_mounted(),
            open: self.toggle.is_open(),
        }
    }

    pub fn active_range(&self) -> Range {
        self.selector.active()
    }

    pub fn requests_issued(&self) -> u64 {
        self.fetcher.requests_issued()
    }

    pub fn content_slot(&self) -> Option<NodeId> {
        content_slot(&self.doc.borrow(), &self.config.ids.panel)
    }

    pub fn toggle(&self) -> Option<FetchTask> {
        self.toggle.toggle()
    }

    pub fn open(&self) -> Option<FetchTask> {
        self.toggle.open()
    }

    pub fn close(&self) -> bool {
        self.toggle.close()
    }

    pub fn select(&self, range: Range) -> FetchTask {
        self.selector.select(range)
    }

    /// Re-fetch the active range. The only recovery path after a failure
    /// besides reopening the panel.
    pub fn refresh(&self) -> FetchTask {
        self.fetcher.fetch_stats(self.selector.active())
    }

    /// Resolve the overlay control under `node`, bubbling up to ancestors.
    pub fn action_at(&self, node: NodeId) -> Option<Action> {
        let doc = self.doc.borrow();
        let mut cur = Some(node);
        while let Some(n) = cur {
            if let Some(range) = doc.attr(n, RANGE_ATTR).and_then(Range::from_id) {
                return Some(Action::Select(range));
            }
            if let Some(action) = doc.attr(n, ACTION_ATTR).and_then(Action::from_attr) {
                return Some(action);
            }
            cur = doc.parent(n);
        }
        None
    }

    /// Dispatch a click on `node`. Returns the fetch it started, if any.
    pub fn click(&self, node: NodeId) -> Option<FetchTask> {
        match self.action_at(node)? {
            Action::Toggle => self.toggle(),
            Action::Close => {
                self.close();
                None
            }
            Action::Refresh => Some(self.refresh()),
            Action::Select(range) => Some(self.select(range)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::FetchError;
    use crate::core::dom::Document;
    use crate::core::models::stats::{StatsPayload, UsageStats};
    use crate::overlay::renderer::{CARD_CLASS, ERROR_CLASS};
    use crate::overlay::testing::ScriptedSource;
    use std::time::Duration;
    use tokio::task::LocalSet;

    fn host_page() -> (SharedDocument, NodeId) {
        let mut doc = Document::new();
        let root = doc.create_element("div");
        doc.set_id(root, "root");
        let chat = doc.create_with("div", &["chat"], "chat history");
        doc.append_child(root, chat);
        let body = doc.body();
        doc.append_child(body, root);
        (doc.into_shared(), root)
    }

    fn new_overlay(doc: &SharedDocument) -> (Overlay, Rc<ScriptedSource>) {
        let source = Rc::new(ScriptedSource::new());
        let config = OverlayConfig {
            reassert_delays_ms: vec![5, 15],
            ..OverlayConfig::default()
        };
        (Overlay::new(doc.clone(), config, source.clone()), source)
    }

    fn by_id(doc: &SharedDocument, id: &str) -> NodeId {
        doc.borrow().get_element_by_id(id).unwrap()
    }

    fn singleton_counts(doc: &SharedDocument) -> Vec<usize> {
        let ids = OverlayConfig::default().ids;
        let doc = doc.borrow();
        let counts: Vec<usize> = ids.reserved().iter().map(|id| doc.count_by_id(id)).collect();
        counts
    }

    #[tokio::test]
    async fn install_in_any_interleaving_yields_one_of_each() {
        LocalSet::new()
            .run_until(async {
                let (doc, root) = host_page();
                let (mut overlay, _) = new_overlay(&doc);
                let (mut second, _) = new_overlay(&doc);

                assert!(overlay.install());
                assert!(!second.install());
                assert!(second.state().mounted);
                overlay.style.ensure_injected();
                assert!(!overlay.install());
                second.style.ensure_injected();
                tokio::time::sleep(Duration::from_millis(30)).await;

                assert_eq!(singleton_counts(&doc), vec![1; 5]);
                assert_eq!(overlay.state(), DrawerState { mounted: true, open: false });
                let wrapper = by_id(&doc, "catstats-main");
                assert_eq!(doc.borrow().parent(root), Some(wrapper));
            })
            .await;
    }

    #[tokio::test]
    async fn host_churn_cannot_strip_the_stylesheet() {
        LocalSet::new()
            .run_until(async {
                let (doc, root) = host_page();
                let (mut overlay, _) = new_overlay(&doc);
                overlay.install();

                // Host re-render: wipe <head> and replace the app's children.
                {
                    let mut d = doc.borrow_mut();
                    let head = d.head();
                    d.replace_children(head, &[]);
                    let fresh = d.create_with("div", &["chat"], "rerendered");
                    d.replace_children(root, &[fresh]);
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
                assert_eq!(singleton_counts(&doc), vec![1; 5]);
            })
            .await;
    }

    #[tokio::test]
    async fn clicks_drive_the_state_machine() {
        LocalSet::new()
            .run_until(async {
                let (doc, _) = host_page();
                let (mut overlay, source) = new_overlay(&doc);
                overlay.install();

                let toggle = by_id(&doc, "catstats-toggle");
                overlay.click(toggle).unwrap().await.unwrap();
                assert!(overlay.state().open);
                assert_eq!(source.calls(), vec![Range::Week]);

                let month = {
                    let d = doc.borrow();
                    let panel = d.get_element_by_id("catstats-panel").unwrap();
                    d.find_by_attr(panel, RANGE_ATTR, "month")[0]
                };
                overlay.click(month).unwrap().await.unwrap();
                assert_eq!(overlay.active_range(), Range::Month);

                let refresh = {
                    let d = doc.borrow();
                    let panel = d.get_element_by_id("catstats-panel").unwrap();
                    d.find_by_attr(panel, ACTION_ATTR, "refresh")[0]
                };
                overlay.click(refresh).unwrap().await.unwrap();

                let close = {
                    let d = doc.borrow();
                    let panel = d.get_element_by_id("catstats-panel").unwrap();
                    d.find_by_attr(panel, ACTION_ATTR, "close")[0]
                };
                assert!(overlay.click(close).is_none());
                assert!(!overlay.state().open);

                assert_eq!(
                    source.calls(),
                    vec![Range::Week, Range::Month, Range::Month]
                );
                assert_eq!(overlay.requests_issued(), 3);
            })
            .await;
    }

    #[tokio::test]
    async fn clicks_on_host_content_are_ignored() {
        LocalSet::new()
            .run_until(async {
                let (doc, root) = host_page();
                let (mut overlay, source) = new_overlay(&doc);
                overlay.install();

                let chat = doc.borrow().children(root)[0];
                doc.borrow_mut().set_attr(chat, "data-action", "toggle");
                assert!(overlay.action_at(chat).is_none());
                assert!(overlay.click(chat).is_none());
                assert!(source.calls().is_empty());
            })
            .await;
    }

    #[tokio::test]
    async fn refresh_recovers_after_an_error() {
        LocalSet::new()
            .run_until(async {
                let (doc, _) = host_page();
                let (mut overlay, source) = new_overlay(&doc);
                source.reply(Err(FetchError::Status(500)));
                let mut stats = StatsPayload::new();
                stats.insert(
                    "arch".to_string(),
                    UsageStats {
                        call_count: 5,
                        cost_usd: 1.23456,
                        input_tokens: 1000,
                        ..Default::default()
                    },
                );
                source.reply(Ok(stats));
                overlay.install();

                overlay.open().unwrap().await.unwrap();
                let slot = overlay.content_slot().unwrap();
                assert!(doc.borrow().text_content(slot).contains("500"));
                assert!(doc.borrow().find_by_class(slot, CARD_CLASS).is_empty());

                overlay.refresh().await.unwrap();
                let d = doc.borrow();
                assert!(d.find_by_class(slot, ERROR_CLASS).is_empty());
                let text = d.text_content(slot);
                assert!(text.contains("$1.2346"));
                assert!(text.contains("1,000"));
            })
            .await;
    }
}
