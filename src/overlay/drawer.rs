use tracing::{debug, warn};

use crate::core::config::ElementIds;
use crate::core::dom::{Document, NodeId, SharedDocument};
use crate::core::models::range::Range;

pub const OPEN_CLASS: &str = "catstats-open";
pub const ACTIVE_CLASS: &str = "active";
pub const CONTENT_CLASS: &str = "catstats-content";
pub const RANGE_CLASS: &str = "catstats-range";

/// Control attributes are namespaced so host markup can never trigger them.
pub const ACTION_ATTR: &str = "data-catstats-action";
pub const RANGE_ATTR: &str = "data-catstats-range";

pub const PANEL_TITLE: &str = "Cat usage";

/// Restructures the host tree once: layout root, wrapper around the host
/// root, the panel, and the floating toggle button.
#[derive(Clone)]
pub struct DrawerMount {
    doc: SharedDocument,
    ids: ElementIds,
}

impl DrawerMount {
    pub fn new(doc: SharedDocument, ids: ElementIds) -> Self {
        Self { doc, ids }
    }

    /// True while the panel is attached, whoever mounted it.
    pub fn is_mounted(&self) -> bool {
        self.doc.borrow().get_element_by_id(&self.ids.panel).is_some()
    }

    /// Build the overlay if the panel is not already in the tree.
    /// Returns true when this call built the panel.
    ///
    /// Each singleton is looked up by id before it is created, so a partial
    /// tree left behind by the host is completed rather than duplicated.
    pub fn mount(&self) -> bool {
        let mut doc = self.doc.borrow_mut();
        if doc.get_element_by_id(&self.ids.panel).is_some() {
            debug!(panel = %self.ids.panel, "overlay already mounted");
            return false;
        }

        let body = doc.body();
        let host_root = doc.get_element_by_id(&self.ids.host_root);

        let layout = match doc.get_element_by_id(&self.ids.layout) {
            Some(layout) => layout,
            None => {
                let layout = doc.create_element("div");
                doc.set_id(layout, &self.ids.layout);
                match host_root.and_then(|r| doc.parent(r).map(|p| (r, p))) {
                    Some((root, parent)) => {
                        let index = doc
                            .children(parent)
                            .iter()
                            .position(|&c| c == root)
                            .unwrap_or(0);
                        doc.insert_child(parent, index, layout);
                    }
                    None => doc.append_child(body, layout),
                }
                layout
            }
        };

        match host_root {
            Some(root) => {
                let wrapper = match doc.get_element_by_id(&self.ids.wrapper) {
                    Some(wrapper) => wrapper,
                    None => {
                        let wrapper = doc.create_element("div");
                        doc.set_id(wrapper, &self.ids.wrapper);
                        doc.insert_child(layout, 0, wrapper);
                        wrapper
                    }
                };
                if doc.parent(root) != Some(wrapper) {
                    // Re-parent, never rebuild: the host keeps its own node.
                    doc.append_child(wrapper, root);
                }
            }
            None => {
                warn!(
                    host_root = %self.ids.host_root,
                    "host root not found; mounting overlay without wrapping host content"
                );
            }
        }

        let panel = build_panel(&mut doc, &self.ids.panel);
        doc.append_child(layout, panel);

        if doc.get_element_by_id(&self.ids.toggle).is_none() {
            let toggle = doc.create_with("button", &["catstats-toggle"], "📊");
            doc.set_id(toggle, &self.ids.toggle);
            doc.set_attr(toggle, ACTION_ATTR, "toggle");
            doc.set_attr(toggle, "title", PANEL_TITLE);
            doc.append_child(body, toggle);
        }

        debug!(panel = %self.ids.panel, "overlay mounted");
        true
    }
}

fn build_panel(doc: &mut Document, panel_id: &str) -> NodeId {
    let panel = doc.create_with("div", &["catstats-panel"], "");
    doc.set_id(panel, panel_id);

    let header = doc.create_with("div", &["catstats-header"], "");
    let title = doc.create_with("span", &["catstats-title"], PANEL_TITLE);
    let refresh = doc.create_with("button", &["catstats-refresh"], "↻");
    doc.set_attr(refresh, ACTION_ATTR, "refresh");
    doc.set_attr(refresh, "title", "Refresh");
    let close = doc.create_with("button", &["catstats-close"], "×");
    doc.set_attr(close, ACTION_ATTR, "close");
    doc.set_attr(close, "title", "Close");
    for child in [title, refresh, close] {
        doc.append_child(header, child);
    }

    let ranges = doc.create_with("div", &["catstats-ranges"], "");
    for range in Range::all() {
        let button = doc.create_with("button", &[RANGE_CLASS], range.label());
        doc.set_attr(button, RANGE_ATTR, range.id());
        if *range == Range::default() {
            doc.add_class(button, ACTIVE_CLASS);
        }
        doc.append_child(ranges, button);
    }

    let content = doc.create_with("div", &[CONTENT_CLASS], "");

    for child in [header, ranges, content] {
        doc.append_child(panel, child);
    }
    panel
}

/// The panel's content slot, if the panel is in the tree.
pub fn content_slot(doc: &Document, panel_id: &str) -> Option<NodeId> {
    let panel = doc.get_element_by_id(panel_id)?;
    doc.find_by_class(panel, CONTENT_CLASS).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_page() -> (SharedDocument, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let banner = doc.create_with("header", &["host-banner"], "Chat");
        doc.append_child(body, banner);
        let root = doc.create_element("div");
        doc.set_id(root, "root");
        doc.set_attr(root, "data-reactroot", "");
        let messages = doc.create_with("div", &["messages"], "hello");
        doc.append_child(root, messages);
        doc.append_child(body, root);
        (doc.into_shared(), root, messages)
    }

    fn assert_singletons(doc: &Document, ids: &ElementIds) {
        for id in [&ids.layout, &ids.wrapper, &ids.panel, &ids.toggle] {
            assert_eq!(doc.count_by_id(id), 1, "expected one #{}", id);
        }
    }

    #[test]
    fn mount_wraps_host_root_in_place() {
        let (doc, root, messages) = host_page();
        let ids = ElementIds::default();
        let drawer = DrawerMount::new(doc.clone(), ids.clone());

        assert!(drawer.mount());
        assert!(drawer.is_mounted());

        let doc = doc.borrow();
        assert_singletons(&doc, &ids);
        let layout = doc.get_element_by_id(&ids.layout).unwrap();
        let wrapper = doc.get_element_by_id(&ids.wrapper).unwrap();
        let panel = doc.get_element_by_id(&ids.panel).unwrap();
        let toggle = doc.get_element_by_id(&ids.toggle).unwrap();

        // Layout took the host root's slot, after the banner.
        let body = doc.body();
        assert_eq!(doc.children(body)[1], layout);
        assert_eq!(doc.children(layout), &[wrapper, panel]);
        assert_eq!(doc.parent(toggle), Some(body));

        // Same node, same subtree, same attributes.
        assert_eq!(doc.parent(root), Some(wrapper));
        assert_eq!(doc.children(root), &[messages]);
        assert_eq!(doc.attr(root, "data-reactroot"), Some(""));
    }

    #[test]
    fn panel_has_controls_ranges_and_content_slot() {
        let (doc, _, _) = host_page();
        let ids = ElementIds::default();
        DrawerMount::new(doc.clone(), ids.clone()).mount();

        let doc = doc.borrow();
        let panel = doc.get_element_by_id(&ids.panel).unwrap();
        assert_eq!(doc.find_by_attr(panel, ACTION_ATTR, "refresh").len(), 1);
        assert_eq!(doc.find_by_attr(panel, ACTION_ATTR, "close").len(), 1);

        let options = doc.find_by_class(panel, RANGE_CLASS);
        assert_eq!(options.len(), 3);
        let active: Vec<_> = options
            .iter()
            .filter(|&&o| doc.has_class(o, ACTIVE_CLASS))
            .map(|&o| doc.attr(o, RANGE_ATTR).unwrap())
            .collect();
        assert_eq!(active, vec!["week"]);

        assert!(content_slot(&doc, &ids.panel).is_some());
    }

    #[test]
    fn mount_is_idempotent() {
        let (doc, root, _) = host_page();
        let ids = ElementIds::default();
        let drawer = DrawerMount::new(doc.clone(), ids.clone());
        assert!(drawer.mount());
        for _ in 0..5 {
            assert!(!drawer.mount());
        }
        // A second mounter over the same page sees the marker too.
        let second = DrawerMount::new(doc.clone(), ids.clone());
        assert!(second.is_mounted());
        assert!(!second.mount());

        let doc = doc.borrow();
        assert_singletons(&doc, &ids);
        let wrapper = doc.get_element_by_id(&ids.wrapper).unwrap();
        assert_eq!(doc.parent(root), Some(wrapper));
    }

    #[test]
    fn remount_after_host_drops_panel_reuses_existing_nodes() {
        let (doc, _, _) = host_page();
        let ids = ElementIds::default();
        let drawer = DrawerMount::new(doc.clone(), ids.clone());
        drawer.mount();

        let panel = doc.borrow().get_element_by_id(&ids.panel).unwrap();
        doc.borrow_mut().remove(panel);
        assert!(!drawer.is_mounted());
        assert!(drawer.mount());
        assert!(drawer.is_mounted());

        assert_singletons(&doc.borrow(), &ids);
    }

    #[test]
    fn missing_host_root_degrades() {
        let doc = Document::new().into_shared();
        let ids = ElementIds::default();
        let drawer = DrawerMount::new(doc.clone(), ids.clone());

        assert!(drawer.mount());

        let doc = doc.borrow();
        assert_eq!(doc.count_by_id(&ids.panel), 1);
        assert_eq!(doc.count_by_id(&ids.toggle), 1);
        assert_eq!(doc.count_by_id(&ids.wrapper), 0);
        let layout = doc.get_element_by_id(&ids.layout).unwrap();
        assert_eq!(doc.parent(layout), Some(doc.body()));
    }

    #[test]
    fn mount_uses_the_live_body_after_host_swaps_it() {
        let doc = Document::new().into_shared();
        let ids = ElementIds::default();
        let fresh_body = {
            let mut d = doc.borrow_mut();
            let stale = d.body();
            d.remove(stale);
            let fresh = d.create_element("body");
            let root = d.root();
            d.append_child(root, fresh);
            fresh
        };

        assert!(DrawerMount::new(doc.clone(), ids.clone()).mount());

        let doc = doc.borrow();
        let layout = doc.get_element_by_id(&ids.layout).unwrap();
        let toggle = doc.get_element_by_id(&ids.toggle).unwrap();
        assert_eq!(doc.parent(layout), Some(fresh_body));
        assert_eq!(doc.parent(toggle), Some(fresh_body));
    }

    #[test]
    fn content_slot_absent_before_mount() {
        let (doc, _, _) = host_page();
        assert!(content_slot(&doc.borrow(), "catstats-panel").is_none());
    }
}
