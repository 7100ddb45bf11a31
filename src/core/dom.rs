//! In-memory model of the host page's element tree.
//!
//! The overlay never owns the document: the host may append, remove or move
//! nodes at any time. Structural changes (children added or removed) are
//! broadcast to every subscriber, the same way a mutation observer reports
//! `childList` records on the document root.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use tokio::sync::mpsc;

/// Index of a node in the document arena. Detached nodes keep their id.
pub type NodeId = usize;

/// The document as shared between the overlay components and the host.
pub type SharedDocument = Rc<RefCell<Document>>;

/// One structural change under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    observers: Vec<mpsc::UnboundedSender<Mutation>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html>` with `<head>` and `<body>`.
    pub fn new() -> Self {
        let mut nodes = vec![Node::new("html"), Node::new("head"), Node::new("body")];
        nodes[0].children = vec![1, 2];
        nodes[1].parent = Some(0);
        nodes[2].parent = Some(0);
        Self {
            nodes,
            root: 0,
            observers: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedDocument {
        Rc::new(RefCell::new(self))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `<head>` currently attached under the root. Hosts may swap it out,
    /// so this is resolved on every call; falls back to the root.
    pub fn head(&self) -> NodeId {
        self.root_child("head")
    }

    /// The `<body>` currently attached under the root; falls back to the root.
    pub fn body(&self) -> NodeId {
        self.root_child("body")
    }

    fn root_child(&self, tag: &str) -> NodeId {
        self.nodes[self.root]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].tag == tag)
            .unwrap_or(self.root)
    }

    /// Subscribe to structural changes anywhere in the document.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<Mutation> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Node::new(tag));
        self.nodes.len() - 1
    }

    /// Create a detached element with classes and text in one call.
    pub fn create_with(&mut self, tag: &str, classes: &[&str], text: &str) -> NodeId {
        let node = self.create_element(tag);
        for class in classes {
            self.add_class(node, class);
        }
        if !text.is_empty() {
            self.set_text(node, text);
        }
        node
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node].tag
    }

    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.nodes[node].id.as_deref()
    }

    pub fn set_id(&mut self, node: NodeId, id: &str) {
        self.nodes[node].id = Some(id.to_string());
    }

    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node].classes
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node].classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node].classes.push(class.to_string());
        }
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node].classes.retain(|c| c != class);
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        let attrs = &mut self.nodes[node].attrs;
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Own text of a node (not including descendants).
    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node].text
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.nodes[node].text = text.to_string();
    }

    /// Text of the node and all descendants, in document order, space separated.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut parts = Vec::new();
        if !self.nodes[node].text.is_empty() {
            parts.push(self.nodes[node].text.as_str());
        }
        for d in self.descendants(node) {
            if !self.nodes[d].text.is_empty() {
                parts.push(self.nodes[d].text.as_str());
            }
        }
        parts.join(" ")
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    /// True if `node` is `ancestor` or lies beneath it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if n == ancestor {
                return true;
            }
            cur = self.nodes[n].parent;
        }
        false
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Append `child` as the last child of `parent`, moving it if already attached
    /// elsewhere. The moved node keeps its id, attributes and subtree.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let index = self.nodes[parent].children.len();
        self.insert_child(parent, index, child);
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count).
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if self.contains(child, parent) {
            tracing::warn!(parent, child, "refusing to insert a node into its own subtree");
            return;
        }
        let mut index = index;
        if let Some(old) = self.nodes[child].parent {
            let pos = self.nodes[old].children.iter().position(|&c| c == child);
            if let Some(pos) = pos {
                self.nodes[old].children.remove(pos);
                if old == parent && pos < index {
                    index -= 1;
                }
            }
            if old != parent {
                self.notify(old, Vec::new(), vec![child]);
            }
        }
        let index = index.min(self.nodes[parent].children.len());
        self.nodes[parent].children.insert(index, child);
        self.nodes[child].parent = Some(parent);
        self.notify(parent, vec![child], Vec::new());
    }

    /// Detach `node` from its parent. The node can be re-attached later.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node].parent.take() else {
            return;
        };
        self.nodes[parent].children.retain(|&c| c != node);
        self.notify(parent, Vec::new(), vec![node]);
    }

    /// Replace all children of `parent` with `children`, reported as one change.
    pub fn replace_children(&mut self, parent: NodeId, children: &[NodeId]) {
        let removed = std::mem::take(&mut self.nodes[parent].children);
        for &old in &removed {
            self.nodes[old].parent = None;
        }
        for &child in children {
            if self.contains(child, parent) {
                continue;
            }
            if let Some(old) = self.nodes[child].parent {
                self.nodes[old].children.retain(|&c| c != child);
                if old != parent {
                    self.notify(old, Vec::new(), vec![child]);
                }
            }
            self.nodes[child].parent = Some(parent);
            self.nodes[parent].children.push(child);
        }
        self.notify(parent, children.to_vec(), removed);
    }

    /// Attached descendants of `scope` in document order, excluding `scope`.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev());
        }
        out
    }

    /// First attached element carrying `id`, searching from the document root.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.nodes[n].id.as_deref() == Some(id))
    }

    /// Number of attached elements carrying `id`.
    pub fn count_by_id(&self, id: &str) -> usize {
        self.descendants(self.root)
            .into_iter()
            .filter(|&n| self.nodes[n].id.as_deref() == Some(id))
            .count()
    }

    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.has_class(n, class))
            .collect()
    }

    pub fn find_by_attr(&self, scope: NodeId, name: &str, value: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|&n| self.attr(n, name) == Some(value))
            .collect()
    }

    /// Serialize `node` and its subtree as indented HTML.
    pub fn to_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, 0, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, depth: usize, out: &mut String) {
        let n = &self.nodes[node];
        let indent = "  ".repeat(depth);
        let _ = write!(out, "{}<{}", indent, n.tag);
        if let Some(id) = &n.id {
            let _ = write!(out, " id=\"{}\"", escape(id));
        }
        if !n.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&n.classes.join(" ")));
        }
        for (k, v) in &n.attrs {
            let _ = write!(out, " {}=\"{}\"", k, escape(v));
        }
        out.push('>');
        if n.children.is_empty() {
            out.push_str(&escape(&n.text));
        } else {
            out.push('\n');
            if !n.text.is_empty() {
                let _ = writeln!(out, "{}  {}", indent, escape(&n.text));
            }
            for &child in &n.children {
                self.write_html(child, depth + 1, out);
            }
            out.push_str(&indent);
        }
        let _ = writeln!(out, "</{}>", n.tag);
    }

    fn notify(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        if self.observers.is_empty() {
            return;
        }
        let record = Mutation {
            target,
            added,
            removed,
        };
        self.observers.retain(|tx| tx.send(record.clone()).is_ok());
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
