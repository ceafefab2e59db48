//! Minimal in-memory document used to run the hiding logic natively.
//!
//! It models exactly what the injected script touches: an element tree rooted
//! at `<body>`, attributes, inline style declarations, child-list mutation
//! records for the body subtree, and the page-global slots the script writes
//! to (`window.__noreel*`).

use std::collections::BTreeMap;

use url::Url;

use crate::{
    apply::ApplyReport, config::CustomizationConfig, normalize::origin_base,
    watcher::MutationWatcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
struct StyleDeclaration {
    value: String,
    important: bool,
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    style: BTreeMap<String, StyleDeclaration>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// One child-list change inside the observed subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

/// State the injected script keeps on `window` for the lifetime of one page load.
#[derive(Debug, Default)]
pub struct PageGlobals {
    pub(crate) config: Option<CustomizationConfig>,
    pub(crate) watcher: Option<MutationWatcher>,
}

#[derive(Debug)]
pub struct Page {
    url: Url,
    base: Url,
    nodes: Vec<Element>,
    body: NodeId,
    pending: Vec<MutationRecord>,
    writes: usize,
    globals: PageGlobals,
}

impl Page {
    pub fn new(url: Url) -> Self {
        let base = origin_base(&url);
        Self {
            url,
            base,
            nodes: vec![Element::new("body")],
            body: NodeId(0),
            pending: Vec::new(),
            writes: 0,
            globals: PageGlobals::default(),
        }
    }

    /// Starts a fresh page load: the tree, pending records and globals are discarded.
    pub fn navigate(&mut self, url: Url) {
        *self = Self::new(url);
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Origin the page resolves relative hrefs against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Number of attribute, style and tree writes performed so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub(crate) fn globals_mut(&mut self) -> &mut PageGlobals {
        &mut self.globals
    }

    pub fn customization(&self) -> Option<&CustomizationConfig> {
        self.globals.config.as_ref()
    }

    pub fn watcher(&self) -> Option<&MutationWatcher> {
        self.globals.watcher.as_ref()
    }

    // --- Tree ---

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Creates `<tag attrs...>` and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.create_element(tag);
        for (name, value) in attrs {
            self.set_attribute(id, name, value);
        }
        self.append_child(parent, id);
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.is_inclusive_ancestor(child, parent) {
            return;
        }
        self.remove(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.writes += 1;
        if self.is_observed(parent) {
            self.pending.push(MutationRecord {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
    }

    /// Detaches `node` from its parent. The node and its subtree stay usable.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.nodes[node.0].parent.take() else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.writes += 1;
        if self.is_observed(parent) {
            self.pending.push(MutationRecord {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            });
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.body, node)
    }

    /// Only the watcher observes the body subtree; without it nothing is recorded.
    fn is_observed(&self, node: NodeId) -> bool {
        self.globals.watcher.is_some() && self.is_connected(node)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// Nearest inclusive ancestor satisfying `predicate`, like `Element.closest`.
    pub fn closest(&self, node: NodeId, predicate: impl Fn(&Page, NodeId) -> bool) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if predicate(self, id) {
                return Some(id);
            }
            current = self.nodes[id.0].parent;
        }
        None
    }

    /// Connected elements in document order, body excluded.
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(self.body).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Equivalent of `document.querySelectorAll("a[href]")`.
    pub fn anchors(&self) -> Vec<NodeId> {
        self.descendants()
            .into_iter()
            .filter(|id| self.tag(*id) == "a" && self.has_attribute(*id, "href"))
            .collect()
    }

    // --- Attributes ---

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.nodes[node.0].attributes.contains_key(name)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.nodes[node.0]
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self.writes += 1;
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if self.nodes[node.0].attributes.remove(name).is_some() {
            self.writes += 1;
        }
    }

    // --- Inline style ---

    pub fn style_property(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes[node.0].style.get(name).map(|d| d.value.as_str())
    }

    pub fn style_priority(&self, node: NodeId, name: &str) -> bool {
        self.nodes[node.0]
            .style
            .get(name)
            .is_some_and(|d| d.important)
    }

    pub fn set_style_property(&mut self, node: NodeId, name: &str, value: &str, important: bool) {
        self.nodes[node.0].style.insert(
            name.to_string(),
            StyleDeclaration {
                value: value.to_string(),
                important,
            },
        );
        self.writes += 1;
    }

    pub fn remove_style_property(&mut self, node: NodeId, name: &str) {
        if self.nodes[node.0].style.remove(name).is_some() {
            self.writes += 1;
        }
    }

    /// False when the node or any ancestor has `display: none`.
    pub fn is_displayed(&self, node: NodeId) -> bool {
        self.closest(node, |page, id| page.style_property(id, "display") == Some("none"))
            .is_none()
    }

    // --- Mutation delivery ---

    pub fn pending_mutations(&self) -> &[MutationRecord] {
        &self.pending
    }

    /// Hands the pending batch to the installed watcher, as the page's event
    /// loop does between tasks. Without a watcher the batch is dropped.
    pub fn flush_mutations(&mut self) -> Option<ApplyReport> {
        if self.pending.is_empty() {
            return None;
        }
        let records = std::mem::take(&mut self.pending);
        let mut watcher = self.globals.watcher.take()?;
        let report = watcher.deliver(self, &records);
        self.globals.watcher = Some(watcher);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::MutationWatcher;

    fn page() -> Page {
        Page::new(Url::parse("https://www.instagram.com/").expect("static url"))
    }

    #[test]
    fn records_only_connected_child_list_changes() {
        let mut page = page();
        let body = page.body();
        page.append_element(body, "header", &[]);
        assert!(page.pending_mutations().is_empty());

        MutationWatcher::install(&mut page);

        let detached = page.create_element("div");
        let link = page.append_element(detached, "a", &[("href", "/reels/")]);
        assert!(page.pending_mutations().is_empty());
        assert!(!page.is_connected(link));

        page.append_child(body, detached);
        assert!(page.is_connected(link));
        assert_eq!(
            page.pending_mutations(),
            &[MutationRecord {
                target: body,
                added: vec![detached],
                removed: vec![],
            }]
        );

        page.set_attribute(link, "class", "x");
        page.set_style_property(link, "color", "red", false);
        assert_eq!(page.pending_mutations().len(), 1);
    }

    #[test]
    fn anchors_in_document_order() {
        let mut page = page();
        let body = page.body();
        let nav = page.append_element(body, "nav", &[]);
        let first = page.append_element(nav, "a", &[("href", "/")]);
        page.append_element(nav, "a", &[]);
        let second = page.append_element(body, "A", &[("HREF", "/shop/")]);
        assert_eq!(page.anchors(), vec![first, second]);
    }

    #[test]
    fn display_none_hides_subtree() {
        let mut page = page();
        let body = page.body();
        let li = page.append_element(body, "li", &[]);
        let a = page.append_element(li, "a", &[("href", "/reels/")]);
        assert!(page.is_displayed(a));

        page.set_style_property(li, "display", "none", true);
        assert!(!page.is_displayed(a));
        assert!(page.style_priority(li, "display"));

        page.remove_style_property(li, "display");
        assert!(page.is_displayed(a));
    }

    #[test]
    fn cannot_append_ancestor_into_descendant() {
        let mut page = page();
        let body = page.body();
        let outer = page.append_element(body, "div", &[]);
        let inner = page.append_element(outer, "div", &[]);
        page.append_child(inner, outer);
        assert_eq!(page.parent(outer), Some(body));
    }

    #[test]
    fn navigate_resets_everything() {
        let mut page = page();
        let body = page.body();
        page.append_element(body, "a", &[("href", "/reels/")]);
        page.navigate(Url::parse("https://www.instagram.com/explore/").expect("static url"));
        assert!(page.anchors().is_empty());
        assert!(page.pending_mutations().is_empty());
        assert!(page.customization().is_none());
        assert!(page.watcher().is_none());
    }
}
