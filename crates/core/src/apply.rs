use tracing::trace;

use crate::{
    config::CustomizationConfig,
    dom::{NodeId, Page},
    normalize::normalize_path,
    rules::registry,
};

/// Attribute recording that this mechanism, not the site, hid an element.
pub const HIDDEN_MARKER: &str = "data-noreel-hidden";

/// Roles that make an element the thing to hide for a matching link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveRole {
    Link,
    Button,
    ClickableContainer,
    ListItem,
    Span,
}

impl InteractiveRole {
    pub const ORDER: [InteractiveRole; 5] = [
        InteractiveRole::Link,
        InteractiveRole::Button,
        InteractiveRole::ClickableContainer,
        InteractiveRole::ListItem,
        InteractiveRole::Span,
    ];

    /// CSS selectors for the role, as used by the injected script.
    pub fn selectors(self) -> &'static [&'static str] {
        match self {
            InteractiveRole::Link => &["a"],
            InteractiveRole::Button => &["button"],
            InteractiveRole::ClickableContainer => &[r#"div[role="link"]"#, r#"div[role="button"]"#],
            InteractiveRole::ListItem => &["li"],
            InteractiveRole::Span => &["span"],
        }
    }

    pub fn matches(self, page: &Page, node: NodeId) -> bool {
        let tag = page.tag(node);
        match self {
            InteractiveRole::Link => tag == "a",
            InteractiveRole::Button => tag == "button",
            InteractiveRole::ClickableContainer => {
                tag == "div" && matches!(page.attribute(node, "role"), Some("link" | "button"))
            }
            InteractiveRole::ListItem => tag == "li",
            InteractiveRole::Span => tag == "span",
        }
    }

    /// First role in priority order that `node` satisfies.
    pub fn of(page: &Page, node: NodeId) -> Option<Self> {
        Self::ORDER.into_iter().find(|role| role.matches(page, node))
    }

    /// The whole list joined into one selector for `Element.closest`.
    pub fn selector_list() -> String {
        Self::ORDER
            .iter()
            .flat_map(|role| role.selectors().iter().copied())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Element to hide for `anchor`: the nearest interactive inclusive ancestor.
pub fn hide_target(page: &Page, anchor: NodeId) -> NodeId {
    page.closest(anchor, |page, id| InteractiveRole::of(page, id).is_some())
        .unwrap_or(anchor)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub anchors: usize,
    pub hidden: usize,
    pub revealed: usize,
}

impl ApplyReport {
    pub fn changed(&self) -> bool {
        self.hidden > 0 || self.revealed > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Hidden,
    Revealed,
    Unchanged,
}

/// Runs every rule of `config` against the anchors currently in `page`.
pub fn apply(page: &mut Page, config: &CustomizationConfig) -> ApplyReport {
    let base = page.base().clone();
    let anchors: Vec<(NodeId, String)> = page
        .anchors()
        .into_iter()
        .map(|id| (id, normalize_path(page.attribute(id, "href"), &base)))
        .filter(|(_, href)| !href.is_empty())
        .collect();

    let mut report = ApplyReport {
        anchors: anchors.len(),
        ..Default::default()
    };

    for rule in registry(config) {
        let target = normalize_path(Some(rule.path), &base);
        for (anchor, href) in &anchors {
            if *href != target {
                continue;
            }
            match mark(page, *anchor, rule.enabled) {
                Mark::Hidden => report.hidden += 1,
                Mark::Revealed => report.revealed += 1,
                Mark::Unchanged => {}
            }
        }
    }

    if report.changed() {
        trace!(
            "Applied customization: {} anchors, {} hidden, {} revealed",
            report.anchors, report.hidden, report.revealed
        );
    }
    report
}

fn mark(page: &mut Page, anchor: NodeId, hide: bool) -> Mark {
    let target = hide_target(page, anchor);
    let marked = page.has_attribute(target, HIDDEN_MARKER);
    match (hide, marked) {
        (true, false) => {
            page.set_attribute(target, HIDDEN_MARKER, "1");
            page.set_style_property(target, "display", "none", true);
            Mark::Hidden
        }
        (false, true) => {
            page.remove_style_property(target, "display");
            page.remove_attribute(target, HIDDEN_MARKER);
            Mark::Revealed
        }
        _ => Mark::Unchanged,
    }
}
