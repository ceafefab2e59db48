use serde_json::json;

use crate::{
    apply::{ApplyReport, HIDDEN_MARKER, InteractiveRole, apply},
    config::CustomizationConfig,
    dom::Page,
    injector::ScriptHost,
    rules::Section,
    watcher::MutationWatcher,
};

const TEMPLATE: &str = r#"(function() {
    if (!window || !document || !document.body) { return; }
    window.__noreelConfig = __CONFIG__;
    const rules = __RULES__;
    const containers = __CONTAINERS__;
    const marker = __MARKER__;
    const normalizePath = (value) => {
        if (!value) { return ""; }
        try {
            let path = new URL(value, window.location.origin).pathname;
            if (!path.startsWith("/")) { path = "/" + path; }
            if (!path.endsWith("/")) { path += "/"; }
            return path.toLowerCase();
        } catch (e) {
            if (value.startsWith("/")) {
                return (value.endsWith("/") ? value : value + "/").toLowerCase();
            }
            return ("/" + value + "/").toLowerCase();
        }
    };
    const mark = (anchor, hide) => {
        const target = anchor.closest(containers) || anchor;
        if (hide) {
            if (!target.hasAttribute(marker)) {
                target.setAttribute(marker, "1");
                target.style.setProperty("display", "none", "important");
            }
        } else if (target.hasAttribute(marker)) {
            target.style.removeProperty("display");
            target.removeAttribute(marker);
        }
    };
    window.__noreelApply = () => {
        const config = window.__noreelConfig || {};
        const anchors = Array.from(document.querySelectorAll("a[href]"))
            .map((anchor) => [anchor, normalizePath(anchor.getAttribute("href"))])
            .filter((entry) => entry[1] !== "");
        rules.forEach((rule) => {
            const path = normalizePath(rule.path);
            anchors.forEach(([anchor, href]) => {
                if (href === path) { mark(anchor, !!config[rule.key]); }
            });
        });
    };
    if (!window.__noreelObserver) {
        window.__noreelObserver = new MutationObserver(() => window.__noreelApply());
        window.__noreelObserver.observe(document.body, { childList: true, subtree: true });
    }
    window.__noreelApply();
})();"#;

/// A ready-to-run customization pass for one config.
///
/// `source` is the JavaScript handed to a real web view. `run` performs the
/// same steps against a [`Page`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationScript {
    config: CustomizationConfig,
    source: String,
}

impl CustomizationScript {
    pub fn new(config: CustomizationConfig) -> Self {
        let rules: Vec<_> = Section::ALL
            .iter()
            .map(|section| json!({ "key": section.config_key(), "path": section.path() }))
            .collect();

        let source = TEMPLATE
            .replace("__CONFIG__", &config.to_json())
            .replace("__RULES__", &json!(rules).to_string())
            .replace("__CONTAINERS__", &json!(InteractiveRole::selector_list()).to_string())
            .replace("__MARKER__", &json!(HIDDEN_MARKER).to_string());

        Self { config, source }
    }

    pub fn config(&self) -> &CustomizationConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Publishes the config on the page, installs the watcher once and applies.
    pub fn run(&self, page: &mut Page) -> ApplyReport {
        page.globals_mut().config = Some(self.config);
        MutationWatcher::install(page);
        apply(page, &self.config)
    }
}

impl ScriptHost for Page {
    fn evaluate(&mut self, script: &CustomizationScript) {
        script.run(self);
    }
}
