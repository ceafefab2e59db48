use tracing::{debug, trace};

use crate::{
    config::{CustomizationConfig, PREF_HIDE_PREFIX, Signature},
    script::CustomizationScript,
};

/// Anything that can run a customization script against the loaded page.
/// Evaluation is fire-and-forget; hosts log their own failures.
pub trait ScriptHost {
    fn evaluate(&mut self, script: &CustomizationScript);
}

/// Decides when the page needs a fresh customization script.
///
/// Calls made while no page is ready are dropped. Non-forced calls with a
/// config equal to the last injected one are skipped.
#[derive(Debug, Default)]
pub struct Injector {
    page_ready: bool,
    last_signature: Option<Signature>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_page_ready(&self) -> bool {
        self.page_ready
    }

    pub fn on_page_started(&mut self) {
        self.page_ready = false;
    }

    /// The new document has no customization yet, so always inject.
    pub fn on_page_ready(&mut self, config: CustomizationConfig) -> Option<CustomizationScript> {
        self.page_ready = true;
        self.inject(config, true)
    }

    pub fn on_config_changed(&mut self, config: CustomizationConfig) -> Option<CustomizationScript> {
        self.inject(config, false)
    }

    /// Preference listener entry point; keys outside the hiding flags are ignored.
    pub fn on_preference_changed(
        &mut self,
        key: &str,
        config: CustomizationConfig,
    ) -> Option<CustomizationScript> {
        if !key.starts_with(PREF_HIDE_PREFIX) {
            return None;
        }
        self.on_config_changed(config)
    }

    /// The shell came back to the foreground; preferences may have changed meanwhile.
    pub fn on_resume(&mut self, config: CustomizationConfig) -> Option<CustomizationScript> {
        self.inject(config, false)
    }

    pub fn inject(&mut self, config: CustomizationConfig, force: bool) -> Option<CustomizationScript> {
        if !self.page_ready {
            trace!("Page not ready, dropping injection");
            return None;
        }
        let signature = config.signature();
        if !force && self.last_signature == Some(signature) {
            trace!("Customization unchanged, skipping injection");
            return None;
        }
        self.last_signature = Some(signature);
        debug!(?config, force, "Injecting customization script");
        Some(CustomizationScript::new(config))
    }

    /// Runs [`Injector::inject`] and hands any script to `host`.
    pub fn inject_into<H: ScriptHost + ?Sized>(
        &mut self,
        host: &mut H,
        config: CustomizationConfig,
        force: bool,
    ) -> bool {
        match self.inject(config, force) {
            Some(script) => {
                host.evaluate(&script);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Section;

    #[derive(Default)]
    struct Recorder(Vec<CustomizationConfig>);

    impl ScriptHost for Recorder {
        fn evaluate(&mut self, script: &CustomizationScript) {
            self.0.push(*script.config());
        }
    }

    #[test]
    fn not_ready_calls_are_dropped() {
        let mut injector = Injector::new();
        assert!(injector.on_config_changed(CustomizationConfig::default()).is_none());
        assert!(injector.on_resume(CustomizationConfig::default()).is_none());
        assert!(injector.inject(CustomizationConfig::default(), true).is_none());
    }

    #[test]
    fn page_ready_always_injects() {
        let mut injector = Injector::new();
        let config = CustomizationConfig::default();
        assert!(injector.on_page_ready(config).is_some());
        assert!(injector.on_page_ready(config).is_some());
        assert!(injector.on_config_changed(config).is_none());
    }

    #[test]
    fn page_started_blocks_until_ready_again() {
        let mut injector = Injector::new();
        let config = CustomizationConfig::default();
        injector.on_page_ready(config);
        injector.on_page_started();
        assert!(!injector.is_page_ready());
        assert!(injector.on_config_changed(config.with(Section::Shop, true)).is_none());
        assert!(injector.on_page_ready(config).is_some());
    }

    #[test]
    fn preference_keys_filtered_by_prefix() {
        let mut injector = Injector::new();
        let config = CustomizationConfig::default();
        injector.on_page_ready(config);

        let changed = config.with(Section::Explore, true);
        assert!(injector.on_preference_changed("pref_clear_data", changed).is_none());
        let script = injector.on_preference_changed("pref_hide_explore", changed);
        assert_eq!(script.map(|s| *s.config()), Some(changed));
    }

    #[test]
    fn inject_into_hands_script_to_host() {
        let mut injector = Injector::new();
        let mut host = Recorder::default();
        let config = CustomizationConfig::default();

        assert!(!injector.inject_into(&mut host, config, false));
        injector.on_page_started();
        if let Some(script) = injector.on_page_ready(config) {
            host.evaluate(&script);
        }
        assert!(!injector.inject_into(&mut host, config, false));
        assert!(injector.inject_into(&mut host, config, true));
        assert_eq!(host.0, vec![config, config]);
    }
}
