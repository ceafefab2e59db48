use serde::{Deserialize, Serialize};

use crate::rules::Section;

/// Prefix shared by every persisted hiding flag.
pub const PREF_HIDE_PREFIX: &str = "pref_hide_";

/// Snapshot of the four hiding flags taken at injection time.
///
/// Serializes with the camelCase keys the injected script reads
/// (`hideReels`, `hideShop`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationConfig {
    pub hide_reels: bool,
    pub hide_shop: bool,
    pub hide_explore: bool,
    pub hide_threads: bool,
}

impl Default for CustomizationConfig {
    fn default() -> Self {
        Self {
            hide_reels: true,
            hide_shop: false,
            hide_explore: false,
            hide_threads: false,
        }
    }
}

impl CustomizationConfig {
    pub fn hides(&self, section: Section) -> bool {
        match section {
            Section::Reels => self.hide_reels,
            Section::Shop => self.hide_shop,
            Section::Explore => self.hide_explore,
            Section::Threads => self.hide_threads,
        }
    }

    pub fn set(&mut self, section: Section, hide: bool) {
        let flag = match section {
            Section::Reels => &mut self.hide_reels,
            Section::Shop => &mut self.hide_shop,
            Section::Explore => &mut self.hide_explore,
            Section::Threads => &mut self.hide_threads,
        };
        *flag = hide;
    }

    pub fn with(mut self, section: Section, hide: bool) -> Self {
        self.set(section, hide);
        self
    }

    pub fn signature(&self) -> Signature {
        let bits = Section::ALL
            .iter()
            .enumerate()
            .filter(|(_, section)| self.hides(**section))
            .fold(0u8, |acc, (i, _)| acc | (1 << i));
        Signature(bits)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            // Only bools; serialization cannot actually fail.
            String::from("{}")
        })
    }
}

/// One bit per section in registry order. Equal iff the configs are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(u8);

impl Signature {
    pub fn bits(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_hide_only_reels() {
        let config = CustomizationConfig::default();
        assert!(config.hides(Section::Reels));
        assert!(!config.hides(Section::Shop));
        assert!(!config.hides(Section::Explore));
        assert!(!config.hides(Section::Threads));
    }

    #[test]
    fn signature_tracks_structural_equality() {
        let a = CustomizationConfig::default();
        let b = CustomizationConfig::default();
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature().bits(), 0b0001);

        let c = a.with(Section::Threads, true);
        assert_ne!(a.signature(), c.signature());
        assert_eq!(c.signature().bits(), 0b1001);

        let mut seen = std::collections::HashSet::new();
        for bits in 0u8..16 {
            let config = Section::ALL
                .iter()
                .enumerate()
                .fold(CustomizationConfig::default(), |cfg, (i, s)| {
                    cfg.with(*s, bits & (1 << i) != 0)
                });
            assert!(seen.insert(config.signature()));
        }
    }

    #[test]
    fn json_uses_script_keys() {
        let json = CustomizationConfig::default()
            .with(Section::Explore, true)
            .to_json();
        assert_eq!(
            json,
            r#"{"hideReels":true,"hideShop":false,"hideExplore":true,"hideThreads":false}"#
        );
    }
}
