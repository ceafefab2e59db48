//! Content-hiding core for the NoReel browser shell.
//!
//! Preference flags compile into path rules; links resolving to those paths
//! are hidden in the hosted page and kept hidden while the site re-renders.
//! The page-side logic ships as a generated script ([`CustomizationScript`])
//! and is mirrored natively over [`dom::Page`].

pub mod apply;
pub mod config;
pub mod dom;
pub mod error;
pub mod injector;
pub mod normalize;
pub mod prefs;
pub mod rules;
pub mod script;
pub mod site;
pub mod watcher;

pub use config::{CustomizationConfig, Signature};
pub use error::{NoReelError, Result};
pub use injector::{Injector, ScriptHost};
pub use prefs::PreferenceStore;
pub use rules::{Rule, Section};
pub use script::CustomizationScript;
