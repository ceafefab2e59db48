use tracing::{debug, trace};

use crate::{
    apply::{ApplyReport, apply},
    dom::{MutationRecord, Page},
};

/// Re-applies the current customization whenever the site re-renders.
///
/// At most one watcher lives on a page. It reads the config from the page
/// globals at delivery time, so a later injection's config takes effect for
/// every following batch.
#[derive(Debug, Default)]
pub struct MutationWatcher {
    batches: usize,
}

impl MutationWatcher {
    /// Installs a watcher unless one is already present. Returns whether it
    /// was newly installed.
    pub fn install(page: &mut Page) -> bool {
        let globals = page.globals_mut();
        if globals.watcher.is_some() {
            trace!("Mutation watcher already installed");
            return false;
        }
        globals.watcher = Some(MutationWatcher::default());
        debug!("Installed mutation watcher");
        true
    }

    /// Batches delivered so far.
    pub fn batches(&self) -> usize {
        self.batches
    }

    pub(crate) fn deliver(&mut self, page: &mut Page, records: &[MutationRecord]) -> Option<ApplyReport> {
        self.batches += 1;
        let config = *page.customization()?;
        trace!("Mutation batch of {} records", records.len());
        Some(apply(page, &config))
    }
}
