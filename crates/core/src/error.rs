use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NoReelError>;

#[derive(Debug, Error)]
pub enum NoReelError {
    #[error("Failed to access preferences at {}: {source}", path.display())]
    PreferencesIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed preferences file {}: {source}", path.display())]
    PreferencesFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown section '{0}' (expected reels, shop, explore or threads)")]
    UnknownSection(String),

    #[error("Could not determine a data directory for this platform")]
    NoDataDir,
}
