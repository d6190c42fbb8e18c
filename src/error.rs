use std::path::PathBuf;

use thiserror::Error;

use crate::bridge::ExceptionInfo;

pub type Result<T> = std::result::Result<T, InspectorError>;

#[derive(Debug, Error)]
pub enum InspectorError {
    /// The inspected page rejected an evaluation.
    #[error("inspected page raised an exception: {0}")]
    Exception(ExceptionInfo),

    #[error("no diagnostics API detected in the inspected page")]
    NoApi,

    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("config error in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("response for unknown request #{0}")]
    UnknownTicket(u64),
}

impl InspectorError {
    /// Whether the panel should fall back to the "no diagnostics" screen.
    #[must_use]
    pub const fn disables_panel(&self) -> bool {
        matches!(self, Self::Exception(_) | Self::NoApi)
    }
}
