//! Error taxonomy for the blinken core.
//!
//! None of these are fatal. Each one has a recovery path at its call site:
//! config errors fall back to the built-in document, plugin errors skip the
//! offending reference or candidate, unsupported operations become notices.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;


#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    #[error("failed to write configuration to {path}: {source}")]
    ConfigPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown plugin type: {type_name}")]
    PluginResolution { type_name: String },

    #[error("plugin candidate '{candidate}' could not be registered: {reason}")]
    PluginDiscovery { candidate: String, reason: String },

    #[error("{operation} is not available with fixed layouts")]
    Unsupported { operation: String },
}


impl Error {
    #[must_use]
    pub fn config_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn discovery(candidate: impl Into<String>, reason: impl ToString) -> Self {
        Self::PluginDiscovery {
            candidate: candidate.into(),
            reason: reason.to_string(),
        }
    }
}
