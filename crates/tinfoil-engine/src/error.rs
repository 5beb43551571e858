//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup and the session.

/// Top-level error for the engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `run` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: tinfoil_core::config::ConfigError,
    },

    /// The content catalog could not be loaded.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: tinfoil_core::catalog::CatalogError,
    },

    /// A save slot could not be selected or written.
    #[error("save error: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: tinfoil_core::persistence::PersistError,
    },

    /// The session ended abnormally.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: tinfoil_core::runner::RunnerError,
    },

    /// Bad command-line arguments.
    #[error("usage: tinfoil-engine [slot 1-3] ({message})")]
    Usage {
        /// What was wrong.
        message: String,
    },
}
