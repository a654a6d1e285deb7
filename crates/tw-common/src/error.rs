use thiserror::Error;

/// Executor errors from platform setup.
///
/// An overrun is reported through the cycle report and metrics, never as an
/// error. Configuration problems surface as [`crate::config::ConfigError`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TwError {
    /// Real-time thread setup failed (scheduler policy, affinity, memory lock).
    #[error("real-time setup failed: {0}")]
    Realtime(String),
}

/// Convenience type alias for TrendWatch operations.
pub type TwResult<T> = Result<T, TwError>;
