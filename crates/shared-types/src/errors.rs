//! Common error type used across all plot engine crates

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base error type for plot engine operations
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum PlotError {
    // Renderer errors
    #[error("Renderer initialization failed: {message}")]
    RendererInit { message: String },

    #[error("Surface error: {message}")]
    Surface { message: String },

    #[error("Renderer unavailable: {message}")]
    RendererUnavailable { message: String },

    #[error("Renderer worker disconnected")]
    WorkerDisconnected,

    // Configuration errors
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        message: String,
        field: Option<String>,
    },

    #[error("Invalid configuration format: {message}")]
    ConfigParse { message: String },

    // Runtime errors
    #[error("No async runtime available: {message}")]
    NoRuntime { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Result type alias for plot engine operations
pub type PlotResult<T> = Result<T, PlotError>;

impl PlotError {
    /// Errors after which the renderer must not be called again until reinitialized
    pub fn is_renderer_fatal(&self) -> bool {
        matches!(
            self,
            PlotError::RendererInit { .. }
                | PlotError::Surface { .. }
                | PlotError::RendererUnavailable { .. }
                | PlotError::WorkerDisconnected
        )
    }
}

impl From<serde_json::Error> for PlotError {
    fn from(err: serde_json::Error) -> Self {
        PlotError::ConfigParse {
            message: format!("{} (line {})", err, err.line()),
        }
    }
}

/// Helper macro for converting Results into PlotResult
#[macro_export]
macro_rules! map_plot_error {
    ($result:expr, $error_variant:ident, $message:expr) => {
        $result.map_err(|e| $crate::errors::PlotError::$error_variant {
            message: format!("{}: {}", $message, e),
        })
    };
}
