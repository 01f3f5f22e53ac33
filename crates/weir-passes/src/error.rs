//! Error types for graph transformation passes.

use thiserror::Error;
use weir_core::CoreError;

/// Errors produced while running a pass.
#[derive(Debug, Error)]
pub enum PassError {
    /// A core graph operation failed underneath the pass.
    #[error("core graph error: {0}")]
    Core(#[from] CoreError),
}
