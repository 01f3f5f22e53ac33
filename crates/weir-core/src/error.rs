//! Core error types for weir-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! the failure modes of the arena and DAG seams. The unrolling algorithm
//! itself assumes well-formed regions and only surfaces these when a
//! handle fails to resolve.

use crate::id::{EdgeId, VertexId};
use thiserror::Error;

/// Core errors produced by the weir-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A vertex handle was not found in the arena.
    #[error("vertex not found: VertexId({id})", id = id.0)]
    VertexNotFound { id: VertexId },

    /// An edge handle was not found in the arena.
    #[error("edge not found: EdgeId({id})", id = id.0)]
    EdgeNotFound { id: EdgeId },

    /// An edge endpoint has not been added to the graph being built.
    #[error("vertex not in graph: VertexId({id})", id = id.0)]
    VertexNotInGraph { id: VertexId },

    /// Building a DAG found a cycle through the given vertex.
    #[error("cycle detected through VertexId({id})", id = id.0)]
    CycleDetected { id: VertexId },
}
