//! Stable ID newtypes for arena entities.
//!
//! All IDs are distinct newtype wrappers over `u32`, providing type safety
//! so that a `VertexId` cannot be accidentally used where an `EdgeId` is
//! expected. IDs are handles into the [`IrArena`](crate::arena::IrArena)
//! owning tables: the same `EdgeId` appearing in two collections means the
//! same edge, while a reconstructed copy always gets a fresh handle.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Stable vertex identifier into the arena's vertex table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexId(pub u32);

/// Stable edge identifier into the arena's edge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

// Display implementations -- just print the inner value.

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Bridge between VertexId and petgraph's NodeIndex<u32>, used by the DAG
// wrapper which stores VertexIds as node weights.

impl From<NodeIndex<u32>> for VertexId {
    fn from(idx: NodeIndex<u32>) -> Self {
        VertexId(idx.index() as u32)
    }
}

impl From<VertexId> for NodeIndex<u32> {
    fn from(id: VertexId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(42);
        let vertex_id = VertexId::from(idx);
        assert_eq!(vertex_id.0, 42);

        let back: NodeIndex<u32> = vertex_id.into();
        assert_eq!(back.index(), 42);
    }

    #[test]
    fn vertex_id_display() {
        assert_eq!(format!("{}", VertexId(7)), "7");
    }

    #[test]
    fn edge_id_display() {
        assert_eq!(format!("{}", EdgeId(99)), "99");
    }

    #[test]
    fn id_types_are_distinct() {
        // Ensure that different ID types cannot be confused at the type level.
        // This is a compile-time guarantee; we just verify the values are
        // independent.
        let vertex = VertexId(1);
        let edge = EdgeId(1);
        assert_eq!(vertex.0, edge.0);
    }

    #[test]
    fn serde_roundtrip() {
        let vertex = VertexId(42);
        let json = serde_json::to_string(&vertex).unwrap();
        let back: VertexId = serde_json::from_str(&json).unwrap();
        assert_eq!(vertex, back);

        let edge = EdgeId(7);
        let json = serde_json::to_string(&edge).unwrap();
        let back: EdgeId = serde_json::from_str(&json).unwrap();
        assert_eq!(edge, back);
    }
}
