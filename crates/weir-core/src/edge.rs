//! Edge descriptors for the dataflow graph.
//!
//! An [`Edge`] is a directed, typed connection between two vertices: a
//! communication pattern ([`ConnectionKind`]), a payload encoding
//! descriptor ([`PayloadEncoding`]), and an attribute bag. Edges are
//! value-like: once created in the arena they are immutable apart from
//! attribute population before first sharing, so the same [`EdgeId`] can
//! safely appear in several boundary collections and graphs at once.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeMap;
use crate::id::VertexId;

// ---------------------------------------------------------------------------
// Connection kinds
// ---------------------------------------------------------------------------

/// The communication pattern of an edge between data-parallel vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Element i of the source feeds element i of the destination.
    OneToOne,
    /// Every source element is replicated to every destination element.
    Broadcast,
    /// Source elements are repartitioned across destination elements.
    ScatterGather,
}

// ---------------------------------------------------------------------------
// Payload encodings
// ---------------------------------------------------------------------------

/// Describes how an edge's payload is encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadEncoding {
    /// Raw bytes with no declared structure.
    Opaque,
    /// UTF-8 text records.
    Utf8,
    /// Variable-length integer records.
    VarInt,
    /// Key/value pairs with separate encodings per component.
    Pair(Box<PayloadEncoding>, Box<PayloadEncoding>),
}

// ---------------------------------------------------------------------------
// Edge descriptor
// ---------------------------------------------------------------------------

/// A directed edge between two vertices, stored in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The communication pattern of this edge.
    pub kind: ConnectionKind,
    /// Source vertex handle.
    pub src: VertexId,
    /// Destination vertex handle.
    pub dst: VertexId,
    /// Payload encoding descriptor.
    pub encoding: PayloadEncoding,
    /// Attribute bag, copied verbatim when the edge is derived from a
    /// template and never mutated after that copy.
    pub attributes: AttributeMap,
}

impl Edge {
    /// Creates an edge with an empty attribute bag.
    pub fn new(
        kind: ConnectionKind,
        src: VertexId,
        dst: VertexId,
        encoding: PayloadEncoding,
    ) -> Self {
        Edge {
            kind,
            src,
            dst,
            encoding,
            attributes: AttributeMap::new(),
        }
    }

    /// Returns `true` if this edge repartitions its payload.
    pub fn is_shuffle(&self) -> bool {
        matches!(self.kind, ConnectionKind::ScatterGather)
    }
}
