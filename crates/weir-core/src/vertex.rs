//! Vertex variants for the dataflow graph.
//!
//! Vertices are a tagged-variant set rather than a class hierarchy: a
//! [`Vertex`] pairs stable declared properties (label, attribute bag) with
//! a [`VertexKind`]. The loop kind composes an owned
//! [`LoopRegion`](crate::region::LoopRegion) -- a nested body subgraph plus
//! the boundary-edge classification driving unrolling.
//!
//! Vertex identity lives in the arena handle, not in the struct: cloning a
//! vertex through [`IrArena::clone_vertex`](crate::arena::IrArena::clone_vertex)
//! produces a new handle with equal declared properties and no shared
//! mutable state.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeMap;
use crate::region::LoopRegion;

/// Operations a transform vertex can perform on its input elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatorKind {
    /// One output element per input element.
    Map,
    /// Zero or one output element per input element.
    Filter,
    /// Zero or more output elements per input element.
    FlatMap,
    /// Groups elements sharing a key.
    GroupByKey,
    /// Combines grouped elements into an aggregate.
    Combine,
}

/// The variant payload of a vertex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VertexKind {
    /// Produces elements from outside the graph.
    Source,
    /// Transforms elements flowing through it.
    Operator(OperatorKind),
    /// Consumes elements and emits nothing.
    Sink,
    /// An iterative construct owning a nested body subgraph. Boxed: the
    /// region carries a full graph builder and boundary collections.
    Loop(Box<LoopRegion>),
}

/// A vertex in the dataflow IR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    /// Human-readable label, preserved by cloning.
    pub label: String,
    /// Placement and partitioning hints.
    pub attributes: AttributeMap,
    /// The variant payload.
    pub kind: VertexKind,
}

impl Vertex {
    /// Creates a vertex with an empty attribute bag.
    pub fn new(label: impl Into<String>, kind: VertexKind) -> Self {
        Vertex {
            label: label.into(),
            attributes: AttributeMap::new(),
            kind,
        }
    }

    /// Returns `true` if this vertex produces elements from outside the graph.
    pub fn is_source(&self) -> bool {
        matches!(self.kind, VertexKind::Source)
    }

    /// Returns `true` if this vertex is a transform.
    pub fn is_operator(&self) -> bool {
        matches!(self.kind, VertexKind::Operator(_))
    }

    /// Returns `true` if this vertex consumes elements terminally.
    pub fn is_sink(&self) -> bool {
        matches!(self.kind, VertexKind::Sink)
    }

    /// Returns `true` if this vertex owns an iterative region.
    pub fn is_loop(&self) -> bool {
        matches!(self.kind, VertexKind::Loop(_))
    }

    /// Returns the owned loop region, if this is a loop vertex.
    pub fn as_loop(&self) -> Option<&LoopRegion> {
        match &self.kind {
            VertexKind::Loop(region) => Some(region),
            _ => None,
        }
    }

    /// Mutable access to the owned loop region, if this is a loop vertex.
    /// Used while the iterative construct is being populated.
    pub fn as_loop_mut(&mut self) -> Option<&mut LoopRegion> {
        match &mut self.kind {
            VertexKind::Loop(region) => Some(region),
            _ => None,
        }
    }
}
