//! The owning arena for IR vertices and edges.
//!
//! All vertices and edges live in two append-only tables owned by
//! [`IrArena`]; everything else -- graphs, builders, boundary collections --
//! holds [`VertexId`]/[`EdgeId`] handles into them. Two collections holding
//! the same `EdgeId` hold the same edge; a reconstructed copy always comes
//! from [`IrArena::derive_edge`] under a fresh handle. Handles are never
//! invalidated: the arena only grows.

use serde::{Deserialize, Serialize};

use crate::attribute::{AttributeKey, AttributeValue};
use crate::edge::{ConnectionKind, Edge, PayloadEncoding};
use crate::error::CoreError;
use crate::id::{EdgeId, VertexId};
use crate::vertex::{Vertex, VertexKind};

/// Owning table for every vertex and edge of a program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrArena {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

impl IrArena {
    /// Creates an empty arena.
    pub fn new() -> Self {
        IrArena::default()
    }

    // -----------------------------------------------------------------------
    // Vertices
    // -----------------------------------------------------------------------

    /// Adds a vertex with an empty attribute bag, returning its handle.
    pub fn add_vertex(&mut self, label: impl Into<String>, kind: VertexKind) -> VertexId {
        self.push_vertex(Vertex::new(label, kind))
    }

    /// Clones a vertex: a new handle with equal declared properties (label,
    /// attributes, kind) and no shared mutable state with the original.
    /// Cloning a loop vertex deep-clones its region, giving the clone an
    /// identity-independent body subgraph.
    pub fn clone_vertex(&mut self, id: VertexId) -> Result<VertexId, CoreError> {
        let template = self
            .vertex(id)
            .ok_or(CoreError::VertexNotFound { id })?
            .clone();
        let Vertex {
            label,
            attributes,
            kind,
        } = template;
        let kind = match kind {
            VertexKind::Loop(region) => VertexKind::Loop(Box::new(region.clone_in(self)?)),
            other => other,
        };
        Ok(self.push_vertex(Vertex {
            label,
            attributes,
            kind,
        }))
    }

    /// Looks up a vertex by handle.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0 as usize)
    }

    /// Mutable vertex lookup, used while a construct is being populated
    /// (e.g. filling in a loop vertex's region during parsing).
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.0 as usize)
    }

    /// Number of vertices ever created.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(vertex);
        id
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Creates an edge between two existing vertices, with an empty
    /// attribute bag, returning its handle.
    pub fn add_edge(
        &mut self,
        kind: ConnectionKind,
        src: VertexId,
        dst: VertexId,
        encoding: PayloadEncoding,
    ) -> Result<EdgeId, CoreError> {
        if self.vertex(src).is_none() {
            return Err(CoreError::VertexNotFound { id: src });
        }
        if self.vertex(dst).is_none() {
            return Err(CoreError::VertexNotFound { id: dst });
        }
        Ok(self.push_edge(Edge::new(kind, src, dst, encoding)))
    }

    /// Creates an edge equivalent to `template` -- same connection kind,
    /// same payload encoding, attributes copied verbatim -- wired between
    /// the given endpoints. This is the reconstruction operation used for
    /// every edge the unroller synthesizes.
    pub fn derive_edge(
        &mut self,
        template: EdgeId,
        src: VertexId,
        dst: VertexId,
    ) -> Result<EdgeId, CoreError> {
        let (kind, encoding, attributes) = {
            let descriptor = self
                .edge(template)
                .ok_or(CoreError::EdgeNotFound { id: template })?;
            (
                descriptor.kind,
                descriptor.encoding.clone(),
                descriptor.attributes.clone(),
            )
        };
        if self.vertex(src).is_none() {
            return Err(CoreError::VertexNotFound { id: src });
        }
        if self.vertex(dst).is_none() {
            return Err(CoreError::VertexNotFound { id: dst });
        }
        Ok(self.push_edge(Edge {
            kind,
            src,
            dst,
            encoding,
            attributes,
        }))
    }

    /// Sets an attribute on an edge. Attribute population happens while an
    /// edge is being described, before its handle is shared.
    pub fn set_edge_attribute(
        &mut self,
        id: EdgeId,
        key: AttributeKey,
        value: AttributeValue,
    ) -> Result<(), CoreError> {
        let edge = self
            .edges
            .get_mut(id.0 as usize)
            .ok_or(CoreError::EdgeNotFound { id })?;
        edge.attributes.insert(key, value);
        Ok(())
    }

    /// Copies the attribute bag of `from` onto `onto`, verbatim.
    pub fn copy_attributes(&mut self, from: EdgeId, onto: EdgeId) -> Result<(), CoreError> {
        let source = self
            .edge(from)
            .ok_or(CoreError::EdgeNotFound { id: from })?
            .attributes
            .clone();
        let target = self
            .edges
            .get_mut(onto.0 as usize)
            .ok_or(CoreError::EdgeNotFound { id: onto })?;
        target.attributes.copy_from(&source);
        Ok(())
    }

    /// Looks up an edge by handle.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize)
    }

    /// Number of edges ever created.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(edge);
        id
    }
}
