//! Acyclic graph container and builder over arena handles.
//!
//! [`DagBuilder`] accumulates vertices and edges by handle; [`Dag`] is the
//! immutable snapshot produced by [`DagBuilder::build`], carrying a cached
//! topological order. The order is total, consistent with the edge
//! relation, and deterministic across repeated builds from equal inputs --
//! unrolling the same region into the same builder twice yields the same
//! traversal.
//!
//! Backed by `petgraph`'s `StableGraph` with [`VertexId`]s as node weights
//! and [`EdgeId`]s as edge weights; the structure lives here, the entity
//! data lives in the [`IrArena`](crate::arena::IrArena).

use indexmap::{IndexMap, IndexSet};
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::arena::IrArena;
use crate::error::CoreError;
use crate::id::{EdgeId, VertexId};

/// Builder for an acyclic graph of arena handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagBuilder {
    graph: StableGraph<VertexId, EdgeId, Directed, u32>,
    indices: IndexMap<VertexId, NodeIndex<u32>>,
    connected: IndexSet<EdgeId>,
}

impl DagBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        DagBuilder::default()
    }

    /// Adds a vertex to the graph being built. Idempotent: adding a vertex
    /// that is already present is a no-op. The arena is the context the
    /// handle must resolve against.
    pub fn add_vertex(&mut self, arena: &IrArena, id: VertexId) -> Result<(), CoreError> {
        if arena.vertex(id).is_none() {
            return Err(CoreError::VertexNotFound { id });
        }
        if !self.indices.contains_key(&id) {
            let idx = self.graph.add_node(id);
            self.indices.insert(id, idx);
        }
        Ok(())
    }

    /// Connects two already-added vertices by an edge handle. Both
    /// endpoints must have been added first. Connecting the same `EdgeId`
    /// twice is a no-op (set semantics).
    pub fn connect(&mut self, arena: &IrArena, edge: EdgeId) -> Result<(), CoreError> {
        let descriptor = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?;
        let src_idx = self
            .indices
            .get(&descriptor.src)
            .copied()
            .ok_or(CoreError::VertexNotInGraph { id: descriptor.src })?;
        let dst_idx = self
            .indices
            .get(&descriptor.dst)
            .copied()
            .ok_or(CoreError::VertexNotInGraph { id: descriptor.dst })?;

        if self.connected.insert(edge) {
            self.graph.add_edge(src_idx, dst_idx, edge);
        }
        Ok(())
    }

    /// Returns `true` if the vertex has been added.
    pub fn contains(&self, id: VertexId) -> bool {
        self.indices.contains_key(&id)
    }

    /// Number of vertices added so far.
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of distinct edges connected so far.
    pub fn edge_count(&self) -> usize {
        self.connected.len()
    }

    /// Iterates over added vertices in insertion order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.indices.keys().copied()
    }

    /// Iterates over connected edges in connection order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.connected.iter().copied()
    }

    /// Builds the immutable DAG snapshot, computing the topological order.
    ///
    /// Fails with [`CoreError::CycleDetected`] if the accumulated edges
    /// form a cycle.
    pub fn build(&self) -> Result<Dag, CoreError> {
        let order = toposort(&self.graph, None).map_err(|cycle| CoreError::CycleDetected {
            id: self.graph[cycle.node_id()],
        })?;
        let topo = order.iter().map(|&idx| self.graph[idx]).collect();

        Ok(Dag {
            graph: self.graph.clone(),
            indices: self.indices.clone(),
            topo,
        })
    }
}

/// An immutable acyclic graph snapshot with a cached topological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dag {
    graph: StableGraph<VertexId, EdgeId, Directed, u32>,
    indices: IndexMap<VertexId, NodeIndex<u32>>,
    topo: Vec<VertexId>,
}

impl Dag {
    /// The topological order of all vertices.
    pub fn topological_order(&self) -> &[VertexId] {
        &self.topo
    }

    /// Returns `true` if the vertex is part of this DAG.
    pub fn contains(&self, id: VertexId) -> bool {
        self.indices.contains_key(&id)
    }

    /// Incoming edges of a vertex, in the order they were connected.
    /// Unknown vertices have no edges.
    pub fn incoming_edges(&self, id: VertexId) -> SmallVec<[EdgeId; 4]> {
        self.edges_in(id, Direction::Incoming)
    }

    /// Outgoing edges of a vertex, in the order they were connected.
    pub fn outgoing_edges(&self, id: VertexId) -> SmallVec<[EdgeId; 4]> {
        self.edges_in(id, Direction::Outgoing)
    }

    fn edges_in(&self, id: VertexId, direction: Direction) -> SmallVec<[EdgeId; 4]> {
        let Some(&idx) = self.indices.get(&id) else {
            return SmallVec::new();
        };
        let mut edges: SmallVec<[EdgeId; 4]> = self
            .graph
            .edges_directed(idx, direction)
            .map(|edge_ref| *edge_ref.weight())
            .collect();
        // petgraph yields newest-first; flip back to connection order.
        edges.reverse();
        edges
    }

    /// Number of vertices in the DAG.
    pub fn vertex_count(&self) -> usize {
        self.indices.len()
    }

    /// Number of edges in the DAG.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
