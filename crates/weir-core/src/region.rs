//! Iterative (loop) regions and their unrolling.
//!
//! A [`LoopRegion`] is the payload of a loop vertex: a body subgraph
//! holding one iteration's template, four keyed collections classifying
//! every edge that crosses the loop boundary, a remaining-iteration
//! counter, and a termination predicate. Flattening a loop means calling
//! [`LoopRegion::unroll_once`] repeatedly -- each call splices one fresh,
//! identity-distinct copy of the body into a target graph and rewires the
//! boundary state for the next call -- until [`LoopRegion::finished`]
//! reports true.
//!
//! The region is a long-lived mutable accumulator driven by an explicit
//! caller loop. Calling `unroll_once` on a region that is already finished
//! materializes the exit edges again; checking `finished` after every call
//! is the caller's responsibility.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::arena::IrArena;
use crate::dag::DagBuilder;
use crate::error::CoreError;
use crate::id::{EdgeId, VertexId};

/// Signal value used by the no-argument [`LoopRegion::finished`] form.
const DEFAULT_SIGNAL: i32 = 0;

// ---------------------------------------------------------------------------
// Termination condition
// ---------------------------------------------------------------------------

/// A pure, total predicate over one integer signal, deciding loop
/// termination together with the remaining-iteration counter.
///
/// Cheaply cloneable; clones share the same predicate function.
#[derive(Clone)]
pub struct TerminationCondition(Arc<dyn Fn(i32) -> bool + Send + Sync>);

impl TerminationCondition {
    /// Wraps a predicate function.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(i32) -> bool + Send + Sync + 'static,
    {
        TerminationCondition(Arc::new(predicate))
    }

    /// The default condition: never true, so only the counter terminates
    /// the loop.
    pub fn never() -> Self {
        TerminationCondition::new(|_| false)
    }

    /// Evaluates the predicate for a signal value.
    pub fn evaluate(&self, signal: i32) -> bool {
        (self.0)(signal)
    }
}

impl Default for TerminationCondition {
    fn default() -> Self {
        TerminationCondition::never()
    }
}

impl fmt::Debug for TerminationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TerminationCondition(..)")
    }
}

// ---------------------------------------------------------------------------
// Loop region
// ---------------------------------------------------------------------------

/// Keyed boundary-edge collection: boundary vertex to the set of edges
/// recorded against it. Set semantics deduplicate identical edges;
/// insertion order keeps unrolling reproducible.
pub type BoundaryEdges = IndexMap<VertexId, IndexSet<EdgeId>>;

/// An iterative region: one iteration's body template plus the
/// classification of every boundary-crossing edge.
///
/// The `Clone` impl is a handle-level copy sharing the body template --
/// what a flattening driver uses to extract a region from its loop
/// vertex. [`LoopRegion::clone_in`] is the deep clone producing an
/// identity-independent body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopRegion {
    /// Label of the iterative construct this region was recognized from.
    label: String,
    /// The body template: vertices and internal edges of one iteration.
    body: DagBuilder,
    /// Edges feeding the body for the iteration about to be produced,
    /// keyed by destination. Cleared and rebuilt by every unroll call.
    entry_edges: BoundaryEdges,
    /// Loop-carried edges whose recorded source is a body template vertex
    /// standing for the previous iteration, keyed by destination.
    feedback_edges: BoundaryEdges,
    /// Edges sourced outside the loop that are identical every iteration,
    /// keyed by destination.
    external_constant_edges: BoundaryEdges,
    /// Edges from a body vertex out to the enclosing graph, keyed by
    /// source; materialized once, on the final iteration.
    exit_edges: BoundaryEdges,
    /// Iterations left to materialize. Decremented by exactly one per
    /// unroll call; increases only through explicit adjustment.
    remaining_iterations: i32,
    /// Termination predicate. Not serialized; deserializes to never-true.
    #[serde(skip)]
    termination: TerminationCondition,
}

impl LoopRegion {
    /// Creates an empty region: one remaining iteration, never-true
    /// termination condition.
    pub fn new(label: impl Into<String>) -> Self {
        LoopRegion {
            label: label.into(),
            body: DagBuilder::new(),
            entry_edges: BoundaryEdges::new(),
            feedback_edges: BoundaryEdges::new(),
            external_constant_edges: BoundaryEdges::new(),
            exit_edges: BoundaryEdges::new(),
            remaining_iterations: 1,
            termination: TerminationCondition::never(),
        }
    }

    /// Label of the iterative construct.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The body template builder.
    pub fn body(&self) -> &DagBuilder {
        &self.body
    }

    /// Mutable body template builder, used while the construct is being
    /// populated.
    pub fn body_mut(&mut self) -> &mut DagBuilder {
        &mut self.body
    }

    // -----------------------------------------------------------------------
    // Boundary classification
    // -----------------------------------------------------------------------

    /// Records an entry edge (external source, body destination), keyed by
    /// its destination.
    pub fn add_entry_edge(&mut self, arena: &IrArena, edge: EdgeId) -> Result<(), CoreError> {
        let dst = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?.dst;
        self.entry_edges.entry(dst).or_default().insert(edge);
        Ok(())
    }

    /// Records a loop-carried edge (body source from the previous
    /// iteration, body destination), keyed by its destination.
    pub fn add_feedback_edge(&mut self, arena: &IrArena, edge: EdgeId) -> Result<(), CoreError> {
        let dst = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?.dst;
        self.feedback_edges.entry(dst).or_default().insert(edge);
        Ok(())
    }

    /// Records an external edge that is identical every iteration, keyed
    /// by its destination.
    pub fn add_external_constant_edge(
        &mut self,
        arena: &IrArena,
        edge: EdgeId,
    ) -> Result<(), CoreError> {
        let dst = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?.dst;
        self.external_constant_edges.entry(dst).or_default().insert(edge);
        Ok(())
    }

    /// Records an exit edge (body source, external destination), keyed by
    /// its source.
    pub fn add_exit_edge(&mut self, arena: &IrArena, edge: EdgeId) -> Result<(), CoreError> {
        let src = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?.src;
        self.exit_edges.entry(src).or_default().insert(edge);
        Ok(())
    }

    /// Entry edges for the next unroll call, keyed by destination.
    pub fn entry_edges(&self) -> &BoundaryEdges {
        &self.entry_edges
    }

    /// Loop-carried edges, keyed by destination.
    pub fn feedback_edges(&self) -> &BoundaryEdges {
        &self.feedback_edges
    }

    /// Iteration-invariant external edges, keyed by destination.
    pub fn external_constant_edges(&self) -> &BoundaryEdges {
        &self.external_constant_edges
    }

    /// Exit edges, keyed by source.
    pub fn exit_edges(&self) -> &BoundaryEdges {
        &self.exit_edges
    }

    // -----------------------------------------------------------------------
    // Iteration budget and termination
    // -----------------------------------------------------------------------

    /// Iterations left to materialize.
    pub fn remaining_iterations(&self) -> i32 {
        self.remaining_iterations
    }

    /// Sets the iteration budget.
    pub fn set_remaining_iterations(&mut self, iterations: i32) {
        self.remaining_iterations = iterations;
    }

    /// Grants one more iteration. The only way the budget grows.
    pub fn increment_remaining_iterations(&mut self) {
        self.remaining_iterations += 1;
    }

    /// Replaces the termination condition.
    pub fn set_termination_condition(&mut self, condition: TerminationCondition) {
        self.termination = condition;
    }

    /// Whether the loop is finished for the default signal.
    pub fn finished(&self) -> bool {
        self.finished_with(DEFAULT_SIGNAL)
    }

    /// Whether the loop is finished: the budget is exhausted or the
    /// termination condition holds for `signal`.
    pub fn finished_with(&self, signal: i32) -> bool {
        self.remaining_iterations <= 0 || self.termination.evaluate(signal)
    }

    // -----------------------------------------------------------------------
    // Unrolling
    // -----------------------------------------------------------------------

    /// Materializes one iteration of the body into `target` and advances
    /// the region's state to represent one fewer remaining iteration.
    ///
    /// The body is traversed in topological order; every template vertex
    /// is cloned under a fresh identity and every internal edge is rebuilt
    /// between the clones, so successive iterations never alias instances.
    /// Recorded entry edges are wired from their unchanged external
    /// sources into this iteration's clones. If the region is finished
    /// after the decrement, the recorded exit edges are materialized from
    /// this iteration's clones. Finally the entry collection is rebuilt
    /// for the next call: external-constant edges verbatim, feedback edges
    /// re-sourced to the clones just created.
    ///
    /// Calling this on an already-finished region materializes the exit
    /// edges again; the driver must check [`finished`](Self::finished)
    /// after every call.
    pub fn unroll_once(
        &mut self,
        arena: &mut IrArena,
        target: &mut DagBuilder,
    ) -> Result<(), CoreError> {
        let mut clone_map: HashMap<VertexId, VertexId> = HashMap::new();
        let body = self.body.build()?;

        self.remaining_iterations -= 1;

        // One fresh copy of the body template.
        for &vertex in body.topological_order() {
            let cloned = arena.clone_vertex(vertex)?;
            clone_map.insert(vertex, cloned);
            target.add_vertex(arena, cloned)?;

            for edge in body.incoming_edges(vertex) {
                let src = endpoints(arena, edge)?.0;
                let rebuilt = arena.derive_edge(edge, mapped(&clone_map, src)?, cloned)?;
                target.connect(arena, rebuilt)?;
            }
        }

        // Wire the recorded entry edges into this iteration's clones.
        for (dst, edges) in &self.entry_edges {
            let new_dst = mapped(&clone_map, *dst)?;
            for &edge in edges {
                let src = endpoints(arena, edge)?.0;
                let rebuilt = arena.derive_edge(edge, src, new_dst)?;
                target.connect(arena, rebuilt)?;
            }
        }

        // The iteration recognized as final also materializes the exits.
        if self.finished() {
            for (src, edges) in &self.exit_edges {
                let new_src = mapped(&clone_map, *src)?;
                for &edge in edges {
                    let dst = endpoints(arena, edge)?.1;
                    let rebuilt = arena.derive_edge(edge, new_src, dst)?;
                    target.connect(arena, rebuilt)?;
                }
            }
        }

        // Rebuild the entry collection for the next call.
        self.entry_edges.clear();
        let constants: Vec<EdgeId> = self
            .external_constant_edges
            .values()
            .flat_map(|set| set.iter().copied())
            .collect();
        for edge in constants {
            self.add_entry_edge(arena, edge)?;
        }
        let carried: Vec<EdgeId> = self
            .feedback_edges
            .values()
            .flat_map(|set| set.iter().copied())
            .collect();
        for edge in carried {
            let (src, dst) = endpoints(arena, edge)?;
            let rebuilt = arena.derive_edge(edge, mapped(&clone_map, src)?, dst)?;
            self.add_entry_edge(arena, rebuilt)?;
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Deep clone
    // -----------------------------------------------------------------------

    /// Produces a structurally identical, identity-independent region:
    /// body vertices are cloned in topological order with internal edges
    /// rebuilt between the clones, the four boundary collections are
    /// reproduced with their body-side endpoints remapped to the clones,
    /// and the counter and termination condition are carried over.
    pub fn clone_in(&self, arena: &mut IrArena) -> Result<LoopRegion, CoreError> {
        let template = self.body.build()?;
        let mut clone_map: HashMap<VertexId, VertexId> = HashMap::new();
        let mut body = DagBuilder::new();

        for &vertex in template.topological_order() {
            let cloned = arena.clone_vertex(vertex)?;
            clone_map.insert(vertex, cloned);
            body.add_vertex(arena, cloned)?;

            for edge in template.incoming_edges(vertex) {
                let src = endpoints(arena, edge)?.0;
                let rebuilt = arena.derive_edge(edge, mapped(&clone_map, src)?, cloned)?;
                body.connect(arena, rebuilt)?;
            }
        }

        let mut clone = LoopRegion {
            label: self.label.clone(),
            body,
            entry_edges: BoundaryEdges::new(),
            feedback_edges: BoundaryEdges::new(),
            external_constant_edges: BoundaryEdges::new(),
            exit_edges: BoundaryEdges::new(),
            remaining_iterations: self.remaining_iterations,
            termination: self.termination.clone(),
        };

        // Boundary collections follow the body to its new identities.
        for edges in self.entry_edges.values() {
            for &edge in edges {
                let (src, dst) = endpoints(arena, edge)?;
                let rebuilt = arena.derive_edge(edge, src, mapped(&clone_map, dst)?)?;
                clone.add_entry_edge(arena, rebuilt)?;
            }
        }
        for edges in self.feedback_edges.values() {
            for &edge in edges {
                let (src, dst) = endpoints(arena, edge)?;
                let rebuilt = arena.derive_edge(
                    edge,
                    mapped(&clone_map, src)?,
                    mapped(&clone_map, dst)?,
                )?;
                clone.add_feedback_edge(arena, rebuilt)?;
            }
        }
        for edges in self.external_constant_edges.values() {
            for &edge in edges {
                let (src, dst) = endpoints(arena, edge)?;
                let rebuilt = arena.derive_edge(edge, src, mapped(&clone_map, dst)?)?;
                clone.add_external_constant_edge(arena, rebuilt)?;
            }
        }
        for edges in self.exit_edges.values() {
            for &edge in edges {
                let (src, dst) = endpoints(arena, edge)?;
                let rebuilt = arena.derive_edge(edge, mapped(&clone_map, src)?, dst)?;
                clone.add_exit_edge(arena, rebuilt)?;
            }
        }

        Ok(clone)
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    /// Descriptive representation for tooling: remaining iterations plus a
    /// summary of the current body graph. Not load-bearing.
    pub fn describe(&self, arena: &IrArena) -> serde_json::Value {
        let body = match self.body.build() {
            Ok(dag) => {
                let labels: Vec<String> = dag
                    .topological_order()
                    .iter()
                    .map(|&vertex| match arena.vertex(vertex) {
                        Some(found) => found.label.clone(),
                        None => format!("<unresolved {vertex}>"),
                    })
                    .collect();
                json!({ "vertices": labels, "edges": dag.edge_count() })
            }
            Err(_) => json!("<unbuildable body>"),
        };
        json!({
            "label": self.label,
            "remaining_iterations": self.remaining_iterations,
            "body": body,
        })
    }
}

fn mapped(clone_map: &HashMap<VertexId, VertexId>, id: VertexId) -> Result<VertexId, CoreError> {
    clone_map
        .get(&id)
        .copied()
        .ok_or(CoreError::VertexNotInGraph { id })
}

fn endpoints(arena: &IrArena, edge: EdgeId) -> Result<(VertexId, VertexId), CoreError> {
    let descriptor = arena.edge(edge).ok_or(CoreError::EdgeNotFound { id: edge })?;
    Ok((descriptor.src, descriptor.dst))
}
