//! Loop flattening: replaces every iterative region in a graph with a
//! finite sequence of rewired body copies.
//!
//! The pass drives each region with an explicit loop, checking the
//! finished state after every step -- unrolling a region past its finished
//! state would duplicate its exit wiring, so the driver never does.
//!
//! Edges of the enclosing graph that touch a loop vertex are not carried
//! over: the region's entry and exit collections are their authoritative
//! representation, and the unroll steps materialize them against the
//! freshly cloned iterations.

use tracing::debug;

use weir_core::arena::IrArena;
use weir_core::dag::{Dag, DagBuilder};
use weir_core::error::CoreError;
use weir_core::id::VertexId;

use crate::error::PassError;

/// Flattens every loop vertex of `dag` into unrolled iterations, returning
/// the acyclic result. Non-loop vertices and the edges between them are
/// carried over by handle, unchanged.
pub fn unroll_loops(arena: &mut IrArena, dag: &Dag) -> Result<Dag, PassError> {
    let mut builder = DagBuilder::new();

    // Register the surviving vertices up front: exit edges land on
    // destinations that come after their loop in topological order.
    for &vertex in dag.topological_order() {
        if !is_loop(arena, vertex)? {
            builder.add_vertex(arena, vertex)?;
        }
    }

    for &vertex in dag.topological_order() {
        let region = arena
            .vertex(vertex)
            .ok_or(CoreError::VertexNotFound { id: vertex })?
            .as_loop()
            .cloned();

        match region {
            Some(mut region) => {
                let mut iterations = 0u32;
                while !region.finished() {
                    region.unroll_once(arena, &mut builder)?;
                    iterations += 1;
                }
                debug!(label = region.label(), iterations, "unrolled loop region");
            }
            None => {
                for edge in dag.incoming_edges(vertex) {
                    let src = arena
                        .edge(edge)
                        .ok_or(CoreError::EdgeNotFound { id: edge })?
                        .src;
                    if !is_loop(arena, src)? {
                        builder.connect(arena, edge)?;
                    }
                }
            }
        }
    }

    Ok(builder.build()?)
}

fn is_loop(arena: &IrArena, vertex: VertexId) -> Result<bool, CoreError> {
    Ok(arena
        .vertex(vertex)
        .ok_or(CoreError::VertexNotFound { id: vertex })?
        .is_loop())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_core::edge::{ConnectionKind, PayloadEncoding};
    use weir_core::id::EdgeId;
    use weir_core::region::LoopRegion;
    use weir_core::vertex::{OperatorKind, VertexKind};

    fn one_to_one(arena: &mut IrArena, src: VertexId, dst: VertexId) -> EdgeId {
        arena
            .add_edge(ConnectionKind::OneToOne, src, dst, PayloadEncoding::Opaque)
            .unwrap()
    }

    #[test]
    fn graph_without_loops_is_carried_over_by_handle() {
        let mut arena = IrArena::new();
        let read = arena.add_vertex("read", VertexKind::Source);
        let map = arena.add_vertex("map", VertexKind::Operator(OperatorKind::Map));
        let write = arena.add_vertex("write", VertexKind::Sink);
        let first = one_to_one(&mut arena, read, map);
        let second = one_to_one(&mut arena, map, write);

        let mut builder = DagBuilder::new();
        for v in [read, map, write] {
            builder.add_vertex(&arena, v).unwrap();
        }
        builder.connect(&arena, first).unwrap();
        builder.connect(&arena, second).unwrap();
        let dag = builder.build().unwrap();

        let flat = unroll_loops(&mut arena, &dag).unwrap();
        assert_eq!(flat.vertex_count(), 3);
        assert_eq!(flat.edge_count(), 2);
        for v in [read, map, write] {
            assert!(flat.contains(v));
        }
        // Same handles: the edges were not reconstructed.
        assert_eq!(flat.incoming_edges(map).as_slice(), &[first]);
        assert_eq!(flat.incoming_edges(write).as_slice(), &[second]);
    }

    #[test]
    fn single_loop_is_replaced_by_its_iterations() {
        let mut arena = IrArena::new();
        let read = arena.add_vertex("read", VertexKind::Source);
        let write = arena.add_vertex("write", VertexKind::Sink);
        let body = arena.add_vertex("body", VertexKind::Operator(OperatorKind::Map));
        let entry = one_to_one(&mut arena, read, body);
        let feedback = one_to_one(&mut arena, body, body);
        let exit = one_to_one(&mut arena, body, write);

        let mut region = LoopRegion::new("iterate");
        region.body_mut().add_vertex(&arena, body).unwrap();
        region.add_entry_edge(&arena, entry).unwrap();
        region.add_feedback_edge(&arena, feedback).unwrap();
        region.add_exit_edge(&arena, exit).unwrap();
        region.set_remaining_iterations(2);
        let loop_vertex = arena.add_vertex("iterate", VertexKind::Loop(Box::new(region)));

        // Enclosing graph: read -> loop -> write. The edges touching the
        // loop vertex stand in for the recorded entry/exit edges.
        let into_loop = one_to_one(&mut arena, read, loop_vertex);
        let out_of_loop = one_to_one(&mut arena, loop_vertex, write);
        let mut builder = DagBuilder::new();
        for v in [read, loop_vertex, write] {
            builder.add_vertex(&arena, v).unwrap();
        }
        builder.connect(&arena, into_loop).unwrap();
        builder.connect(&arena, out_of_loop).unwrap();
        let dag = builder.build().unwrap();

        let flat = unroll_loops(&mut arena, &dag).unwrap();

        // read + write + two body clones; the loop vertex itself is gone.
        assert_eq!(flat.vertex_count(), 4);
        assert!(!flat.contains(loop_vertex));
        // entry into iteration 1, carried edge into iteration 2, exit.
        assert_eq!(flat.edge_count(), 3);
        assert_eq!(flat.incoming_edges(write).len(), 1);
        let final_exit = flat.incoming_edges(write)[0];
        assert_eq!(arena.edge(final_exit).unwrap().dst, write);
        assert_eq!(
            arena
                .vertex(arena.edge(final_exit).unwrap().src)
                .unwrap()
                .label,
            "body"
        );
    }

    #[test]
    fn exhausted_loop_contributes_nothing() {
        let mut arena = IrArena::new();
        let read = arena.add_vertex("read", VertexKind::Source);
        let body = arena.add_vertex("body", VertexKind::Operator(OperatorKind::Map));

        let mut region = LoopRegion::new("iterate");
        region.body_mut().add_vertex(&arena, body).unwrap();
        region.set_remaining_iterations(0);
        let loop_vertex = arena.add_vertex("iterate", VertexKind::Loop(Box::new(region)));
        let into_loop = one_to_one(&mut arena, read, loop_vertex);

        let mut builder = DagBuilder::new();
        builder.add_vertex(&arena, read).unwrap();
        builder.add_vertex(&arena, loop_vertex).unwrap();
        builder.connect(&arena, into_loop).unwrap();
        let dag = builder.build().unwrap();

        let flat = unroll_loops(&mut arena, &dag).unwrap();
        assert_eq!(flat.vertex_count(), 1);
        assert!(flat.contains(read));
        assert_eq!(flat.edge_count(), 0);
    }
}
