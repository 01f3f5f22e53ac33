pub mod arena;
pub mod attribute;
pub mod dag;
pub mod edge;
pub mod error;
pub mod id;
pub mod region;
pub mod vertex;

// Re-export commonly used types
pub use arena::IrArena;
pub use attribute::{AttributeKey, AttributeMap, AttributeValue};
pub use dag::{Dag, DagBuilder};
pub use edge::{ConnectionKind, Edge, PayloadEncoding};
pub use error::CoreError;
pub use id::{EdgeId, VertexId};
pub use region::{BoundaryEdges, LoopRegion, TerminationCondition};
pub use vertex::{OperatorKind, Vertex, VertexKind};
