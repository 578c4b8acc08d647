pub mod gapping;
pub mod graph;

pub use gapping::GappingState;
pub use graph::{EnhancedGraph, GraphError};
