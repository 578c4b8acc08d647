pub mod geometry;
pub mod systems;
pub mod tree;

pub use systems::check_annotation;
pub use tree::{Node, Tree, TreeError};
