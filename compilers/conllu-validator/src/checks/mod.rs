pub mod lspec;
pub mod metadata;
pub mod rows;
pub mod sentence;

pub use lspec::check_lspec;
pub use metadata::{check_sent_id, check_text_meta, TextOptions};
pub use rows::{check_row, RowEnv};
pub use sentence::{check_deps, check_id_references, check_misc, check_root, skipped_corrupt_tree};
