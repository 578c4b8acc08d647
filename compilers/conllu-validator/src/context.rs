use std::collections::HashSet;

use conllu_graph::GappingState;

/// State carried from one sentence to the next within a run.
#[derive(Debug, Default)]
pub struct ValidationContext {
    pub known_sent_ids: HashSet<String>,
    pub gapping: GappingState,
    /// The last token of the previous sentence had SpaceAfter=No.
    pub spaceafterno_in_effect: bool,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }
}
