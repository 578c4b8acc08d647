use conllu_protocol::{universal_part, Category, Finding};

use crate::graph::EnhancedGraph;

/// Run-wide memory of the first empty node and the first enhanced `orphan`.
///
/// A treebank that uses empty nodes for gapping must not also use `orphan`
/// in its enhanced graphs, whichever of the two comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GappingState {
    first_empty_node_line: Option<usize>,
    first_orphan_line: Option<usize>,
}

impl GappingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, graph: &EnhancedGraph<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();
        for (id, row) in graph.nodes() {
            let finding = |test_id: &str, message: String| {
                Finding::new(3, Category::Enhanced, test_id, message)
                    .on_node(id)
                    .at_line(row.line())
            };

            if id.is_empty_node() && self.first_empty_node_line.is_none() {
                self.first_empty_node_line = Some(row.line());
                if let Some(orphan_line) = self.first_orphan_line {
                    findings.push(finding(
                        "empty-node-after-eorphan",
                        format!(
                            "Empty node means that we address gapping and there should be no orphans in the enhanced graph; but we saw one on line {}",
                            orphan_line
                        ),
                    ));
                }
            }

            let has_orphan = graph
                .parents(id)
                .iter()
                .any(|(_, rel)| universal_part(rel) == "orphan");
            if has_orphan {
                self.first_orphan_line.get_or_insert(row.line());
                if let Some(empty_line) = self.first_empty_node_line {
                    findings.push(finding(
                        "eorphan-after-empty-node",
                        format!(
                            "'orphan' not allowed in enhanced graph because we saw an empty node on line {}",
                            empty_line
                        ),
                    ));
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conllu_protocol::Row;

    fn sentence(first_line: usize, spec: &[(&str, &str)]) -> Vec<Row> {
        spec.iter()
            .enumerate()
            .map(|(i, (id, deps))| {
                let line = format!("{id}\tw\tw\tX\t_\t_\t_\t_\t{deps}\t_");
                Row::from_line(first_line + i, &line).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_orphan_then_empty_node() {
        let mut state = GappingState::new();

        let first = sentence(1, &[("1", "0:root"), ("2", "1:orphan")]);
        let graph = EnhancedGraph::build(&first).unwrap().unwrap();
        assert!(state.check(&graph).is_empty());

        let second = sentence(10, &[("1", "0:root"), ("1.1", "1:conj")]);
        let graph = EnhancedGraph::build(&second).unwrap().unwrap();
        let findings = state.check(&graph);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "empty-node-after-eorphan");
        assert!(findings[0].message.ends_with("but we saw one on line 2"));
        assert_eq!(findings[0].node.as_deref(), Some("1.1"));
        assert_eq!(findings[0].line, Some(11));
    }

    #[test]
    fn test_every_orphan_after_empty_node_is_reported() {
        let mut state = GappingState::new();
        let rows = sentence(
            4,
            &[("1", "0:root"), ("1.1", "1:conj"), ("2", "1.1:orphan"), ("3", "1:orphan:x")],
        );
        let graph = EnhancedGraph::build(&rows).unwrap().unwrap();
        let findings = state.check(&graph);
        let nodes: Vec<_> = findings.iter().map(|f| f.node.as_deref().unwrap_or("")).collect();
        assert_eq!(nodes, ["2", "3"]);
        assert_eq!(
            findings[0].message,
            "'orphan' not allowed in enhanced graph because we saw an empty node on line 5"
        );
    }
}
