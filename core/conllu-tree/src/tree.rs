use std::collections::BTreeSet;

use conllu_protocol::{universal_part, Category, Finding, Misc, Row};
use thiserror::Error;

/// One word of the basic tree. Slot 0 of [`Tree`] is the artificial root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<'s> {
    pub id: u32,
    pub head: u32,
    pub line: usize,
    pub form: &'s str,
    pub lemma: &'s str,
    pub upos: &'s str,
    pub feats: &'s str,
    pub deprel: &'s str,
    pub misc: Misc<'s>,
}

impl<'s> Node<'s> {
    fn root(line: usize) -> Self {
        Self {
            id: 0,
            head: 0,
            line,
            form: "_",
            lemma: "_",
            upos: "_",
            feats: "_",
            deprel: "_",
            misc: Misc("_"),
        }
    }

    pub fn udeprel(&self) -> &'s str {
        universal_part(self.deprel)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("HEAD==ID for {id}")]
    SelfLoop { id: u32, line: usize },
    #[error("Multiple root words: {0:?}")]
    MultipleRoots(Vec<u32>),
    #[error("Non-tree structure. Words {} are not reachable from the root 0.", join(.0))]
    NonTree(Vec<u32>),
    /// Missing or unparsable ID/HEAD; reported by the row checks already.
    #[error("word rows are malformed")]
    Malformed,
}

fn join(ids: &[u32]) -> String {
    ids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl TreeError {
    /// The finding to report, or `None` when the cause was reported elsewhere.
    pub fn finding(&self) -> Option<Finding> {
        let (test_id, line) = match self {
            TreeError::SelfLoop { line, .. } => ("head-self-loop", Some(*line)),
            TreeError::MultipleRoots(_) => ("multiple-roots", None),
            TreeError::NonTree(_) => ("non-tree", None),
            TreeError::Malformed => return None,
        };
        let finding = Finding::new(2, Category::Syntax, test_id, self.to_string());
        Some(match line {
            Some(l) => finding.at_line(l),
            None => finding,
        })
    }
}

/// Basic dependency tree of one sentence, indexed by word id.
#[derive(Debug, Clone)]
pub struct Tree<'s> {
    nodes: Vec<Node<'s>>,
    children: Vec<Vec<u32>>,
}

impl<'s> Tree<'s> {
    /// Builds the tree from the word rows of a sentence whose id sequence is `1..n`.
    pub fn build(rows: &'s [Row], single_root: bool) -> Result<Self, TreeError> {
        let start_line = rows.first().map_or(0, Row::line);
        let mut nodes = vec![Node::root(start_line)];

        // 1. Collect words; MWT and empty rows do not take part in the shape.
        for row in rows.iter().filter(|r| r.is_word()) {
            let (Some(id), Some(head)) = (row.word(), row.head()) else {
                return Err(TreeError::Malformed);
            };
            if id as usize != nodes.len() {
                return Err(TreeError::Malformed);
            }
            if head == id {
                return Err(TreeError::SelfLoop { id, line: row.line() });
            }
            nodes.push(Node {
                id,
                head,
                line: row.line(),
                form: row.form(),
                lemma: row.lemma(),
                upos: row.upos(),
                feats: row.feats(),
                deprel: row.deprel(),
                misc: row.misc(),
            });
        }

        // 2. Children lists, ascending by construction. Heads outside the
        //    sentence attach to nothing and surface as unreachable words.
        let mut children = vec![Vec::new(); nodes.len()];
        for node in nodes.iter().skip(1) {
            if let Some(siblings) = children.get_mut(node.head as usize) {
                siblings.push(node.id);
            }
        }

        let tree = Self { nodes, children };

        // 3. Root count
        if single_root && tree.children[0].len() > 1 {
            return Err(TreeError::MultipleRoots(tree.children[0].clone()));
        }

        // 4. Cycles and fragments both leave words outside the root's projection.
        let reachable = tree.projection(0);
        let unreachable: Vec<u32> = (1..=tree.len() as u32)
            .filter(|id| !reachable.contains(id))
            .collect();
        if !unreachable.is_empty() {
            return Err(TreeError::NonTree(unreachable));
        }

        Ok(tree)
    }

    /// Number of words.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Node by id; 0 is the root.
    pub fn node(&self, id: u32) -> &Node<'s> {
        &self.nodes[id as usize]
    }

    /// Words in id order, without the root.
    pub fn words(&self) -> impl Iterator<Item = &Node<'s>> {
        self.nodes.iter().skip(1)
    }

    pub fn children(&self, id: u32) -> &[u32] {
        &self.children[id as usize]
    }

    pub fn head(&self, id: u32) -> u32 {
        self.nodes[id as usize].head
    }

    /// All descendants of `id` (not `id` itself).
    pub fn projection(&self, id: u32) -> BTreeSet<u32> {
        let mut projection = BTreeSet::new();
        let mut stack: Vec<u32> = self.children(id).to_vec();
        while let Some(child) = stack.pop() {
            if projection.insert(child) {
                stack.extend_from_slice(self.children(child));
            }
        }
        projection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rows;

    #[test]
    fn test_build_simple_tree() {
        let words = rows(&[(1, "PRON", 2, "nsubj"), (2, "VERB", 0, "root")]);
        let tree = Tree::build(&words, true).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(0), &[2]);
        assert_eq!(tree.children(2), &[1]);
        assert_eq!(tree.node(1).line, 1);
        assert_eq!(tree.projection(0).len(), 2);
    }

    #[test]
    fn test_self_loop_aborts() {
        let words = rows(&[(1, "PRON", 1, "nsubj"), (2, "VERB", 0, "root")]);
        let err = Tree::build(&words, true).unwrap_err();
        assert_eq!(err, TreeError::SelfLoop { id: 1, line: 1 });
        let finding = err.finding().unwrap();
        assert_eq!(finding.test_id, "head-self-loop");
        assert_eq!(finding.message, "HEAD==ID for 1");
        assert_eq!(finding.line, Some(1));
    }

    #[test]
    fn test_multiple_roots_only_in_single_root_mode() {
        let words = rows(&[(1, "VERB", 0, "root"), (2, "VERB", 0, "root")]);
        let err = Tree::build(&words, true).unwrap_err();
        assert_eq!(err.to_string(), "Multiple root words: [1, 2]");
        assert!(Tree::build(&words, false).is_ok());
    }

    #[test]
    fn test_cycle_is_non_tree() {
        let words = rows(&[
            (1, "VERB", 0, "root"),
            (2, "NOUN", 3, "obj"),
            (3, "NOUN", 2, "nmod"),
        ]);
        let err = Tree::build(&words, true).unwrap_err();
        assert_eq!(err, TreeError::NonTree(vec![2, 3]));
        assert_eq!(
            err.to_string(),
            "Non-tree structure. Words 2, 3 are not reachable from the root 0."
        );
    }

    #[test]
    fn test_head_outside_sentence_is_unreachable() {
        let words = rows(&[(1, "VERB", 0, "root"), (2, "NOUN", 7, "obj")]);
        assert_eq!(
            Tree::build(&words, true).unwrap_err(),
            TreeError::NonTree(vec![2])
        );
    }

    #[test]
    fn test_malformed_head_is_silent() {
        let line = "1\tw\tw\tX\t_\t_\t_\troot\t_\t_";
        let words = vec![Row::from_line(1, line).unwrap()];
        let err = Tree::build(&words, true).unwrap_err();
        assert_eq!(err, TreeError::Malformed);
        assert!(err.finding().is_none());
    }

    #[test]
    fn test_multiword_and_empty_rows_are_ignored() {
        let text = [
            "1-2\tdel\t_\t_\t_\t_\t_\t_\t_\t_",
            "1\tde\tde\tADP\t_\t_\t2\tcase\t_\t_",
            "2\tel\tel\tDET\t_\t_\t0\troot\t_\t_",
            "2.1\tx\tx\tNOUN\t_\t_\t_\t_\t0:root\t_",
        ];
        let words: Vec<Row> = text
            .iter()
            .enumerate()
            .map(|(i, l)| Row::from_line(i + 1, l).unwrap())
            .collect();
        let tree = Tree::build(&words, true).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.node(1).line, 2);
    }
}
