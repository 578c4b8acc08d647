pub mod leaves;
pub mod punctuation;
pub mod relations;
pub mod spans;

use conllu_protocol::{Category, Finding};

use crate::tree::{Node, Tree};

/// Universal guideline checks over a built tree.
pub fn check_annotation(tree: &Tree<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();

    // 1. Node-local relation rules
    findings.extend(relations::check_relations(tree));

    // 2. Function words with dependents
    findings.extend(leaves::check_functional_leaves(tree));

    // 3. Contiguity of goeswith and fixed groups
    findings.extend(spans::check_spans(tree));

    // 4. Punctuation and non-projectivity
    findings.extend(punctuation::check_projective_punctuation(tree));

    findings
}

pub(crate) fn syntax_finding(node: &Node<'_>, test_id: impl Into<String>, message: String) -> Finding {
    Finding::new(3, Category::Syntax, test_id, message)
        .on_node(node.id)
        .at_line(node.line)
}

pub(crate) fn child_udeprels<'s>(tree: &Tree<'s>, id: u32) -> Vec<&'s str> {
    tree.children(id)
        .iter()
        .map(|c| tree.node(*c).udeprel())
        .collect()
}
