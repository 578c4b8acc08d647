use conllu_protocol::Finding;

use super::syntax_finding;
use crate::tree::{Node, Tree};

pub fn check_spans(tree: &Tree<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for node in tree.words() {
        findings.extend(check_fixed_span(tree, node));
        findings.extend(check_goeswith_span(tree, node));
    }
    findings
}

fn children_with(tree: &Tree<'_>, id: u32, udeprel: &str) -> Vec<u32> {
    tree.children(id)
        .iter()
        .copied()
        .filter(|c| tree.node(*c).udeprel() == udeprel)
        .collect()
}

/// The node with its `udeprel` children, and the full id range they should cover.
fn group(tree: &Tree<'_>, node: &Node<'_>, udeprel: &str) -> Option<(Vec<u32>, Vec<u32>)> {
    let members = children_with(tree, node.id, udeprel);
    let last = *members.last()?;
    let mut list = vec![node.id];
    list.extend(members);
    list.sort_unstable();
    let range = (node.id..=last).collect();
    Some((list, range))
}

/// Words split by whitespace form a contiguous goeswith group.
pub fn check_goeswith_span(tree: &Tree<'_>, node: &Node<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some((list, range)) = group(tree, node, "goeswith") else {
        return findings;
    };

    if list != range {
        findings.push(syntax_finding(
            node,
            "goeswith-gap",
            format!(
                "Violation of guidelines: gaps in goeswith group {:?} != {:?}.",
                list, range
            ),
        ));
    }

    let glued = list[..list.len() - 1]
        .iter()
        .any(|id| tree.node(*id).misc.space_after_no());
    if glued {
        findings.push(syntax_finding(
            node,
            "goeswith-nospace",
            "'goeswith' cannot connect nodes that are not separated by whitespace".to_string(),
        ));
    }
    findings
}

/// A fixed expression may be interrupted by punctuation only.
pub fn check_fixed_span(tree: &Tree<'_>, node: &Node<'_>) -> Option<Finding> {
    let (list, range) = group(tree, node, "fixed")?;
    let interrupted = range
        .iter()
        .filter(|id| !list.contains(id))
        .any(|id| tree.node(*id).udeprel() != "punct");
    interrupted.then(|| {
        syntax_finding(
            node,
            "fixed-gap",
            format!("Gaps in fixed expression {:?}", list),
        )
    })
}
