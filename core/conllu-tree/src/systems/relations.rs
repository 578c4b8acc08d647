use conllu_protocol::Finding;

use super::{child_udeprels, syntax_finding};
use crate::tree::{Node, Tree};

const LEFT_TO_RIGHT: [&str; 5] = ["conj", "fixed", "flat", "goeswith", "appos"];
const ORPHAN_PARENTS: [&str; 8] = [
    "conj",
    "parataxis",
    "root",
    "csubj",
    "ccomp",
    "advcl",
    "acl",
    "reparandum",
];

pub fn check_relations(tree: &Tree<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for node in tree.words() {
        findings.extend(check_upos_vs_deprel(tree, node));
        findings.extend(check_left_to_right(node));
        findings.extend(check_single_subject(tree, node));
        findings.extend(check_orphan(tree, node));
    }
    findings
}

/// UPOS expected for the node's relation, and the reverse rule for punctuation.
pub fn check_upos_vs_deprel(tree: &Tree<'_>, node: &Node<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    let deprel = node.udeprel();
    let upos = node.upos;
    let childrels = child_udeprels(tree, node.id);
    let has_fixed = childrels.contains(&"fixed");
    let is = |tags: &[&str]| tags.contains(&upos);

    let violation = match deprel {
        "det" if !is(&["DET", "PRON"]) && !has_fixed => {
            Some(format!("'det' should be 'DET' or 'PRON' but it is '{upos}'"))
        }
        "nummod" if !is(&["NUM", "NOUN", "SYM"]) => {
            Some(format!("'nummod' should be 'NUM' but it is '{upos}'"))
        }
        "advmod"
            if !is(&["ADV", "ADJ", "CCONJ", "DET", "PART", "SYM"])
                && !has_fixed
                && !childrels.contains(&"goeswith") =>
        {
            Some(format!("'advmod' should be 'ADV' but it is '{upos}'"))
        }
        "expl" if !is(&["PRON", "DET", "PART"]) => {
            Some(format!("'expl' should normally be 'PRON' but it is '{upos}'"))
        }
        "aux" if upos != "AUX" => Some(format!("'aux' should be 'AUX' but it is '{upos}'")),
        "cop" if !is(&["AUX", "PRON", "DET", "SYM"]) => Some(format!(
            "'cop' should be 'AUX' or 'PRON'/'DET' but it is '{upos}'"
        )),
        "case" if is(&["PROPN", "ADJ", "PRON", "DET", "NUM", "AUX"]) && !has_fixed => {
            Some(format!("'case' should not be '{upos}'"))
        }
        "mark" | "cc"
            if is(&["NOUN", "PROPN", "ADJ", "PRON", "DET", "NUM", "VERB", "AUX", "INTJ"])
                && !has_fixed =>
        {
            Some(format!("'{deprel}' should not be '{upos}'"))
        }
        _ => None,
    };
    if let Some(message) = violation {
        findings.push(syntax_finding(node, format!("rel-upos-{deprel}"), message));
    }

    if node.deprel == "punct" && upos != "PUNCT" {
        findings.push(syntax_finding(
            node,
            "rel-upos-punct",
            format!("'punct' must be 'PUNCT' but it is '{upos}'"),
        ));
    }
    if upos == "PUNCT" && !matches!(deprel, "punct" | "root") {
        findings.push(syntax_finding(
            node,
            "upos-rel-punct",
            format!("'PUNCT' must be 'punct' but it is '{}'", node.deprel),
        ));
    }
    findings
}

/// Coordination, fixed, flat, goeswith and apposition are head-initial.
pub fn check_left_to_right(node: &Node<'_>) -> Option<Finding> {
    let deprel = node.udeprel();
    if LEFT_TO_RIGHT.contains(&deprel) && node.id < node.head {
        return Some(syntax_finding(
            node,
            format!("right-to-left-{deprel}"),
            format!("Relation '{}' must go left-to-right.", node.deprel),
        ));
    }
    None
}

/// Two subjects are tolerated for a nonverbal predicate without copula; three are not.
pub fn check_single_subject(tree: &Tree<'_>, node: &Node<'_>) -> Option<Finding> {
    let subjects: Vec<u32> = tree
        .children(node.id)
        .iter()
        .copied()
        .filter(|c| tree.node(*c).udeprel().contains("subj"))
        .collect();
    if subjects.len() > 2 {
        return Some(syntax_finding(
            node,
            "too-many-subjects",
            format!("Node has more than one subject: {subjects:?}"),
        ));
    }
    None
}

pub fn check_orphan(tree: &Tree<'_>, node: &Node<'_>) -> Option<Finding> {
    if node.udeprel() != "orphan" {
        return None;
    }
    let pdeprel = tree.node(node.head).udeprel();
    if ORPHAN_PARENTS.contains(&pdeprel) {
        return None;
    }
    Some(syntax_finding(
        node,
        "orphan-parent",
        format!("The parent of 'orphan' should normally be 'conj' but it is '{pdeprel}'."),
    ))
}
