use conllu_morph::has_value;
use conllu_protocol::{Category, Finding};

use crate::tree::{Node, Tree};

const MARK_CASE: &[&str] = &[
    "advmod", "obl", "goeswith", "fixed", "reparandum", "conj", "cc", "punct",
];
const AUX_COP: &[&str] = &["goeswith", "fixed", "reparandum", "conj", "cc", "punct"];
const CC: &[&str] = &["goeswith", "fixed", "reparandum", "conj", "punct"];
const FIXED: &[&str] = &["goeswith", "reparandum", "conj", "punct"];
const NOTHING: &[&str] = &[];
const PUNCT: &[&str] = &["punct"];

/// Child relations a function word may take, with the test id of the violation.
fn allowed_children(pdeprel: &str) -> Option<(&'static str, &'static [&'static str])> {
    match pdeprel {
        "mark" | "case" => Some(("leaf-mark-case", MARK_CASE)),
        "aux" | "cop" => Some(("leaf-aux-cop", AUX_COP)),
        "cc" => Some(("leaf-cc", CC)),
        "fixed" => Some(("leaf-fixed", FIXED)),
        "goeswith" => Some(("leaf-goeswith", NOTHING)),
        "punct" => Some(("leaf-punct", PUNCT)),
        // det takes only the shared exceptions
        _ => None,
    }
}

fn is_negation(child: &Node<'_>) -> bool {
    child.udeprel() == "advmod"
        && matches!(child.upos, "PART" | "ADV")
        && has_value(child.feats, "Polarity", "Neg")
}

pub fn check_functional_leaves(tree: &Tree<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for parent in tree.words() {
        let pdeprel = parent.udeprel();
        let Some((test_id, allowed)) = allowed_children(pdeprel) else {
            continue;
        };
        let parent_is_nonprojective = !tree.gap(parent.id).is_empty();

        for child in tree.children(parent.id).iter().map(|c| tree.node(*c)) {
            let cdeprel = child.udeprel();

            // 1. Negation may modify any function word except punctuation.
            if pdeprel != "punct" && is_negation(child) {
                continue;
            }

            // 2. Punctuation may follow a nonprojective parent to stay projective itself.
            if parent_is_nonprojective && cdeprel == "punct" {
                continue;
            }

            if !allowed.contains(&cdeprel) {
                findings.push(
                    Finding::new(
                        3,
                        Category::Syntax,
                        test_id,
                        format!(
                            "'{}' not expected to have children ({}:{}:{} --> {}:{}:{})",
                            pdeprel, parent.id, parent.form, pdeprel, child.id, child.form, cdeprel
                        ),
                    )
                    .on_node(parent.id)
                    .at_line(child.line),
                );
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rows, rows_with_feats};

    #[test]
    fn test_case_with_object_child() {
        let words = rows(&[
            (1, "ADP", 3, "case"),
            (2, "NOUN", 1, "obj"),
            (3, "NOUN", 0, "root"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let findings = check_functional_leaves(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "leaf-mark-case");
        assert_eq!(
            findings[0].message,
            "'case' not expected to have children (1:w1:case --> 2:w2:obj)"
        );
        assert_eq!(findings[0].node.as_deref(), Some("1"));
        assert_eq!(findings[0].line, Some(2));
    }

    #[test]
    fn test_negation_under_aux_is_allowed() {
        let words = rows_with_feats(&[
            (1, "PART", "Polarity=Neg", 2, "advmod"),
            (2, "AUX", "_", 3, "aux"),
            (3, "VERB", "_", 0, "root"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        assert!(check_functional_leaves(&tree).is_empty());

        let words = rows_with_feats(&[
            (1, "PART", "_", 2, "advmod"),
            (2, "AUX", "_", 3, "aux"),
            (3, "VERB", "_", 0, "root"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let findings = check_functional_leaves(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "leaf-aux-cop");
    }

    #[test]
    fn test_goeswith_and_punct_leaves() {
        let words = rows(&[
            (1, "NOUN", 0, "root"),
            (2, "X", 1, "goeswith"),
            (3, "X", 2, "goeswith"),
            (4, "PUNCT", 1, "punct"),
            (5, "NOUN", 4, "nmod"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let ids: Vec<String> = check_functional_leaves(&tree)
            .into_iter()
            .map(|f| f.test_id)
            .collect();
        assert_eq!(ids, ["leaf-goeswith", "leaf-punct"]);
    }

    #[test]
    fn test_cc_and_fixed_leaves() {
        let words = rows(&[
            (1, "CCONJ", 3, "cc"),
            (2, "ADV", 1, "advmod"),
            (3, "VERB", 0, "root"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let findings = check_functional_leaves(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "leaf-cc");
        assert_eq!(findings[0].line, Some(2));

        let words = rows(&[
            (1, "ADV", 0, "root"),
            (2, "ADP", 1, "fixed"),
            (3, "ADP", 2, "fixed"),
            (4, "PUNCT", 2, "punct"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let findings = check_functional_leaves(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "leaf-fixed");
        assert_eq!(
            findings[0].message,
            "'fixed' not expected to have children (2:w2:fixed --> 3:w3:fixed)"
        );
    }

    #[test]
    fn test_det_has_no_child_restriction() {
        let words = rows(&[
            (1, "DET", 3, "det"),
            (2, "ADV", 1, "advmod"),
            (3, "NOUN", 0, "root"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        assert!(check_functional_leaves(&tree).is_empty());
    }
}
