use conllu_protocol::Finding;

use super::syntax_finding;
use crate::tree::Tree;

/// Punctuation neither causes nor takes part in crossing edges.
pub fn check_projective_punctuation(tree: &Tree<'_>) -> Vec<Finding> {
    let mut findings = Vec::new();
    for node in tree.words().filter(|n| n.udeprel() == "punct") {
        let caused = tree.caused_nonprojectivities(node.id);
        if !caused.is_empty() {
            findings.push(syntax_finding(
                node,
                "punct-causes-nonproj",
                format!("Punctuation must not cause non-projectivity of nodes {caused:?}"),
            ));
        }

        let gap: Vec<u32> = tree.gap(node.id).into_iter().collect();
        if !gap.is_empty() {
            findings.push(syntax_finding(
                node,
                "punct-is-nonproj",
                format!("Punctuation must not be attached non-projectively over nodes {gap:?}"),
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::rows;

    #[test]
    fn test_bracket_over_clause_is_nonprojective() {
        let words = rows(&[
            (1, "PUNCT", 5, "punct"),
            (2, "PROPN", 3, "nsubj"),
            (3, "VERB", 0, "root"),
            (4, "PROPN", 3, "obj"),
            (5, "PUNCT", 3, "punct"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let findings = check_projective_punctuation(&tree);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].test_id, "punct-is-nonproj");
        assert_eq!(
            findings[0].message,
            "Punctuation must not be attached non-projectively over nodes [2, 3, 4]"
        );
    }

    #[test]
    fn test_punctuation_causing_crossing() {
        let words = rows(&[
            (1, "VERB", 0, "root"),
            (2, "NOUN", 4, "nmod"),
            (3, "PUNCT", 5, "punct"),
            (4, "NOUN", 1, "obj"),
            (5, "NOUN", 1, "obl"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        let ids: Vec<String> = check_projective_punctuation(&tree)
            .into_iter()
            .map(|f| f.test_id)
            .collect();
        assert_eq!(ids, ["punct-causes-nonproj", "punct-is-nonproj"]);
    }

    #[test]
    fn test_projective_sentence_is_clean() {
        let words = rows(&[
            (1, "PRON", 2, "nsubj"),
            (2, "VERB", 0, "root"),
            (3, "PUNCT", 2, "punct"),
        ]);
        let tree = Tree::build(&words, true).unwrap();
        assert!(check_projective_punctuation(&tree).is_empty());
    }
}
