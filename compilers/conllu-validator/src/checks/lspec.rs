//! Level 5: lemmas of auxiliaries and copulas.

use conllu_protocol::{Category, Finding, Row};

use crate::resolver::RulesetResolver;

pub fn check_lspec(rows: &[Row], resolver: &mut RulesetResolver) -> Vec<Finding> {
    let mut findings = Vec::new();
    for row in rows.iter().filter(|r| r.is_word() && r.lemma() != "_") {
        let is_aux = row.upos() == "AUX";
        let is_cop = row.deprel() == "cop";
        if !is_aux && !is_cop {
            continue;
        }
        let resolved = resolver.resolve(row.misc());
        let ruleset = &resolved.ruleset;
        let lemma = row.lemma();

        if is_aux && !ruleset.is_auxiliary(lemma) {
            let mut message = format!("'{}' is not an auxiliary verb in language [{}]", lemma, ruleset.code());
            if !ruleset.has_auxiliaries() {
                message.push_str(" (there are no known approved auxiliaries in this language)");
            }
            findings.push(
                Finding::new(5, Category::Morpho, "aux-lemma", message)
                    .on_node(row.raw_id())
                    .at_line(row.line()),
            );
        }
        if is_cop && !ruleset.is_copula(lemma) {
            let mut message = format!("'{}' is not a copula in language [{}]", lemma, ruleset.code());
            if !ruleset.has_copulas() {
                message.push_str(" (there are no known approved copulas in this language)");
            }
            findings.push(
                Finding::new(5, Category::Syntax, "cop-lemma", message)
                    .on_node(row.raw_id())
                    .at_line(row.line()),
            );
        }
    }
    findings
}
