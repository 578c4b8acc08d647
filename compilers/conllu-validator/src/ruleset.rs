//! Permitted-value tables of one language, built once from its documentation.

use std::collections::{BTreeSet, HashMap};

use conllu_protocol::{universal_part, DeprelRecord, FeatureRecord, LanguageData};
use regex::Regex;
use tracing::{info, warn};

/// The 37 universal relations.
pub const UNIVERSAL_DEPRELS: [&str; 37] = [
    "nsubj", "obj", "iobj", "csubj", "ccomp", "xcomp", "obl", "vocative", "expl", "dislocated",
    "advcl", "advmod", "discourse", "aux", "cop", "mark", "nmod", "appos", "nummod", "acl", "amod",
    "det", "clf", "case", "conj", "cc", "fixed", "flat", "compound", "list", "parataxis", "orphan",
    "goeswith", "reparandum", "punct", "root", "dep",
];

pub fn is_universal_deprel(label: &str) -> bool {
    UNIVERSAL_DEPRELS.contains(&label)
}

/// Outcome of looking a relation label up in a ruleset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStatus {
    Permitted,
    /// Documented for the language but switched off.
    NotPermitted,
    /// Universal base with an undocumented subtype.
    UnknownSubtype,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct LanguageRuleset {
    code: String,
    has_data: bool,
    features: HashMap<String, FeatureRecord>,
    deprels: HashMap<String, DeprelRecord>,
    permitted_deprels: BTreeSet<String>,
    edeprels: BTreeSet<String>,
    tokens_with_space: Vec<Regex>,
    auxiliaries: BTreeSet<String>,
    copulas: BTreeSet<String>,
    feature_notice: String,
    deprel_notice: String,
}

impl LanguageRuleset {
    /// Ruleset for `code`; a language without documentation gets empty tables.
    pub fn new(code: &str, data: Option<LanguageData>) -> Self {
        let has_data = data.is_some();
        let data = data.unwrap_or_default();
        if !has_data && code != "ud" {
            warn!(lang = code, "no documentation for language; its tables are empty");
        }

        // 1. Relations: `ud` means exactly the universal inventory
        let deprels: HashMap<String, DeprelRecord> = data
            .deprels
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        let permitted_deprels: BTreeSet<String> = if code == "ud" {
            UNIVERSAL_DEPRELS.iter().map(|d| d.to_string()).collect()
        } else {
            deprels
                .values()
                .filter(|r| r.permitted)
                .map(|r| r.name.clone())
                .collect()
        };

        // 2. Enhanced relations extend the basic ones
        let mut edeprels = permitted_deprels.clone();
        edeprels.insert("ref".to_string());
        edeprels.extend(UNIVERSAL_DEPRELS.iter().map(|d| d.to_string()));
        edeprels.extend(data.edeprels);

        // 3. Whitespace exceptions must match the whole value
        let tokens_with_space = data
            .tokens_with_space
            .iter()
            .filter_map(|pattern| match Regex::new(&format!("^(?:{})$", pattern)) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!(lang = code, pattern = pattern.as_str(), %err, "skipping invalid token-with-space pattern");
                    None
                }
            })
            .collect();

        // 4. Auxiliaries and copulas
        let auxiliaries = data
            .auxiliaries
            .iter()
            .filter(|a| a.is_auxiliary())
            .map(|a| a.lemma.clone())
            .collect();
        let copulas = data
            .auxiliaries
            .iter()
            .filter(|a| a.is_copula())
            .map(|a| a.lemma.clone())
            .collect();

        let features: HashMap<String, FeatureRecord> = data
            .features
            .into_iter()
            .map(|f| (f.name.clone(), f))
            .collect();

        let mut ruleset = Self {
            code: code.to_string(),
            has_data,
            features,
            deprels,
            permitted_deprels,
            edeprels,
            tokens_with_space,
            auxiliaries,
            copulas,
            feature_notice: String::new(),
            deprel_notice: String::new(),
        };
        ruleset.feature_notice = ruleset.build_feature_notice();
        ruleset.deprel_notice = ruleset.build_deprel_notice();
        info!(
            lang = code,
            features = ruleset.features.len(),
            deprels = ruleset.permitted_deprels.len(),
            "loaded language ruleset"
        );
        ruleset
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn has_data(&self) -> bool {
        self.has_data
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureRecord> {
        self.features.get(name)
    }

    pub fn deprel_status(&self, label: &str) -> LabelStatus {
        if self.permitted_deprels.contains(label) {
            return LabelStatus::Permitted;
        }
        self.unlisted_status(label)
    }

    pub fn edeprel_status(&self, label: &str) -> LabelStatus {
        if self.edeprels.contains(label) {
            return LabelStatus::Permitted;
        }
        self.unlisted_status(label)
    }

    fn unlisted_status(&self, label: &str) -> LabelStatus {
        if self.deprels.contains_key(label) {
            return LabelStatus::NotPermitted;
        }
        let base = universal_part(label);
        if base != label && (is_universal_deprel(base) || self.permitted_deprels.contains(base)) {
            LabelStatus::UnknownSubtype
        } else {
            LabelStatus::Unknown
        }
    }

    pub fn admits_token_with_space(&self, value: &str) -> bool {
        self.tokens_with_space.iter().any(|re| re.is_match(value))
    }

    pub fn has_auxiliaries(&self) -> bool {
        !self.auxiliaries.is_empty()
    }

    pub fn is_auxiliary(&self, lemma: &str) -> bool {
        self.auxiliaries.contains(lemma)
    }

    pub fn has_copulas(&self) -> bool {
        !self.copulas.is_empty()
    }

    pub fn is_copula(&self, lemma: &str) -> bool {
        self.copulas.contains(lemma)
    }

    /// Long explanation attached to the first unknown feature of a run.
    pub fn feature_notice(&self) -> &str {
        &self.feature_notice
    }

    /// Long explanation attached to the first unknown relation of a run.
    pub fn deprel_notice(&self) -> &str {
        &self.deprel_notice
    }

    fn build_feature_notice(&self) -> String {
        let code = &self.code;
        if !self.has_data {
            return format!(
                "No feature-value pairs have been permitted for language [{code}].\n\
                 They can be permitted at the address below (if the language has an ISO code and is registered with UD):\n\
                 https://quest.ms.mff.cuni.cz/udvalidator/cgi-bin/unidep/langspec/specify_feature.pl\n"
            );
        }
        let mut msg = String::new();
        let mut names: Vec<&String> = self.features.keys().collect();
        names.sort();
        for name in &names {
            for error in &self.features[*name].errors {
                msg.push_str(&format!("ERROR in _{code}/feat/{name}.md: {error}\n"));
            }
        }
        let permitted: BTreeSet<String> = self
            .features
            .values()
            .filter(|f| f.permitted)
            .flat_map(|f| {
                f.uvalues
                    .iter()
                    .chain(&f.lvalues)
                    .map(move |v| format!("{}={}", f.name, v))
            })
            .collect();
        msg.push_str(&format!(
            "The following {} feature values are currently permitted in language [{code}]:\n",
            permitted.len()
        ));
        msg.push_str(&permitted.into_iter().collect::<Vec<_>>().join(", "));
        msg.push_str(
            "\nIf a language needs a feature that is not documented in the universal guidelines, the feature must\n\
             have a language-specific documentation page in a prescribed format.\n\
             See https://universaldependencies.org/contributing_language_specific.html for further guidelines.\n\
             All features including universal must be specifically turned on for each language in which they are used.\n\
             See https://quest.ms.mff.cuni.cz/udvalidator/cgi-bin/unidep/langspec/specify_feature.pl for details.\n",
        );
        msg
    }

    fn build_deprel_notice(&self) -> String {
        let code = &self.code;
        if self.permitted_deprels.is_empty() {
            return format!(
                "No dependency relation types have been permitted for language [{code}].\n\
                 They can be permitted at the address below (if the language has an ISO code and is registered with UD):\n\
                 https://quest.ms.mff.cuni.cz/udvalidator/cgi-bin/unidep/langspec/specify_deprel.pl\n"
            );
        }
        let mut msg = String::new();
        let mut names: Vec<&String> = self.deprels.keys().collect();
        names.sort();
        for name in names {
            let file = match name.replace(':', "-") {
                f if f == "aux" => "aux_".to_string(),
                f => f,
            };
            for error in &self.deprels[name].errors {
                msg.push_str(&format!("ERROR in _{code}/dep/{file}.md: {error}\n"));
            }
        }
        msg.push_str(&format!(
            "The following {} relations are currently permitted in language [{code}]:\n",
            self.permitted_deprels.len()
        ));
        msg.push_str(&self.permitted_deprels.iter().cloned().collect::<Vec<_>>().join(", "));
        msg.push_str(
            "\nIf a language needs a relation subtype that is not documented in the universal guidelines, the relation\n\
             must have a language-specific documentation page in a prescribed format.\n\
             See https://universaldependencies.org/contributing_language_specific.html for further guidelines.\n\
             Documented dependency relations can be specifically turned on/off for each language in which they are used.\n\
             See https://quest.ms.mff.cuni.cz/udvalidator/cgi-bin/unidep/langspec/specify_deprel.pl for details.\n",
        );
        msg
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use conllu_protocol::{AuxiliaryRecord, DeprelKind};

    pub(crate) fn latin() -> LanguageData {
        let deprel = |name: &str, kind, permitted| DeprelRecord {
            name: name.to_string(),
            kind,
            permitted,
            errors: vec![],
        };
        LanguageData {
            code: "la".to_string(),
            features: vec![
                FeatureRecord {
                    name: "Case".to_string(),
                    permitted: true,
                    uvalues: vec!["Acc".to_string(), "Nom".to_string()],
                    lvalues: vec![],
                    unused_uvalues: vec!["Voc".to_string()],
                    unused_lvalues: vec![],
                    by_upos: vec![(
                        "NOUN".to_string(),
                        vec![("Nom".to_string(), true), ("Acc".to_string(), true), ("Voc".to_string(), false)],
                    )],
                    errors: vec![],
                },
                FeatureRecord {
                    name: "Typo".to_string(),
                    permitted: false,
                    uvalues: vec!["Yes".to_string()],
                    lvalues: vec![],
                    unused_uvalues: vec![],
                    unused_lvalues: vec![],
                    by_upos: vec![],
                    errors: vec![],
                },
            ],
            deprels: vec![
                deprel("nsubj", DeprelKind::Global, true),
                deprel("root", DeprelKind::Global, true),
                deprel("obl:arg", DeprelKind::Global, true),
                deprel("nmod:poss", DeprelKind::Global, false),
            ],
            edeprels: vec!["obl:in".to_string()],
            tokens_with_space: vec!["res publica".to_string(), "[".to_string()],
            auxiliaries: vec![
                AuxiliaryRecord {
                    lemma: "sum".to_string(),
                    functions: vec!["cop.AUX".to_string()],
                },
                AuxiliaryRecord {
                    lemma: "hic".to_string(),
                    functions: vec!["cop.PRON".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_relation_lookup() {
        let ruleset = LanguageRuleset::new("la", Some(latin()));
        assert_eq!(ruleset.deprel_status("obl:arg"), LabelStatus::Permitted);
        assert_eq!(ruleset.deprel_status("nmod:poss"), LabelStatus::NotPermitted);
        assert_eq!(ruleset.deprel_status("obl:xyz"), LabelStatus::UnknownSubtype);
        assert_eq!(ruleset.deprel_status("blah"), LabelStatus::Unknown);
        assert_eq!(ruleset.deprel_status("obj"), LabelStatus::Unknown);

        assert_eq!(ruleset.edeprel_status("ref"), LabelStatus::Permitted);
        assert_eq!(ruleset.edeprel_status("obl:in"), LabelStatus::Permitted);
        assert_eq!(ruleset.edeprel_status("obj"), LabelStatus::Permitted);
        assert_eq!(ruleset.edeprel_status("obl:de"), LabelStatus::UnknownSubtype);
    }

    #[test]
    fn test_universal_ruleset() {
        let ruleset = LanguageRuleset::new("ud", None);
        assert!(!ruleset.has_data());
        assert_eq!(ruleset.deprel_status("obj"), LabelStatus::Permitted);
        assert_eq!(ruleset.deprel_status("obj:x"), LabelStatus::UnknownSubtype);
        assert!(ruleset.feature("Case").is_none());
        assert!(ruleset
            .feature_notice()
            .starts_with("No feature-value pairs have been permitted for language [ud]."));
        assert!(ruleset.deprel_notice().contains("The following 37 relations"));
    }

    #[test]
    fn test_lemma_lists_and_spaces() {
        let ruleset = LanguageRuleset::new("la", Some(latin()));
        assert!(ruleset.is_auxiliary("sum"));
        assert!(!ruleset.is_auxiliary("hic"));
        assert!(ruleset.is_copula("hic"));
        assert!(ruleset.admits_token_with_space("res publica"));
        assert!(!ruleset.admits_token_with_space("res publica x"));
        assert!(ruleset
            .feature_notice()
            .contains("The following 2 feature values are currently permitted in language [la]:\nCase=Acc, Case=Nom\n"));
    }
}
