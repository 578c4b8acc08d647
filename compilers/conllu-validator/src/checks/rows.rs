//! Level 2 and level 4 checks of a single row.

use std::sync::OnceLock;

use conllu_morph::{format_issues, pairs};
use conllu_protocol::{universal_part, Category, Column, Finding, Reporter, Row, Upos};
use regex::Regex;

use crate::config::DeprelLanguagePolicy;
use crate::resolver::Resolved;
use crate::ruleset::{is_universal_deprel, LabelStatus, LanguageRuleset};

fn upos_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]+$").expect("pattern is valid"))
}

fn deprel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z]+(:[a-z]+)?$").expect("pattern is valid"))
}

fn edeprel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[a-z]+(:[a-z]+)?(:[\p{Ll}\p{Lm}\p{Lo}\p{M}]+(_[\p{Ll}\p{Lm}\p{Lo}\p{M}]+)*)?(:[a-z]+)?$",
        )
        .expect("pattern is valid")
    })
}

/// What a row is checked against.
pub struct RowEnv<'a> {
    pub level: u8,
    pub policy: DeprelLanguagePolicy,
    pub primary: &'a LanguageRuleset,
    /// Ruleset selected by the row's `Lang=` attribute.
    pub token: &'a Resolved,
}

impl RowEnv<'_> {
    fn label_status(&self, lookup: impl Fn(&LanguageRuleset) -> LabelStatus) -> LabelStatus {
        let primary = lookup(self.primary);
        match self.policy {
            DeprelLanguagePolicy::Primary => primary,
            DeprelLanguagePolicy::Token => lookup(self.token.ruleset.as_ref()),
            DeprelLanguagePolicy::Union => match lookup(self.token.ruleset.as_ref()) {
                LabelStatus::Permitted => LabelStatus::Permitted,
                _ => primary,
            },
        }
    }

    fn label_lang(&self) -> &str {
        match self.policy {
            DeprelLanguagePolicy::Token => self.token.lang(),
            _ => self.primary.code(),
        }
    }
}

fn row_finding(row: &Row, level: u8, category: Category, test_id: &str, message: String) -> Finding {
    Finding::new(level, category, test_id, message).at_line(row.line())
}

/// Appends a long-form notice to the first finding of its kind in the run.
fn with_notice(mut finding: Finding, key: &str, notice: &str, notices: &mut Reporter) -> Finding {
    if !notice.is_empty() && notices.take_notice(key) {
        finding.message.push_str("\n\n");
        finding.message.push_str(notice);
    }
    finding
}

pub fn check_row(row: &Row, env: &RowEnv<'_>, notices: &mut Reporter) -> Vec<Finding> {
    let mut findings = Vec::new();
    let Some(id) = row.id() else {
        return findings;
    };

    // 1. Shape of word and empty node rows
    if !id.is_range() {
        findings.extend(check_character_constraints(row));
        findings.extend(check_upos(row));
        findings.extend(check_features(row, env, notices));
    } else {
        findings.extend(check_mwt_empty_values(row));
    }

    // 2. Relation inventories
    if id.is_word() {
        findings.extend(check_deprel(row, env, notices));
    } else if id.is_empty_node() {
        findings.extend(check_empty_node_empty_values(row));
    }
    if !id.is_range() {
        findings.extend(check_deps_labels(row, env));
    }

    // 3. Language-specific whitespace exceptions
    if env.level > 3 {
        findings.extend(check_whitespace(row, env.primary));
    }
    findings
}

pub fn check_mwt_empty_values(row: &Row) -> Vec<Finding> {
    [Column::Lemma, Column::Upos, Column::Xpos, Column::Feats, Column::Head, Column::Deprel, Column::Deps]
        .into_iter()
        .filter(|c| row.get(*c) != "_")
        .map(|c| {
            row_finding(
                row,
                2,
                Category::Format,
                "mwt-nonempty-field",
                format!(
                    "A multi-word token line must have '_' in the column {}. Now: '{}'.",
                    c,
                    row.get(c)
                ),
            )
        })
        .collect()
}

pub fn check_empty_node_empty_values(row: &Row) -> Vec<Finding> {
    [Column::Head, Column::Deprel]
        .into_iter()
        .filter(|c| row.get(*c) != "_")
        .map(|c| {
            row_finding(
                row,
                2,
                Category::Format,
                "empty-node-nonempty-field",
                format!(
                    "An empty node must have '_' in the column {}. Now: '{}'.",
                    c,
                    row.get(c)
                ),
            )
        })
        .collect()
}

pub fn check_character_constraints(row: &Row) -> Vec<Finding> {
    let mut findings = Vec::new();
    let empty = row.is_empty_node();

    if !(upos_re().is_match(row.upos()) || (empty && row.upos() == "_")) {
        findings.push(row_finding(
            row,
            2,
            Category::Morpho,
            "invalid-upos",
            format!("Invalid UPOS value '{}'.", row.upos()),
        ));
    }
    if !(deprel_re().is_match(row.deprel()) || (empty && row.deprel() == "_")) {
        findings.push(row_finding(
            row,
            2,
            Category::Syntax,
            "invalid-deprel",
            format!("Invalid DEPREL value '{}'.", row.deprel()),
        ));
    }
    match row.enhanced_heads() {
        Err(_) => findings.push(row_finding(
            row,
            2,
            Category::Enhanced,
            "invalid-deps",
            format!("Failed to parse DEPS: '{}'.", row.raw_deps()),
        )),
        Ok(deps) => {
            if deps.iter().any(|(_, rel)| !edeprel_re().is_match(rel)) {
                findings.push(row_finding(
                    row,
                    2,
                    Category::Enhanced,
                    "invalid-edeprel",
                    format!("Invalid enhanced relation type: '{}'.", row.raw_deps()),
                ));
            }
        }
    }
    findings
}

/// Only well-shaped tags are looked up; malformed ones are `invalid-upos`.
pub fn check_upos(row: &Row) -> Option<Finding> {
    let upos = row.upos();
    if (row.is_empty_node() && upos == "_") || !upos_re().is_match(upos) {
        return None;
    }
    upos.parse::<Upos>().is_err().then(|| {
        row_finding(
            row,
            2,
            Category::Morpho,
            "unknown-upos",
            format!("Unknown UPOS tag: '{}'.", upos),
        )
    })
}

pub fn check_features(row: &Row, env: &RowEnv<'_>, notices: &mut Reporter) -> Vec<Finding> {
    // 1. Format (level 2)
    let mut findings: Vec<Finding> = format_issues(row.feats())
        .into_iter()
        .map(|issue| issue.into_finding().at_line(row.line()))
        .collect();
    if env.level < 4 {
        return findings;
    }

    // 2. Membership (level 4), in the token's language
    let ruleset = &env.token.ruleset;
    let lang = ruleset.code();
    let upos = row.upos();
    for (name, value) in pairs(row.feats()) {
        let issue = match ruleset.feature(name) {
            None => Some((
                "feature-unknown",
                format!("Feature {} is not documented for language [{}].", name, lang),
            )),
            Some(record) if !record.permitted => Some((
                "feature-not-permitted",
                format!("Feature {} is not permitted in language [{}].", name, lang),
            )),
            Some(record) => {
                let documented = record
                    .uvalues
                    .iter()
                    .chain(&record.lvalues)
                    .chain(&record.unused_uvalues)
                    .chain(&record.unused_lvalues)
                    .any(|v| v == value);
                let by_upos = record
                    .by_upos
                    .iter()
                    .find(|(tag, _)| tag == upos)
                    .map(|(_, values)| values);
                if !documented {
                    Some((
                        "feature-value-unknown",
                        format!(
                            "Value {} is not documented for feature {} in language [{}].",
                            value, name, lang
                        ),
                    ))
                } else if let Some(values) = by_upos {
                    let permitted = values.iter().any(|(v, ok)| v == value && *ok);
                    (!permitted).then(|| {
                        (
                            "feature-value-upos-not-permitted",
                            format!(
                                "Value {} of feature {} is not permitted with UPOS {} in language [{}].",
                                value, name, upos, lang
                            ),
                        )
                    })
                } else {
                    Some((
                        "feature-upos-not-permitted",
                        format!(
                            "Feature {} is not permitted with UPOS {} in language [{}].",
                            name, upos, lang
                        ),
                    ))
                }
            }
        };
        if let Some((test_id, message)) = issue {
            let finding = row_finding(row, 4, Category::Morpho, test_id, message);
            findings.push(if env.token.switched {
                finding
            } else {
                with_notice(finding, "feats", env.primary.feature_notice(), notices)
            });
        }
    }
    findings
}

pub fn check_deprel(row: &Row, env: &RowEnv<'_>, notices: &mut Reporter) -> Option<Finding> {
    let deprel = row.deprel();
    let notice = |finding: Finding, notices: &mut Reporter| {
        with_notice(finding, "deprels", env.primary.deprel_notice(), notices)
    };

    // Universal part only, below level 4
    if env.level < 4 {
        if is_universal_deprel(universal_part(deprel)) {
            return None;
        }
        let finding = row_finding(
            row,
            2,
            Category::Syntax,
            "unknown-deprel",
            format!("Unknown DEPREL label: '{}'", deprel),
        );
        return Some(notice(finding, notices));
    }

    let lang = env.label_lang();
    let (test_id, message) = match env.label_status(|r| r.deprel_status(deprel)) {
        LabelStatus::Permitted => return None,
        LabelStatus::Unknown => ("unknown-deprel", format!("Unknown DEPREL label: '{}'", deprel)),
        LabelStatus::NotPermitted => (
            "deprel-not-permitted",
            format!(
                "DEPREL label '{}' is documented but not permitted in language [{}].",
                deprel, lang
            ),
        ),
        LabelStatus::UnknownSubtype => (
            "unknown-deprel-subtype",
            format!(
                "Unknown subtype of DEPREL '{}' in language [{}]: '{}'",
                universal_part(deprel),
                lang,
                deprel
            ),
        ),
    };
    let finding = row_finding(row, 4, Category::Syntax, test_id, message);
    Some(notice(finding, notices))
}

pub fn check_deps_labels(row: &Row, env: &RowEnv<'_>) -> Vec<Finding> {
    let raw = row.raw_deps();
    if raw == "_" {
        return Vec::new();
    }
    let level = if env.level < 4 { 2 } else { 4 };
    let mut findings = Vec::new();

    for pair in raw.split('|') {
        let Some((_, rel)) = pair.split_once(':') else {
            findings.push(row_finding(
                row,
                level,
                Category::Enhanced,
                "invalid-head-deprel",
                format!("Malformed head:deprel pair '{}'.", pair),
            ));
            continue;
        };

        let issue = if env.level < 4 {
            let base = universal_part(rel);
            (!is_universal_deprel(base) && base != "ref").then(|| {
                (
                    "unknown-edeprel",
                    format!("Unknown enhanced relation type '{}' in '{}'", base, pair),
                )
            })
        } else {
            match env.label_status(|r| r.edeprel_status(rel)) {
                LabelStatus::Permitted => None,
                LabelStatus::Unknown => Some((
                    "unknown-edeprel",
                    format!("Unknown enhanced relation type '{}' in '{}'", rel, pair),
                )),
                LabelStatus::NotPermitted => Some((
                    "unpermitted-edeprel",
                    format!(
                        "Enhanced relation type '{}' is not permitted in language [{}]: '{}'",
                        rel,
                        env.label_lang(),
                        pair
                    ),
                )),
                LabelStatus::UnknownSubtype => Some((
                    "unknown-edeprel-subtype",
                    format!(
                        "Unknown subtype of enhanced relation '{}' in '{}'",
                        universal_part(rel),
                        pair
                    ),
                )),
            }
        };
        if let Some((test_id, message)) = issue {
            findings.push(row_finding(row, level, Category::Enhanced, test_id, message));
        }
    }
    findings
}

pub fn check_whitespace(row: &Row, ruleset: &LanguageRuleset) -> Vec<Finding> {
    [Column::Form, Column::Lemma]
        .into_iter()
        .filter(|c| {
            let value = row.get(*c);
            value.contains(char::is_whitespace) && !ruleset.admits_token_with_space(value)
        })
        .map(|c| {
            row_finding(
                row,
                4,
                Category::Format,
                "invalid-word-with-space",
                format!(
                    "'{}' in column {} is not on the list of exceptions allowed to contain whitespace (data/tokens_w_space.LANG files).",
                    row.get(c),
                    c
                ),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::tests::latin;
    use std::sync::Arc;

    struct Fixture {
        primary: Arc<LanguageRuleset>,
        token: Resolved,
    }

    impl Fixture {
        fn new(lang: &str) -> Self {
            let data = (lang == "la").then(latin);
            let primary = Arc::new(LanguageRuleset::new(lang, data));
            let token = Resolved {
                ruleset: Arc::clone(&primary),
                switched: false,
            };
            Self { primary, token }
        }

        fn env(&self, level: u8) -> RowEnv<'_> {
            RowEnv {
                level,
                policy: DeprelLanguagePolicy::Primary,
                primary: &self.primary,
                token: &self.token,
            }
        }
    }

    fn row(text: &str) -> Row {
        Row::from_line(7, text).unwrap()
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.test_id.as_str()).collect()
    }

    #[test]
    fn test_clean_word_at_level_2() {
        let fixture = Fixture::new("ud");
        let mut reporter = Reporter::new();
        let r = row("1\tHe\the\tPRON\t_\tCase=Nom|Person=3\t2\tnsubj\t2:nsubj\t_");
        assert!(check_row(&r, &fixture.env(2), &mut reporter).is_empty());
    }

    #[test]
    fn test_placeholder_columns() {
        let fixture = Fixture::new("ud");
        let mut reporter = Reporter::new();
        let mwt = row("1-2\tdel\tde\t_\t_\t_\t_\t_\t_\t_");
        let findings = check_row(&mwt, &fixture.env(2), &mut reporter);
        assert_eq!(ids(&findings), ["mwt-nonempty-field"]);
        assert_eq!(
            findings[0].message,
            "A multi-word token line must have '_' in the column LEMMA. Now: 'de'."
        );

        let empty = row("1.1\tx\tx\t_\t_\t_\t1\tdep\t1:dep\t_");
        let findings = check_row(&empty, &fixture.env(2), &mut reporter);
        assert_eq!(ids(&findings), ["empty-node-nonempty-field", "empty-node-nonempty-field"]);
    }

    #[test]
    fn test_character_constraints() {
        let r = row("1\tx\tx\tnoun\t_\t_\t0\tRoot\t0:root|1\t_");
        assert_eq!(
            ids(&check_character_constraints(&r)),
            ["invalid-upos", "invalid-deprel", "invalid-deps"]
        );
        let r = row("1\tx\tx\tNOUN\t_\t_\t0\troot\t0:Root\t_");
        assert_eq!(ids(&check_character_constraints(&r)), ["invalid-edeprel"]);
        let r = row("1\tx\tx\tNOUN\t_\t_\t0\troot\t0:obl:při_příležitosti\t_");
        assert!(check_character_constraints(&r).is_empty());
    }

    #[test]
    fn test_unknown_upos_only_for_valid_shape() {
        assert_eq!(check_upos(&row("1\tx\tx\tFOO\t_\t_\t0\troot\t_\t_")).unwrap().message, "Unknown UPOS tag: 'FOO'.");
        assert!(check_upos(&row("1\tx\tx\tfoo\t_\t_\t0\troot\t_\t_")).is_none());
        assert!(check_upos(&row("1.1\tx\tx\t_\t_\t_\t_\t_\t_\t_")).is_none());
    }

    #[test]
    fn test_feature_membership_and_notice() {
        let fixture = Fixture::new("la");
        let mut reporter = Reporter::new();
        let env = fixture.env(4);

        let r = row("1\tx\tx\tNOUN\t_\tCase=Voc|Gender=Masc\t0\troot\t_\t_");
        let findings = check_features(&r, &env, &mut reporter);
        assert_eq!(ids(&findings), ["feature-value-upos-not-permitted", "feature-unknown"]);
        assert_eq!(findings[0].level, 4);
        assert!(findings[0].message.contains("The following 2 feature values"));
        assert_eq!(
            findings[1].message,
            "Feature Gender is not documented for language [la]."
        );

        let r = row("1\tx\tx\tVERB\t_\tCase=Gen\t0\troot\t_\t_");
        let findings = check_features(&r, &env, &mut reporter);
        assert_eq!(ids(&findings), ["feature-value-unknown"]);

        let r = row("1\tx\tx\tVERB\t_\tCase=Nom\t0\troot\t_\t_");
        assert_eq!(ids(&check_features(&r, &env, &mut reporter)), ["feature-upos-not-permitted"]);

        let r = row("1\tx\tx\tNOUN\t_\tCase=Nom|Typo=Yes\t0\troot\t_\t_");
        let findings = check_features(&r, &env, &mut reporter);
        assert_eq!(ids(&findings), ["feature-not-permitted"]);
        assert_eq!(findings[0].message, "Feature Typo is not permitted in language [la].");
    }

    #[test]
    fn test_deprel_membership_by_level() {
        let fixture = Fixture::new("la");
        let mut reporter = Reporter::new();
        let r = row("1\tx\tx\tNOUN\t_\t_\t0\tnmod:poss\t_\t_");
        assert!(check_deprel(&r, &fixture.env(3), &mut reporter).is_none());
        let finding = check_deprel(&r, &fixture.env(4), &mut reporter).unwrap();
        assert_eq!(finding.test_id, "deprel-not-permitted");
        assert!(finding.message.contains("relations are currently permitted"));

        let r = row("1\tx\tx\tNOUN\t_\t_\t0\tobl:xyz\t_\t_");
        let finding = check_deprel(&r, &fixture.env(4), &mut reporter).unwrap();
        assert_eq!(finding.test_id, "unknown-deprel-subtype");
        assert!(!finding.message.contains("currently permitted"));

        let r = row("1\tx\tx\tNOUN\t_\t_\t0\tfoo\t_\t_");
        assert_eq!(check_deprel(&r, &fixture.env(2), &mut reporter).unwrap().test_id, "unknown-deprel");
    }

    #[test]
    fn test_deprel_policy_for_code_switched_tokens() {
        let ud = Arc::new(LanguageRuleset::new("ud", None));
        let token = Resolved {
            ruleset: Arc::new(LanguageRuleset::new("la", Some(latin()))),
            switched: true,
        };
        let r = row("1\tx\tx\tNOUN\t_\t_\t0\tobl:arg\t_\tLang=la");
        let mut reporter = Reporter::new();
        let mut env = RowEnv {
            level: 4,
            policy: DeprelLanguagePolicy::Primary,
            primary: &ud,
            token: &token,
        };
        assert_eq!(
            check_deprel(&r, &env, &mut reporter).unwrap().test_id,
            "unknown-deprel-subtype"
        );
        env.policy = DeprelLanguagePolicy::Union;
        assert!(check_deprel(&r, &env, &mut reporter).is_none());
        env.policy = DeprelLanguagePolicy::Token;
        assert!(check_deprel(&r, &env, &mut reporter).is_none());
    }

    #[test]
    fn test_deps_labels() {
        let fixture = Fixture::new("la");
        let r = row("2\tx\tx\tNOUN\t_\t_\t1\tnsubj\t1:nsubj|1:nmod:poss|1:ref|1:foo\t_");
        let findings = check_deps_labels(&r, &fixture.env(4));
        assert_eq!(ids(&findings), ["unpermitted-edeprel", "unknown-edeprel"]);

        let findings = check_deps_labels(&r, &fixture.env(2));
        assert_eq!(ids(&findings), ["unknown-edeprel"]);
        assert_eq!(findings[0].message, "Unknown enhanced relation type 'foo' in '1:foo'");
        assert_eq!(findings[0].level, 2);

        let r = row("2\tx\tx\tNOUN\t_\t_\t1\tnsubj\t1:obl:de|1:obl:in\t_");
        let findings = check_deps_labels(&r, &fixture.env(4));
        assert_eq!(ids(&findings), ["unknown-edeprel-subtype"]);
        assert_eq!(findings[0].message, "Unknown subtype of enhanced relation 'obl' in '1:obl:de'");
        assert_eq!(findings[0].level, 4);

        let r = row("2\tx\tx\tNOUN\t_\t_\t1\tnsubj\t1nsubj\t_");
        assert_eq!(ids(&check_deps_labels(&r, &fixture.env(2))), ["invalid-head-deprel"]);
    }

    #[test]
    fn test_words_with_spaces() {
        let fixture = Fixture::new("la");
        let r = row("1\tres publica\tres publica\tNOUN\t_\t_\t0\troot\t_\t_");
        assert!(check_whitespace(&r, &fixture.primary).is_empty());

        let r = row("1\tres  publica\tres publica\tNOUN\t_\t_\t0\troot\t_\t_");
        let findings = check_whitespace(&r, &fixture.primary);
        assert_eq!(ids(&findings), ["invalid-word-with-space"]);
        assert_eq!(findings[0].line, Some(7));
    }
}
