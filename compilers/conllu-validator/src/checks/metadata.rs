//! Sentence metadata: `sent_id`, `text`, `newdoc` and `newpar` comments.

use std::collections::HashSet;

use conllu_parser::{classify, Comment};
use conllu_protocol::{Category, Finding, NodeId, Row};

fn metadata(test_id: &str, message: impl Into<String>) -> Finding {
    Finding::new(2, Category::Metadata, test_id, message)
}

pub fn check_sent_id(comments: &[String], known_ids: &mut HashSet<String>, lang: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut matched = Vec::new();

    for comment in comments {
        match classify(comment) {
            Comment::SentId(id) => matched.push(id),
            Comment::MalformedSentId => findings.push(metadata(
                "invalid-sent-id",
                format!(
                    "Spurious sent_id line: '{}' Should look like '# sent_id = xxxxx' where xxxxx is not whitespace. Forward slash reserved for special purposes.",
                    comment
                ),
            )),
            _ => {}
        }
    }

    match matched.as_slice() {
        [] => findings.push(metadata("missing-sent-id", "Missing the sent_id attribute.")),
        [sid] => {
            if known_ids.contains(*sid) {
                findings.push(metadata(
                    "non-unique-sent-id",
                    format!("Non-unique sent_id attribute '{}'.", sid),
                ));
            }
            let slashes = sid.matches('/').count();
            if slashes > 1 || (slashes == 1 && lang != "ud" && lang != "shopen") {
                findings.push(metadata(
                    "slash-in-sent-id",
                    format!(
                        "The forward slash is reserved for special use in parallel treebanks: '{}'",
                        sid
                    ),
                ));
            }
            known_ids.insert(sid.to_string());
        }
        _ => findings.push(metadata("multiple-sent-id", "Multiple sent_id attributes.")),
    }
    findings
}

#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    /// Compare the `text` attribute against the concatenated FORMs.
    pub check_tree_text: bool,
    pub check_space_after: bool,
}

pub fn check_text_meta(
    comments: &[String],
    rows: &[Row],
    options: TextOptions,
    spaceafterno_in_effect: &mut bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let (mut newdocs, mut newpars) = (0, 0);
    let mut texts = Vec::new();
    for comment in comments {
        match classify(comment) {
            Comment::NewDoc => newdocs += 1,
            Comment::NewPar => newpars += 1,
            Comment::Text(text) => texts.push(text),
            _ => {}
        }
    }

    if newdocs > 1 {
        findings.push(metadata("multiple-newdoc", "Multiple newdoc attributes."));
    }
    if newpars > 1 {
        findings.push(metadata("multiple-newpar", "Multiple newpar attributes."));
    }
    if options.check_tree_text && (newdocs > 0 || newpars > 0) && *spaceafterno_in_effect {
        findings.push(metadata(
            "spaceafter-newdocpar",
            "New document or paragraph starts when the last token of the previous sentence says SpaceAfter=No.",
        ));
    }

    let text = match texts.as_slice() {
        [] => {
            findings.push(metadata("missing-text", "Missing the text attribute."));
            return findings;
        }
        [text] => *text,
        _ => {
            findings.push(metadata("multiple-text", "Multiple text attributes."));
            return findings;
        }
    };
    if text.ends_with(char::is_whitespace) {
        findings.push(metadata(
            "text-trailing-whitespace",
            "The text attribute must not end with whitespace.",
        ));
    }
    if options.check_tree_text {
        findings.extend(reconstruct_text(text, rows, options, spaceafterno_in_effect));
    }
    findings
}

/// Consumes `text` token by token and reports where FORM and SpaceAfter disagree with it.
fn reconstruct_text(
    text: &str,
    rows: &[Row],
    options: TextOptions,
    spaceafterno_in_effect: &mut bool,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut rest = text;
    // bounds of the latest multiword token
    let mut mwt: Option<(u32, u32)> = None;
    let mut mismatch_reported = false;

    for row in rows {
        let misc = row.misc().raw();
        if misc.contains("NoSpaceAfter=Yes") {
            findings.push(
                metadata(
                    "nospaceafter-yes",
                    "'NoSpaceAfter=Yes' should be replaced with 'SpaceAfter=No'.",
                )
                .at_line(row.line()),
            );
        }

        // 1. Only tokens consume text
        match row.id() {
            Some(NodeId::Empty(..)) => {
                if misc.contains("SpaceAfter=No") {
                    findings.push(
                        metadata(
                            "spaceafter-empty-node",
                            "'SpaceAfter=No' cannot occur with empty nodes.",
                        )
                        .at_line(row.line()),
                    );
                }
                continue;
            }
            Some(NodeId::Range(begin, end)) => mwt = Some((begin, end)),
            Some(NodeId::Word(word)) if mwt.map_or(false, |(b, e)| b <= word && word <= e) => {
                if misc.contains("SpaceAfter=No") {
                    findings.push(
                        metadata(
                            "spaceafter-mwt-node",
                            "'SpaceAfter=No' cannot occur with words that are part of a multi-word token.",
                        )
                        .at_line(row.line()),
                    );
                }
                continue;
            }
            Some(NodeId::Word(_)) => {}
            None => continue,
        }

        // 2. Eat the form and the space after it
        let form = row.form();
        let Some(after) = rest.strip_prefix(form) else {
            if !mismatch_reported {
                let seen: String = rest.chars().take(form.chars().count() + 20).collect();
                findings.push(metadata(
                    "text-form-mismatch",
                    format!(
                        "Mismatch between the text attribute and the FORM field. Form[{}] is '{}' but text is '{}...'",
                        row.raw_id(),
                        form,
                        seen
                    ),
                ));
                mismatch_reported = true;
            }
            continue;
        };
        rest = after;
        if row.misc().space_after_no() {
            *spaceafterno_in_effect = true;
        } else {
            *spaceafterno_in_effect = false;
            if options.check_space_after && !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                findings.push(
                    metadata(
                        "missing-spaceafter",
                        format!(
                            "'SpaceAfter=No' is missing in the MISC field of node #{} because the text is '{}'.",
                            row.raw_id(),
                            shorten(&format!("{}{}", form, rest))
                        ),
                    )
                    .at_line(row.line()),
                );
            }
            rest = rest.trim_start();
        }
    }

    if !rest.is_empty() {
        findings.push(metadata(
            "text-extra-chars",
            format!(
                "Extra characters at the end of the text attribute, not accounted for in the FORM fields: '{}'",
                rest
            ),
        ));
    }
    findings
}

fn shorten(text: &str) -> String {
    if text.chars().count() <= 25 {
        text.to_string()
    } else {
        format!("{}[...]", text.chars().take(20).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comments(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    fn rows(lines: &[&str]) -> Vec<Row> {
        lines
            .iter()
            .enumerate()
            .map(|(i, l)| Row::from_line(i + 3, l).unwrap())
            .collect()
    }

    fn ids(findings: &[Finding]) -> Vec<&str> {
        findings.iter().map(|f| f.test_id.as_str()).collect()
    }

    const CHECK_ALL: TextOptions = TextOptions {
        check_tree_text: true,
        check_space_after: true,
    };

    #[test]
    fn test_sent_id_rules() {
        let mut known = HashSet::new();
        assert!(check_sent_id(&comments(&["# sent_id = s1"]), &mut known, "la").is_empty());
        assert_eq!(
            ids(&check_sent_id(&comments(&["# sent_id = s1"]), &mut known, "la")),
            ["non-unique-sent-id"]
        );
        assert_eq!(ids(&check_sent_id(&[], &mut known, "la")), ["missing-sent-id"]);
        assert_eq!(
            ids(&check_sent_id(&comments(&["# sent_id = a", "# sent_id = b"]), &mut known, "la")),
            ["multiple-sent-id"]
        );
        assert_eq!(
            ids(&check_sent_id(&comments(&["# sent_id = a b"]), &mut known, "la")),
            ["invalid-sent-id", "missing-sent-id"]
        );
    }

    #[test]
    fn test_slash_in_sent_id() {
        let mut known = HashSet::new();
        assert!(check_sent_id(&comments(&["# sent_id = doc/1"]), &mut known, "ud").is_empty());
        assert_eq!(
            ids(&check_sent_id(&comments(&["# sent_id = doc/2"]), &mut known, "la")),
            ["slash-in-sent-id"]
        );
        assert_eq!(
            ids(&check_sent_id(&comments(&["# sent_id = a/b/c"]), &mut known, "ud")),
            ["slash-in-sent-id"]
        );
    }

    #[test]
    fn test_text_attributes() {
        let mut in_effect = false;
        let off = TextOptions {
            check_tree_text: false,
            check_space_after: true,
        };
        assert_eq!(ids(&check_text_meta(&[], &[], off, &mut in_effect)), ["missing-text"]);
        let findings = check_text_meta(
            &comments(&["# newdoc", "# newdoc id = x", "# text = a", "# text = b"]),
            &[],
            off,
            &mut in_effect,
        );
        assert_eq!(ids(&findings), ["multiple-newdoc", "multiple-text"]);
        let findings = check_text_meta(
            &comments(&["# newpar", "# newpar id = p2", "# text = a"]),
            &[],
            off,
            &mut in_effect,
        );
        assert_eq!(ids(&findings), ["multiple-newpar"]);
        let findings = check_text_meta(&comments(&["# text = He came. "]), &[], off, &mut in_effect);
        assert_eq!(ids(&findings), ["text-trailing-whitespace"]);
    }

    #[test]
    fn test_text_matches_forms() {
        let mut in_effect = false;
        let sentence = rows(&[
            "1\tHe\the\tPRON\t_\t_\t2\tnsubj\t_\t_",
            "2\tcame\tcome\tVERB\t_\t_\t0\troot\t_\tSpaceAfter=No",
            "3\t.\t.\tPUNCT\t_\t_\t2\tpunct\t_\tSpaceAfter=No",
        ]);
        let findings = check_text_meta(&comments(&["# text = He came."]), &sentence, CHECK_ALL, &mut in_effect);
        assert!(findings.is_empty());
        assert!(in_effect);

        let findings = check_text_meta(&comments(&["# newpar", "# text = x"]), &[], CHECK_ALL, &mut in_effect);
        assert_eq!(ids(&findings), ["spaceafter-newdocpar", "text-extra-chars"]);
    }

    #[test]
    fn test_text_mismatches() {
        let mut in_effect = false;
        let sentence = rows(&[
            "1\tHe\the\tPRON\t_\t_\t2\tnsubj\t_\t_",
            "2\tcame\tcome\tVERB\t_\t_\t0\troot\t_\t_",
        ]);
        let findings = check_text_meta(&comments(&["# text = Hecame"]), &sentence, CHECK_ALL, &mut in_effect);
        assert_eq!(ids(&findings), ["missing-spaceafter"]);
        assert_eq!(
            findings[0].message,
            "'SpaceAfter=No' is missing in the MISC field of node #1 because the text is 'Hecame'."
        );

        let findings = check_text_meta(&comments(&["# text = She came"]), &sentence, CHECK_ALL, &mut in_effect);
        assert_eq!(ids(&findings), ["text-form-mismatch", "text-extra-chars"]);
        assert_eq!(findings[0].line, None);
    }

    #[test]
    fn test_spaceafter_inside_tokens() {
        let mut in_effect = false;
        let sentence = rows(&[
            "1-2\tdel\t_\t_\t_\t_\t_\t_\t_\t_",
            "1\tde\tde\tADP\t_\t_\t3\tcase\t_\tSpaceAfter=No",
            "2\tel\tel\tDET\t_\t_\t3\tdet\t_\t_",
            "3\tmar\tmar\tNOUN\t_\t_\t0\troot\t_\t_",
            "3.1\tx\tx\t_\t_\t_\t_\t_\t_\tSpaceAfter=No|NoSpaceAfter=Yes",
        ]);
        let findings = check_text_meta(&comments(&["# text = del mar"]), &sentence, CHECK_ALL, &mut in_effect);
        assert_eq!(
            ids(&findings),
            ["spaceafter-mwt-node", "nospaceafter-yes", "spaceafter-empty-node"]
        );
        assert_eq!(findings[0].line, Some(4));
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("short"), "short");
        assert_eq!(shorten("abcdefghijklmnopqrstuvwxyz"), "abcdefghijklmnopqrst[...]");
    }

    #[test]
    fn test_huge_multiword_token() {
        let mut in_effect = false;
        let sentence = rows(&[
            "1-4000000000	del	_	_	_	_	_	_	_	_",
            "1	de	de	ADP	_	_	0	root	_	SpaceAfter=No",
        ]);
        let findings = check_text_meta(&comments(&["# text = del"]), &sentence, CHECK_ALL, &mut in_effect);
        assert_eq!(ids(&findings), ["spaceafter-mwt-node"]);
    }
}
