//! Level 2 checks that look at all rows of a sentence together.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use conllu_protocol::{universal_part, Category, Finding, Row};
use regex::Regex;

fn basic_head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)$").expect("pattern is valid"))
}

fn enhanced_head_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(0|[1-9][0-9]*)(\.[1-9][0-9]*)?$").expect("pattern is valid"))
}

const UNIQUE_MISC: [&str; 7] = ["SpaceAfter", "Lang", "Translit", "LTranslit", "Gloss", "LId", "LDeriv"];

fn at(row: &Row, category: Category, test_id: &str, message: impl Into<String>) -> Finding {
    Finding::new(2, category, test_id, message).at_line(row.line())
}

fn nodes(rows: &[Row]) -> impl Iterator<Item = &Row> {
    rows.iter().filter(|r| r.is_word() || r.is_empty_node())
}

/// `root` if and only if the head is 0, in both HEAD and DEPS.
pub fn check_root(rows: &[Row]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for row in nodes(rows) {
        if row.is_word() {
            let is_root = universal_part(row.deprel()) == "root";
            match (row.raw_head() == "0", is_root) {
                (true, false) => findings.push(at(
                    row,
                    Category::Syntax,
                    "0-is-not-root",
                    "DEPREL must be 'root' if HEAD is 0.",
                )),
                (false, true) => findings.push(at(
                    row,
                    Category::Syntax,
                    "root-is-not-0",
                    "DEPREL cannot be 'root' if HEAD is not 0.",
                )),
                _ => {}
            }
        }

        let Ok(deps) = row.deps() else { continue };
        for dep in deps {
            match (dep.head == "0", universal_part(dep.rel) == "root") {
                (true, false) => findings.push(at(
                    row,
                    Category::Enhanced,
                    "enhanced-0-is-not-root",
                    "Enhanced relation type must be 'root' if head is 0.",
                )),
                (false, true) => findings.push(at(
                    row,
                    Category::Enhanced,
                    "enhanced-root-is-not-0",
                    "Enhanced relation type cannot be 'root' if head is not 0.",
                )),
                _ => {}
            }
        }
    }
    findings
}

/// HEAD and DEPS must point at nodes of the same sentence.
pub fn check_id_references(rows: &[Row]) -> Vec<Finding> {
    let ids: HashSet<&str> = nodes(rows).map(Row::raw_id).collect();
    let known = |head: &str| head == "0" || ids.contains(head);
    let mut findings = Vec::new();

    for row in nodes(rows) {
        if row.is_word() {
            let head = row.raw_head();
            if !basic_head_re().is_match(head) {
                findings.push(at(row, Category::Format, "invalid-head", format!("Invalid HEAD: '{}'.", head)));
            }
            if !known(head) {
                findings.push(at(
                    row,
                    Category::Syntax,
                    "unknown-head",
                    format!("Undefined HEAD (no such ID): '{}'.", head),
                ));
            }
        }

        let Ok(deps) = row.deps() else { continue };
        for dep in deps {
            if !enhanced_head_re().is_match(dep.head) {
                findings.push(at(
                    row,
                    Category::Format,
                    "invalid-ehead",
                    format!("Invalid enhanced head reference: '{}'.", dep.head),
                ));
            }
            if !known(dep.head) {
                findings.push(at(
                    row,
                    Category::Enhanced,
                    "unknown-ehead",
                    format!("Undefined enhanced head reference (no such ID): '{}'.", dep.head),
                ));
            }
        }
    }
    findings
}

/// DEPS sorted by head, then by relation, without repeats or self-loops.
pub fn check_deps(rows: &[Row]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for row in nodes(rows) {
        let Ok(deps) = row.enhanced_heads() else { continue };
        let raw = row.raw_deps();

        if deps.windows(2).any(|w| w[0].0 > w[1].0) {
            findings.push(at(
                row,
                Category::Format,
                "unsorted-deps",
                format!("DEPS not sorted by head index: '{}'", raw),
            ));
        } else {
            for w in deps.windows(2) {
                let ((head, prev), (next_head, rel)) = (w[0], w[1]);
                if head != next_head {
                    continue;
                }
                if rel < prev {
                    findings.push(at(
                        row,
                        Category::Format,
                        "unsorted-deps-2",
                        format!(
                            "DEPS pointing to head '{}' not sorted by relation type: '{}'",
                            head, raw
                        ),
                    ));
                } else if rel == prev {
                    findings.push(at(
                        row,
                        Category::Format,
                        "repeated-deps",
                        format!(
                            "DEPS contain multiple instances of the same relation '{}:{}'",
                            head, rel
                        ),
                    ));
                }
            }
        }

        let own = row.id().and_then(|id| id.as_head_ref());
        if own.is_some_and(|id| deps.iter().any(|(head, _)| *head == id)) {
            findings.push(at(
                row,
                Category::Enhanced,
                "deps-self-loop",
                format!("Self-loop in DEPS for '{}'", row.raw_id()),
            ));
        }
    }
    findings
}

pub fn check_misc(rows: &[Row]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for row in nodes(rows) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for (key, _) in row.misc().attributes() {
            if UNIQUE_MISC.contains(&key) {
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        findings.extend(counts.into_iter().filter(|(_, n)| *n > 1).map(|(key, _)| {
            at(
                row,
                Category::Format,
                "repeated-misc",
                format!("MISC attribute '{}' not supposed to occur twice", key),
            )
        }));
    }
    findings
}

pub fn skipped_corrupt_tree() -> Finding {
    Finding::new(
        2,
        Category::Format,
        "skipped-corrupt-tree",
        "Skipping annotation tests because of corrupt tree structure.",
    )
}
