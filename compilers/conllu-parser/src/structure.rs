//! ID sequencing of a sentence's rows, independent of any tree.

use conllu_protocol::{Category, Finding, NodeId, Row};

fn format_finding(test_id: &str, message: String) -> Finding {
    Finding::new(1, Category::Format, test_id, message)
}

fn joined(ids: impl Iterator<Item = u32>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join(",")
}

/// Returns whether the rows are safe to build a tree from.
pub fn check_id_sequence(rows: &[Row]) -> (bool, Vec<Finding>) {
    let mut ok = true;
    let mut findings = Vec::new();
    let mut words: Vec<u32> = Vec::new();
    // token intervals, including the implicit single-word ones
    let mut tokens: Vec<(u32, u32)> = Vec::new();
    let mut current_word = 0;
    let mut next_empty = 1;

    for row in rows {
        let Some(id) = row.id() else {
            ok = false;
            continue;
        };
        if !id.is_empty_node() {
            next_empty = 1;
        }
        match id {
            NodeId::Word(w) => {
                current_word = w;
                words.push(w);
                let covered = tokens.last().map_or(false, |&(b, e)| b <= w && w <= e);
                if !covered {
                    tokens.push((w, w));
                }
            }
            NodeId::Range(b, e) => {
                let placed = match words.last() {
                    None => b >= 1,
                    Some(&last) => b > last,
                };
                if !placed {
                    findings.push(
                        format_finding(
                            "misplaced-word-interval",
                            "Multiword range not before its first word.".to_string(),
                        )
                        .at_line(row.line()),
                    );
                    ok = false;
                    continue;
                }
                tokens.push((b, e));
            }
            NodeId::Empty(w, e) => {
                if w != current_word || e != next_empty {
                    findings.push(
                        format_finding(
                            "misplaced-empty-node",
                            format!(
                                "Empty node id {}, expected {}.{}",
                                row.raw_id(),
                                current_word,
                                next_empty
                            ),
                        )
                        .at_line(row.line()),
                    );
                    ok = false;
                }
                next_empty += 1;
            }
        }
    }

    // 1. Words form the sequence 1..n
    let got = joined(words.iter().copied());
    let expected = joined(1..=words.len() as u32);
    if got != expected {
        findings.push(format_finding(
            "word-id-sequence",
            format!(
                "Words do not form a sequence. Got '{}'. Expected '{}'.",
                got, expected
            ),
        ));
        ok = false;
    }

    // 2. Interval sanity, single-word intervals included
    for (b, e) in tokens {
        if e < b {
            findings.push(format_finding(
                "reversed-word-interval",
                format!("Spurious token interval {}-{}", b, e),
            ));
            ok = false;
        } else if b < 1 || e as usize > words.len() {
            findings.push(format_finding(
                "word-interval-out",
                format!("Spurious token interval {}-{} (out of range)", b, e),
            ));
            ok = false;
        }
    }

    (ok, findings)
}

/// Multiword ranges must span at least two words and never overlap.
pub fn check_token_ranges(rows: &[Row]) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut covered: Vec<(u32, u32)> = Vec::new();

    for row in rows {
        let Some(NodeId::Range(start, end)) = row.id() else {
            continue;
        };
        // e < b is already reported by the sequence check
        if start == end {
            findings.push(
                format_finding(
                    "reversed-word-interval",
                    format!("Spurious token interval {}-{}", start, end),
                )
                .at_line(row.line()),
            );
            continue;
        }
        if end < start {
            continue;
        }
        if covered.iter().any(|&(b, e)| b <= end && start <= e) {
            findings.push(
                format_finding(
                    "overlapping-word-intervals",
                    format!("Range overlaps with others: {}", row.raw_id()),
                )
                .at_line(row.line()),
            );
        }
        covered.push((start, end));
    }
    findings
}
