//! Single-line format checks that run while the input is scanned.

use conllu_protocol::{Category, Column, Finding, Row};
use unicode_normalization::{is_nfc, UnicodeNormalization};

fn format_finding(test_id: &str, message: String) -> Finding {
    Finding::new(1, Category::Format, test_id, message)
}

fn char_name(c: char) -> String {
    unicode_names2::name(c)
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("U+{:04X}", c as u32))
}

/// The whole line must be in Unicode NFC.
pub fn check_unicode(line_no: usize, text: &str) -> Option<Finding> {
    if is_nfc(text) {
        return None;
    }
    let normalized: String = text.nfc().collect();

    // locate the first differing character, column by column
    let detail = text
        .split('\t')
        .zip(normalized.split('\t'))
        .zip(Column::ALL.iter().map(|c| c.name()).chain(std::iter::repeat("?")))
        .find_map(|((raw, nfc), column)| {
            raw.chars()
                .zip(nfc.chars())
                .enumerate()
                .find(|(_, (a, b))| a != b)
                .map(|(j, (a, b))| {
                    format!(
                        "{}.character[{}] is {}, should be {}",
                        column,
                        j,
                        char_name(a),
                        char_name(b)
                    )
                })
        });

    let message = match detail {
        Some(detail) => format!("Unicode not normalized: {}.", detail),
        None => "Unicode not normalized.".to_string(),
    };
    Some(Finding::new(1, Category::Unicode, "unicode-normalization", message).at_line(line_no))
}

fn has_repeated_whitespace(value: &str) -> bool {
    value
        .chars()
        .zip(value.chars().skip(1))
        .any(|(a, b)| a.is_whitespace() && b.is_whitespace())
}

/// Whitespace and ID-shape rules for one ten-column row.
pub fn check_row_format(row: &Row) -> Vec<Finding> {
    let mut findings = Vec::new();

    // 1. Every column: non-empty, no stray whitespace at the edges, no doubled whitespace.
    for (column, value) in row.fields() {
        if value.is_empty() {
            findings.push(format_finding(
                "empty-column",
                format!("Empty value in column {}.", column),
            ));
            continue;
        }
        if value.starts_with(char::is_whitespace) {
            findings.push(format_finding(
                "leading-whitespace",
                format!("Leading whitespace not allowed in column {}.", column),
            ));
        }
        if value.ends_with(char::is_whitespace) {
            findings.push(format_finding(
                "trailing-whitespace",
                format!("Trailing whitespace not allowed in column {}.", column),
            ));
        }
        if has_repeated_whitespace(value) {
            findings.push(format_finding(
                "repeated-whitespace",
                format!(
                    "Two or more consecutive whitespace characters not allowed in column {}.",
                    column
                ),
            ));
        }
    }

    // 2. Columns that may not contain whitespace at all.
    for column in Column::NO_WHITESPACE {
        let value = row.get(column);
        if value.contains(char::is_whitespace) {
            findings.push(format_finding(
                "invalid-whitespace",
                format!("White space not allowed in column {}: '{}'.", column, value),
            ));
        }
    }

    // 3. ID shape
    if row.id().is_none() {
        findings.push(format_finding(
            "invalid-word-id",
            format!("Unexpected ID format '{}'.", row.raw_id()),
        ));
    }

    findings
        .into_iter()
        .map(|f| f.at_line(row.line()))
        .collect()
}
