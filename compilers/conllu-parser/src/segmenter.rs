use std::io::{self, BufRead};

use conllu_protocol::{Category, Finding, Row, SentenceStamp};
use tracing::debug;

use crate::level1::{check_row_format, check_unicode};
use crate::metadata::{classify, Comment};

/// One blank-line-terminated block of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceUnit {
    /// Zero-based block index, counting corrupted blocks too.
    pub index: usize,
    /// Line of the first row, or of the first comment when there are no rows.
    pub start_line: usize,
    /// First well-formed `sent_id` among this block's comments.
    pub sent_id: Option<String>,
    pub comments: Vec<String>,
    pub rows: Vec<Row>,
}

impl SentenceUnit {
    pub fn stamp(&self) -> SentenceStamp {
        SentenceStamp {
            index: self.index,
            sentence_id: self.sent_id.clone(),
            start_line: self.start_line,
        }
    }
}

/// One-pass scanner turning a line stream into sentence units.
///
/// Level 1 single-line problems are buffered as they are found and can be
/// drained with [`Segmenter::take_findings`] after each yielded unit.
pub struct Segmenter<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    /// Most recently seen sent_id, for error context only.
    last_sent_id: Option<String>,
    comments: Vec<String>,
    comment_line: usize,
    rows: Vec<Row>,
    sentence_line: usize,
    corrupted: bool,
    index: usize,
    findings: Vec<(SentenceStamp, Finding)>,
    newline_reported: bool,
    finished: bool,
}

impl<R: BufRead> Segmenter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            last_sent_id: None,
            comments: Vec::new(),
            comment_line: 0,
            rows: Vec::new(),
            sentence_line: 0,
            corrupted: false,
            index: 0,
            findings: Vec::new(),
            newline_reported: false,
            finished: false,
        }
    }

    /// Number of lines consumed so far.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn take_findings(&mut self) -> Vec<(SentenceStamp, Finding)> {
        std::mem::take(&mut self.findings)
    }

    fn stamp(&self) -> SentenceStamp {
        SentenceStamp {
            index: self.index,
            sentence_id: self.last_sent_id.clone(),
            start_line: if self.rows.is_empty() {
                self.line_no
            } else {
                self.sentence_line
            },
        }
    }

    fn report(&mut self, test_id: &str, message: impl Into<String>) {
        let finding = Finding::new(1, Category::Format, test_id, message).at_line(self.line_no);
        self.push(finding);
    }

    fn push(&mut self, finding: Finding) {
        let stamp = self.stamp();
        self.findings.push((stamp, finding));
    }

    fn pending(&self) -> bool {
        !self.rows.is_empty() || self.corrupted
    }

    /// Closes the current block; corrupted blocks are consumed but not yielded.
    fn end_sentence(&mut self) -> Option<SentenceUnit> {
        let comments = std::mem::take(&mut self.comments);
        let rows = std::mem::take(&mut self.rows);
        let index = self.index;
        self.index += 1;

        if std::mem::take(&mut self.corrupted) {
            debug!(index, line = self.sentence_line, "skipping corrupted sentence");
            return None;
        }
        let sent_id = comments.iter().find_map(|c| match classify(c) {
            Comment::SentId(id) => Some(id.to_string()),
            _ => None,
        });
        let start_line = if rows.is_empty() {
            self.comment_line
        } else {
            self.sentence_line
        };
        Some(SentenceUnit {
            index,
            start_line,
            sent_id,
            comments,
            rows,
        })
    }

    /// Reads the next physical line into `buf`, without its terminator.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
            if !self.newline_reported {
                self.newline_reported = true;
                self.report(
                    "non-unix-newline",
                    "Only the unix-style LF line terminator is allowed.",
                );
            }
        }

        match std::str::from_utf8(&self.buf) {
            Ok(text) => Ok(Some(text.to_string())),
            Err(_) => {
                let text = String::from_utf8_lossy(&self.buf).into_owned();
                self.report("invalid-utf8", "The line is not valid UTF-8.");
                Ok(Some(text))
            }
        }
    }

    /// Handles one line; returns a unit when the line closes a sentence.
    fn scan(&mut self, line: String) -> Option<SentenceUnit> {
        // 1. Blank or whitespace-only lines terminate sentences.
        if line.is_empty() || line.chars().all(char::is_whitespace) {
            if !line.is_empty() {
                self.report(
                    "pseudo-empty-line",
                    "Spurious line that appears empty but is not; there are whitespace characters.",
                );
            }
            if self.pending() {
                return self.end_sentence();
            }
            if line.is_empty() {
                self.report(
                    "extra-empty-line",
                    "Spurious empty line. Only one empty line is expected after every sentence.",
                );
            }
            return None;
        }

        // 2. Comments
        if line.starts_with('#') {
            if let Comment::SentId(id) = classify(&line) {
                self.last_sent_id = Some(id.to_string());
            }
            if self.pending() {
                self.report(
                    "misplaced-comment",
                    "Spurious comment line. Comments are only allowed before a sentence.",
                );
            } else {
                if self.comments.is_empty() {
                    self.comment_line = self.line_no;
                }
                self.comments.push(line);
            }
            return None;
        }

        // 3. Token lines
        if line.starts_with(|c: char| c.is_ascii_digit()) {
            if let Some(finding) = check_unicode(self.line_no, &line) {
                self.push(finding);
            }
            if !self.pending() {
                self.sentence_line = self.line_no;
            }
            match Row::from_line(self.line_no, &line) {
                Ok(row) => {
                    for finding in check_row_format(&row) {
                        self.push(finding);
                    }
                    self.rows.push(row);
                }
                Err(err) => {
                    self.report(
                        "number-of-columns",
                        format!("{} The contents of the columns will not be checked.", err),
                    );
                    self.corrupted = true;
                }
            }
            return None;
        }

        self.report(
            "invalid-line",
            format!(
                "Spurious line: '{}'. All non-empty lines should start with a digit or the # character.",
                line
            ),
        );
        None
    }
}

impl<R: BufRead> Iterator for Segmenter<R> {
    type Item = io::Result<SentenceUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    self.finished = true;
                    return Some(Err(err));
                }
            };
            if let Some(unit) = self.scan(line) {
                return Some(Ok(unit));
            }
        }

        // End of input
        self.finished = true;
        if self.pending() || !self.comments.is_empty() {
            self.report("missing-empty-line", "Missing empty line after the last sentence.");
            return self.end_sentence().map(Ok);
        }
        None
    }
}
