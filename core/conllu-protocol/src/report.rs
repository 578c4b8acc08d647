use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum Category {
    Format,
    Unicode,
    Metadata,
    Syntax,
    Morpho,
    Enhanced,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Format => "Format",
            Category::Unicode => "Unicode",
            Category::Metadata => "Metadata",
            Category::Syntax => "Syntax",
            Category::Morpho => "Morpho",
            Category::Enhanced => "Enhanced",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem found by one check, before sentence context is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub level: u8,
    pub category: Category,
    pub test_id: String,
    pub message: String,
    pub node: Option<String>,
    /// `None` means "the sentence as a whole"; the reporter substitutes the sentence's first line.
    pub line: Option<usize>,
}

impl Finding {
    pub fn new(
        level: u8,
        category: Category,
        test_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            test_id: test_id.into(),
            message: message.into(),
            node: None,
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn on_node(mut self, node: impl fmt::Display) -> Self {
        self.node = Some(node.to_string());
        self
    }
}

/// Which sentence a finding belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceStamp {
    /// Zero-based position of the sentence in the input.
    pub index: usize,
    pub sentence_id: Option<String>,
    pub start_line: usize,
}

/// External sentence id mapping (e.g. a standoff document and line).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct ConcordanceEntry {
    pub alt_id: String,
    pub order: u64,
}

pub type Concordance = HashMap<String, ConcordanceEntry>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct ErrorEntry {
    pub sentence_id: Option<String>,
    pub alt_id: Option<String>,
    pub order: u64,
    pub tree_counter: usize,
    pub level: u8,
    pub category: Category,
    pub test_id: String,
    pub message: String,
    pub node_id: Option<String>,
    pub line_no: Option<usize>,
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut prefix = Vec::new();
        if let Some(line) = self.line_no {
            prefix.push(format!("Line {}", line));
        }
        if let Some(alt) = &self.alt_id {
            prefix.push(format!("Sentence {}", alt));
        }
        write!(
            f,
            "{}: [L{} {} {}] {}",
            prefix.join(" "),
            self.level,
            self.category,
            self.test_id,
            self.message
        )
    }
}

/// Accumulates findings for a run and attaches sentence context to them.
#[derive(Debug, Default)]
pub struct Reporter {
    concordance: Concordance,
    exempt: HashSet<String>,
    current: SentenceStamp,
    entries: Vec<ErrorEntry>,
    counts: BTreeMap<Category, usize>,
    notices: HashSet<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concordance(mut self, concordance: Concordance) -> Self {
        self.concordance = concordance;
        self
    }

    /// Test ids that are dropped instead of recorded.
    pub fn with_exemptions<I, S>(mut self, test_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exempt = test_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn begin_sentence(&mut self, stamp: SentenceStamp) {
        self.current = stamp;
    }

    pub fn current(&self) -> &SentenceStamp {
        &self.current
    }

    /// Records a finding in the current sentence.
    pub fn record(&mut self, finding: Finding) {
        let stamp = self.current.clone();
        self.record_at(&stamp, finding);
    }

    pub fn record_at(&mut self, stamp: &SentenceStamp, finding: Finding) {
        if self.exempt.contains(&finding.test_id) {
            return;
        }
        *self.counts.entry(finding.category).or_insert(0) += 1;

        let mapped = stamp
            .sentence_id
            .as_ref()
            .and_then(|id| self.concordance.get(id));
        let line_no = finding
            .line
            .or(Some(stamp.start_line))
            .filter(|l| *l > 0);

        self.entries.push(ErrorEntry {
            sentence_id: stamp.sentence_id.clone(),
            alt_id: mapped.map(|m| m.alt_id.clone()),
            order: mapped.map_or(stamp.index as u64, |m| m.order),
            tree_counter: stamp.index + 1,
            level: finding.level,
            category: finding.category,
            test_id: finding.test_id,
            message: finding.message,
            node_id: finding.node,
            line_no,
        });
    }

    pub fn extend<I: IntoIterator<Item = Finding>>(&mut self, findings: I) {
        for finding in findings {
            self.record(finding);
        }
    }

    /// True the first time `key` is asked for; long notices are attached only once per run.
    pub fn take_notice(&mut self, key: &str) -> bool {
        self.notices.insert(key.to_string())
    }

    pub fn counts(&self) -> &BTreeMap<Category, usize> {
        &self.counts
    }

    pub fn error_count(&self) -> usize {
        self.entries.len()
    }

    /// Hands over the accumulated entries; notices and exemptions stay in effect.
    pub fn take_report(&mut self, source: Option<String>) -> Report {
        self.counts.clear();
        Report::new(source, std::mem::take(&mut self.entries))
    }

    pub fn finish(mut self, source: Option<String>) -> Report {
        self.take_report(source)
    }
}

/// Ordered findings of a run, grouped by sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Report {
    pub source: Option<String>,
    pub entries: Vec<ErrorEntry>,
}

impl Report {
    pub fn new(source: Option<String>, mut entries: Vec<ErrorEntry>) -> Self {
        // stable: same-line findings keep their discovery order
        entries.sort_by_key(|e| (e.order, e.line_no.unwrap_or(0)));
        Self { source, entries }
    }

    pub fn is_valid(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, test_id: &str) -> usize {
        self.entries.iter().filter(|e| e.test_id == test_id).count()
    }

    pub fn with_test_id<'a>(&'a self, test_id: &'a str) -> impl Iterator<Item = &'a ErrorEntry> {
        self.entries.iter().filter(move |e| e.test_id == test_id)
    }

    /// Consecutive runs of entries sharing a sentence id.
    pub fn groups(&self) -> Vec<(Option<&str>, &[ErrorEntry])> {
        let mut groups = Vec::new();
        let mut start = 0;
        for i in 1..=self.entries.len() {
            let boundary = i == self.entries.len()
                || self.entries[i].sentence_id != self.entries[start].sentence_id;
            if boundary {
                groups.push((
                    self.entries[start].sentence_id.as_deref(),
                    &self.entries[start..i],
                ));
                start = i;
            }
        }
        groups
    }

    pub fn lines(&self) -> Vec<String> {
        if self.is_valid() {
            let valid = match &self.source {
                Some(name) => format!("File {} is valid.", name),
                None => "File is valid.".to_string(),
            };
            return vec![valid];
        }
        let mut out = Vec::new();
        for (i, (sentence, entries)) in self.groups().into_iter().enumerate() {
            if i > 0 {
                out.push(String::new());
            }
            out.push(format!("{}:", sentence.unwrap_or("<unknown>")));
            out.extend(entries.iter().map(|e| e.to_string()));
        }
        out
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(index: usize, id: &str, line: usize) -> SentenceStamp {
        SentenceStamp {
            index,
            sentence_id: Some(id.to_string()),
            start_line: line,
        }
    }

    #[test]
    fn test_entries_take_sentence_context() {
        let mut reporter = Reporter::new();
        reporter.begin_sentence(stamp(0, "s1", 3));
        reporter.record(Finding::new(2, Category::Metadata, "missing-text", "Missing the text attribute."));
        reporter.record(
            Finding::new(3, Category::Syntax, "rel-upos-aux", "x")
                .at_line(5)
                .on_node(2),
        );

        let report = reporter.finish(None);
        assert_eq!(report.len(), 2);
        assert_eq!(report.entries[0].line_no, Some(3));
        assert_eq!(report.entries[1].node_id.as_deref(), Some("2"));
        assert_eq!(report.entries[1].sentence_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_order_then_line_then_groups() {
        let mut reporter = Reporter::new();
        reporter.record_at(&stamp(1, "s2", 10), Finding::new(1, Category::Format, "b", "b").at_line(12));
        reporter.record_at(&stamp(0, "s1", 1), Finding::new(1, Category::Format, "a", "a").at_line(4));
        reporter.record_at(&stamp(1, "s2", 10), Finding::new(1, Category::Format, "c", "c").at_line(11));

        let report = reporter.finish(None);
        let ids: Vec<&str> = report.entries.iter().map(|e| e.test_id.as_str()).collect();
        assert_eq!(ids, ["a", "c", "b"]);

        let groups = report.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, Some("s1"));
        assert_eq!(groups[1].1.len(), 2);
    }

    #[test]
    fn test_concordance_overrides_order_and_decorates() {
        let mut concordance = Concordance::new();
        concordance.insert(
            "s1".to_string(),
            ConcordanceEntry { alt_id: "doc3:7".to_string(), order: 9 },
        );
        let mut reporter = Reporter::new().with_concordance(concordance);
        reporter.record_at(&stamp(0, "s1", 1), Finding::new(2, Category::Syntax, "x", "first").at_line(2));
        reporter.record_at(&stamp(5, "s6", 40), Finding::new(2, Category::Syntax, "y", "second").at_line(41));

        let report = reporter.finish(None);
        assert_eq!(report.entries[0].test_id, "y");
        assert_eq!(report.entries[1].alt_id.as_deref(), Some("doc3:7"));
        assert_eq!(
            report.entries[1].to_string(),
            "Line 2 Sentence doc3:7: [L2 Syntax x] first"
        );
    }

    #[test]
    fn test_exempt_and_notices() {
        let mut reporter = Reporter::new().with_exemptions(["right-to-left-appos"]);
        reporter.record(Finding::new(3, Category::Syntax, "right-to-left-appos", "m"));
        assert_eq!(reporter.error_count(), 0);
        assert!(reporter.take_notice("feats"));
        assert!(!reporter.take_notice("feats"));
    }

    #[test]
    fn test_valid_sentinel_and_layout() {
        let report = Reporter::new().finish(Some("a.conllu".to_string()));
        assert_eq!(report.lines(), ["File a.conllu is valid."]);

        let mut reporter = Reporter::new();
        reporter.record_at(&stamp(0, "s1", 1), Finding::new(1, Category::Format, "a", "m1").at_line(1));
        reporter.record_at(&stamp(1, "s2", 5), Finding::new(1, Category::Format, "b", "m2").at_line(6));
        let lines = reporter.finish(None).lines();
        assert_eq!(
            lines,
            [
                "s1:",
                "Line 1: [L1 Format a] m1",
                "",
                "s2:",
                "Line 6: [L1 Format b] m2",
            ]
        );
    }
}
