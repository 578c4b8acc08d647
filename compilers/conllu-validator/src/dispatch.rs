//! Runs the check families of each level over a stream of sentences.

use std::io::BufRead;
use std::sync::Arc;

use conllu_graph::EnhancedGraph;
use conllu_parser::{check_id_sequence, check_token_ranges, sentences, SentenceUnit};
use conllu_protocol::{LanguageDataProvider, NoLanguageData, Report, Reporter, RuleDatabase};
use conllu_tree::{check_annotation, Tree};
use tracing::debug;

use crate::checks::{
    check_deps, check_id_references, check_lspec, check_misc, check_root, check_row, check_sent_id,
    check_text_meta, skipped_corrupt_tree, RowEnv, TextOptions,
};
use crate::config::ValidationConfig;
use crate::context::ValidationContext;
use crate::error::ValidatorError;
use crate::resolver::RulesetResolver;

pub struct Validator {
    config: ValidationConfig,
    resolver: RulesetResolver,
    reporter: Reporter,
    ctx: ValidationContext,
    sentences: usize,
}

impl Validator {
    pub fn new(config: ValidationConfig, provider: impl LanguageDataProvider + 'static) -> Self {
        let config = config.normalized();
        let resolver = RulesetResolver::new(Box::new(provider), &config.lang);
        let reporter = Reporter::new()
            .with_concordance(config.sentence_concordance.clone())
            .with_exemptions(config.exempt_tests.iter().cloned());
        Self {
            config,
            resolver,
            reporter,
            ctx: ValidationContext::new(),
            sentences: 0,
        }
    }

    /// Validator over a compiled rule archive (aligned bytes).
    pub fn from_archive(config: ValidationConfig, bytes: &[u8]) -> Result<Self, ValidatorError> {
        let db = RuleDatabase::from_archive(bytes)?;
        Ok(Self::new(config, db))
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Sentences checked so far in this run.
    pub fn sentence_count(&self) -> usize {
        self.sentences
    }

    /// Validates one input; state such as known sent_ids carries over to the next call.
    pub fn validate_reader<R: BufRead>(&mut self, reader: R) -> Result<(), ValidatorError> {
        let mut units = sentences(reader);
        while let Some(unit) = units.next() {
            let unit = unit?;
            for (stamp, finding) in units.take_findings() {
                self.reporter.record_at(&stamp, finding);
            }
            self.validate_unit(&unit);
        }
        for (stamp, finding) in units.take_findings() {
            self.reporter.record_at(&stamp, finding);
        }
        debug!(lines = units.line_no(), sentences = self.sentences, "input done");
        Ok(())
    }

    pub fn validate_str(&mut self, input: &str) -> Result<(), ValidatorError> {
        self.validate_reader(input.as_bytes())
    }

    /// Report of everything validated since the last call.
    pub fn take_report(&mut self, source: Option<String>) -> Report {
        self.reporter.take_report(source)
    }

    pub fn finish(self, source: Option<String>) -> Report {
        self.reporter.finish(source)
    }

    fn validate_unit(&mut self, unit: &SentenceUnit) {
        let level = self.config.level;
        self.sentences += 1;
        self.reporter.begin_sentence(unit.stamp());
        debug!(index = unit.index, sent_id = ?unit.sent_id, level, "validating sentence");

        // 1. Level 1: token and word ids
        let (ids_ok, findings) = check_id_sequence(&unit.rows);
        self.reporter.extend(findings);
        self.reporter.extend(check_token_ranges(&unit.rows));
        if level < 2 {
            return;
        }

        // 2. Rows one by one
        let primary = Arc::clone(self.resolver.primary());
        for row in &unit.rows {
            let token = self.resolver.resolve(row.misc());
            let env = RowEnv {
                level,
                policy: self.config.deprel_language_policy,
                primary: &primary,
                token: &token,
            };
            let findings = check_row(row, &env, &mut self.reporter);
            self.reporter.extend(findings);
        }

        // 3. Sentence-wide format
        let sent_id = check_sent_id(&unit.comments, &mut self.ctx.known_sent_ids, &self.config.lang);
        self.reporter.extend(sent_id);
        let options = TextOptions {
            check_tree_text: self.config.check_tree_text,
            check_space_after: self.config.check_space_after,
        };
        let text = check_text_meta(&unit.comments, &unit.rows, options, &mut self.ctx.spaceafterno_in_effect);
        self.reporter.extend(text);
        self.reporter.extend(check_root(&unit.rows));
        self.reporter.extend(check_id_references(&unit.rows));
        self.reporter.extend(check_deps(&unit.rows));
        self.reporter.extend(check_misc(&unit.rows));

        // 4. Tree and graph, only over a clean id sequence
        let (tree, graph) = if ids_ok {
            (self.build_tree(unit), self.build_graph(unit))
        } else {
            (None, None)
        };

        // 5. Content
        match &tree {
            Some(tree) if level > 2 => {
                self.reporter.extend(check_annotation(tree));
                if level > 4 {
                    let findings = check_lspec(&unit.rows, &mut self.resolver);
                    self.reporter.extend(findings);
                }
            }
            Some(_) => {}
            None => self.reporter.record(skipped_corrupt_tree()),
        }
        if let Some(graph) = graph.filter(|_| level > 2) {
            let findings = self.ctx.gapping.check(&graph);
            self.reporter.extend(findings);
        }
    }

    fn build_tree<'s>(&mut self, unit: &'s SentenceUnit) -> Option<Tree<'s>> {
        match Tree::build(&unit.rows, self.config.single_root) {
            Ok(tree) => Some(tree),
            Err(err) => {
                debug!(index = unit.index, %err, "tree build failed");
                if let Some(finding) = err.finding() {
                    self.reporter.record(finding);
                }
                None
            }
        }
    }

    fn build_graph<'s>(&mut self, unit: &'s SentenceUnit) -> Option<EnhancedGraph<'s>> {
        match EnhancedGraph::build(&unit.rows) {
            Ok(graph) => graph,
            Err(err) => {
                debug!(index = unit.index, %err, "enhanced graph build failed");
                if let Some(finding) = err.finding() {
                    self.reporter.record(finding);
                }
                None
            }
        }
    }
}

/// Validates `input` with no language documentation; below level 4 this is the full check set.
pub fn validate_str(input: &str, config: ValidationConfig) -> Result<Report, ValidatorError> {
    let mut validator = Validator::new(config, NoLanguageData);
    validator.validate_str(input)?;
    Ok(validator.finish(None))
}
