use std::collections::BTreeSet;

use conllu_protocol::Concordance;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Which language's relation inventory a code-switched token is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeprelLanguagePolicy {
    /// Always the language of the run.
    #[default]
    Primary,
    /// The token's `Lang=` language.
    Token,
    /// Either of the two.
    Union,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub lang: String,
    /// 1: CoNLL-U backbone, 2: UD format, 3: UD contents,
    /// 4: language-specific labels, 5: language-specific contents.
    pub level: u8,
    pub single_root: bool,
    /// Reconstruct `# text` from FORM and SpaceAfter=No.
    pub check_tree_text: bool,
    pub check_space_after: bool,
    pub deprel_language_policy: DeprelLanguagePolicy,
    /// Test ids that are never reported (legacy treebanks).
    pub exempt_tests: BTreeSet<String>,
    pub sentence_concordance: Concordance,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            lang: "ud".to_string(),
            level: MAX_LEVEL,
            single_root: true,
            check_tree_text: false,
            check_space_after: true,
            deprel_language_policy: DeprelLanguagePolicy::Primary,
            exempt_tests: BTreeSet::new(),
            sentence_concordance: Concordance::new(),
        }
    }
}

impl ValidationConfig {
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    /// Clamps the level and forces universal labels below level 4.
    pub fn normalized(mut self) -> Self {
        let clamped = self.level.clamp(MIN_LEVEL, MAX_LEVEL);
        if clamped != self.level {
            warn!(requested = self.level, level = clamped, "validation level out of range");
            self.level = clamped;
        }
        if self.level < 4 || self.lang.is_empty() {
            self.lang = "ud".to_string();
        }
        self
    }
}
