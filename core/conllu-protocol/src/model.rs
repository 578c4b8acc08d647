use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Classification of a documented relation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
#[repr(u8)]
pub enum DeprelKind {
    Global = 0,           // Universal relation or universally documented subtype
    Local = 1,            // Subtype documented for this language only
    LanguageSpecific = 2, // Label outside the universal inventory
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct FeatureRecord {
    pub name: String,
    pub permitted: bool,
    pub uvalues: Vec<String>,
    pub lvalues: Vec<String>,
    pub unused_uvalues: Vec<String>,
    pub unused_lvalues: Vec<String>,
    /// UPOS -> (value, permitted)
    pub by_upos: Vec<(String, Vec<(String, bool)>)>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct DeprelRecord {
    pub name: String,
    pub kind: DeprelKind,
    pub permitted: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct AuxiliaryRecord {
    pub lemma: String,
    /// Documented functions, e.g. `aux.tense` or `cop.AUX`.
    pub functions: Vec<String>,
}

impl AuxiliaryRecord {
    /// Any function other than a pronominal copula makes the lemma an auxiliary.
    pub fn is_auxiliary(&self) -> bool {
        self.functions.iter().any(|f| f != "cop.PRON")
    }

    pub fn is_copula(&self) -> bool {
        self.functions.iter().any(|f| f.starts_with("cop."))
    }
}

/// Everything known about one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct LanguageData {
    pub code: String,
    pub features: Vec<FeatureRecord>,
    pub deprels: Vec<DeprelRecord>,
    /// Relations allowed only in DEPS.
    pub edeprels: Vec<String>,
    /// Regexes for forms and lemmas that may contain whitespace.
    pub tokens_with_space: Vec<String>,
    pub auxiliaries: Vec<AuxiliaryRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct RuleDatabase {
    pub version: u32,
    pub languages: Vec<LanguageData>,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("rule archive failed validation: {0}")]
    Invalid(String),
}

impl RuleDatabase {
    /// Validates and deserializes a compiled rule archive.
    pub fn from_archive(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let archived = check_archive(bytes)?;
        archived
            .deserialize(&mut rkyv::Infallible)
            .map_err(|e| match e {})
    }

    pub fn find(&self, code: &str) -> Option<&LanguageData> {
        self.languages.iter().find(|l| l.code == code)
    }
}

/// Validates archive bytes in place. The buffer must be suitably aligned,
/// e.g. an `rkyv::AlignedVec`.
pub fn check_archive(bytes: &[u8]) -> Result<&ArchivedRuleDatabase, ArchiveError> {
    rkyv::check_archived_root::<RuleDatabase>(bytes)
        .map_err(|e| ArchiveError::Invalid(e.to_string()))
}

/// Source of per-language rule tables.
pub trait LanguageDataProvider {
    /// Data for `code`, or `None` when the language has no documentation.
    fn language(&self, code: &str) -> Option<LanguageData>;
}

impl LanguageDataProvider for RuleDatabase {
    fn language(&self, code: &str) -> Option<LanguageData> {
        self.find(code).cloned()
    }
}

impl LanguageDataProvider for ArchivedRuleDatabase {
    fn language(&self, code: &str) -> Option<LanguageData> {
        self.languages
            .iter()
            .find(|l| l.code.as_str() == code)
            .and_then(|l| l.deserialize(&mut rkyv::Infallible).ok())
    }
}

/// Provider for runs without language documentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLanguageData;

impl LanguageDataProvider for NoLanguageData {
    fn language(&self, _code: &str) -> Option<LanguageData> {
        None
    }
}
