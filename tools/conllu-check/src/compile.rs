//! UD documentation tables (JSON and plain lists) -> `RuleDatabase`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use conllu_protocol::{
    universal_part, AuxiliaryRecord, DeprelKind, DeprelRecord, FeatureRecord, LanguageData,
    RuleDatabase,
};
use conllu_validator::ruleset::is_universal_deprel;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

pub const DATABASE_VERSION: u32 = 1;

/// The documentation tables store switches as 0/1 as often as true/false.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    pub fn is_on(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(n) => n > 0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawFeature {
    pub permitted: Option<Flag>,
    #[serde(default)]
    pub uvalues: Vec<String>,
    #[serde(default)]
    pub lvalues: Vec<String>,
    #[serde(default)]
    pub unused_uvalues: Vec<String>,
    #[serde(default)]
    pub unused_lvalues: Vec<String>,
    #[serde(default)]
    pub byupos: BTreeMap<String, BTreeMap<String, Flag>>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `feats.json`: language -> feature -> record.
#[derive(Debug, Deserialize)]
pub struct FeatsFile {
    pub features: BTreeMap<String, BTreeMap<String, RawFeature>>,
}

#[derive(Debug, Deserialize)]
pub struct RawDeprel {
    pub permitted: Option<Flag>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// `deprels.json`: language -> relation -> record.
#[derive(Debug, Deserialize)]
pub struct DeprelsFile {
    pub deprels: BTreeMap<String, BTreeMap<String, RawDeprel>>,
}

#[derive(Debug, Deserialize)]
pub struct RawFunction {
    pub function: String,
}

#[derive(Debug, Deserialize)]
pub struct RawAuxiliary {
    #[serde(default)]
    pub functions: Vec<RawFunction>,
}

/// `data.json`: language -> lemma -> auxiliary functions.
#[derive(Debug, Deserialize)]
pub struct DataFile {
    #[serde(default)]
    pub auxiliaries: BTreeMap<String, BTreeMap<String, RawAuxiliary>>,
}

/// Plain-text lists: `tokens_w_space.<lang>` and `edeprel.<lang>`.
#[derive(Debug, Default)]
pub struct Lists {
    pub tokens_with_space: BTreeMap<String, Vec<String>>,
    pub edeprels: BTreeMap<String, Vec<String>>,
}

impl Lists {
    /// Reads every list in `dir` that belongs to one of `langs` (plus the `ud` ones).
    pub fn load(dir: &Path, langs: &BTreeSet<String>) -> Result<Self> {
        let mut lists = Self::default();
        for lang in langs.iter().map(String::as_str).chain(["ud"]) {
            let tokens = dir.join(format!("tokens_w_space.{lang}"));
            if tokens.exists() {
                lists.tokens_with_space.insert(lang.to_string(), read_list(&tokens)?);
            }
            let edeprels = dir.join(format!("edeprel.{lang}"));
            if edeprels.exists() {
                lists.edeprels.insert(lang.to_string(), read_list(&edeprels)?);
            }
        }
        Ok(lists)
    }
}

/// Non-empty lines that are not `#` comments, trimmed.
pub fn read_list(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading list {}", path.display()))?;
    Ok(parse_list(&text))
}

pub fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn deprel_kind(raw: Option<&str>) -> DeprelKind {
    match raw {
        Some("local") => DeprelKind::Local,
        Some("lspec") => DeprelKind::LanguageSpecific,
        _ => DeprelKind::Global,
    }
}

fn edeprel_re() -> Result<Regex> {
    Ok(Regex::new(
        r"^[a-z]+(:[a-z]+)?(:[\p{Ll}\p{Lm}\p{Lo}\p{M}]+(_[\p{Ll}\p{Lm}\p{Lo}\p{M}]+)*)?(:[a-z]+)?$",
    )?)
}

fn convert_feature(name: &str, raw: &RawFeature) -> FeatureRecord {
    FeatureRecord {
        name: name.to_string(),
        permitted: raw.permitted.is_some_and(Flag::is_on),
        uvalues: raw.uvalues.clone(),
        lvalues: raw.lvalues.clone(),
        unused_uvalues: raw.unused_uvalues.clone(),
        unused_lvalues: raw.unused_lvalues.clone(),
        by_upos: raw
            .byupos
            .iter()
            .map(|(upos, values)| {
                let values = values.iter().map(|(v, f)| (v.clone(), f.is_on())).collect();
                (upos.clone(), values)
            })
            .collect(),
        errors: raw.errors.clone(),
    }
}

/// Merges the tables into one record per language.
pub fn build_database(
    feats: &FeatsFile,
    deprels: &DeprelsFile,
    data: &DataFile,
    lists: &Lists,
) -> Result<RuleDatabase> {
    let edeprel_re = edeprel_re()?;
    let codes: BTreeSet<&String> = feats
        .features
        .keys()
        .chain(deprels.deprels.keys())
        .chain(data.auxiliaries.keys())
        .chain(lists.tokens_with_space.keys().filter(|l| *l != "ud"))
        .chain(lists.edeprels.keys().filter(|l| *l != "ud"))
        .collect();
    let ud_tokens = lists.tokens_with_space.get("ud").cloned().unwrap_or_default();

    let mut languages = Vec::with_capacity(codes.len());
    for code in codes {
        // 1. Features and relations
        let features = feats
            .features
            .get(code)
            .map(|table| table.iter().map(|(n, r)| convert_feature(n, r)).collect())
            .unwrap_or_default();
        let relations = deprels
            .deprels
            .get(code)
            .map(|table| {
                table
                    .iter()
                    .map(|(name, raw)| DeprelRecord {
                        name: name.clone(),
                        kind: deprel_kind(raw.kind.as_deref()),
                        permitted: raw.permitted.is_some_and(Flag::is_on),
                        errors: raw.errors.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        // 2. Enhanced-only relations must extend a universal one
        let edeprels = lists
            .edeprels
            .get(code)
            .into_iter()
            .flatten()
            .filter(|rel| {
                let base = universal_part(rel);
                let ok = edeprel_re.is_match(rel) && (is_universal_deprel(base) || base == "ref");
                if !ok {
                    warn!(lang = code.as_str(), relation = rel.as_str(), "skipping spurious enhanced relation");
                }
                ok
            })
            .cloned()
            .collect();

        // 3. Whitespace exceptions and auxiliaries
        let mut tokens_with_space = ud_tokens.clone();
        tokens_with_space.extend(lists.tokens_with_space.get(code).into_iter().flatten().cloned());
        let auxiliaries = data
            .auxiliaries
            .get(code)
            .map(|lemmas| {
                lemmas
                    .iter()
                    .map(|(lemma, raw)| AuxiliaryRecord {
                        lemma: lemma.clone(),
                        functions: raw.functions.iter().map(|f| f.function.clone()).collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        languages.push(LanguageData {
            code: code.clone(),
            features,
            deprels: relations,
            edeprels,
            tokens_with_space,
            auxiliaries,
        });
    }
    info!(languages = languages.len(), "rule database assembled");
    Ok(RuleDatabase {
        version: DATABASE_VERSION,
        languages,
    })
}

/// Adds or replaces features of one language, as in a treebank's private feature list.
pub fn add_features(feats: &mut FeatsFile, lang: &str, extra: BTreeMap<String, RawFeature>) {
    feats.features.entry(lang.to_string()).or_default().extend(extra);
}
