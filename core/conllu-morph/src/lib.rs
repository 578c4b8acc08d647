use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use conllu_protocol::{Category, Finding};
use regex::Regex;
use thiserror::Error;

fn feature_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^([A-Z][A-Za-z0-9]*(?:\[[a-z0-9]+\])?)=(([A-Z0-9][A-Z0-9a-z]*)(,([A-Z0-9][A-Z0-9a-z]*))*)$",
        )
        .expect("feature pattern is valid")
    })
}

/// Well-formed name with any value list; the values are checked one by one.
fn item_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Z][A-Za-z0-9]*(?:\[[a-z0-9]+\])?)=([^=|]+)$").expect("item pattern is valid")
    })
}

fn value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Za-z0-9]*$").expect("value pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatsError {
    #[error("Spurious morphological feature: '{0}'")]
    Invalid(String),
}

/// One `Name=Value[,Value...]` item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature<'a> {
    pub name: &'a str,
    pub values: Vec<&'a str>,
}

fn captured<'a>(re: &Regex, item: &'a str) -> Option<Feature<'a>> {
    let caps = re.captures(item)?;
    let name = caps.get(1)?.as_str();
    let values = caps.get(2)?.as_str().split(',').collect();
    Some(Feature { name, values })
}

fn split_item(item: &str) -> Option<Feature<'_>> {
    captured(feature_re(), item)
}

/// Parses a FEATS value. `_` is the empty set.
pub fn parse(feats: &str) -> Result<Vec<Feature<'_>>, FeatsError> {
    if feats == "_" {
        return Ok(Vec::new());
    }
    feats
        .split('|')
        .map(|item| split_item(item).ok_or_else(|| FeatsError::Invalid(item.to_string())))
        .collect()
}

fn case_insensitive(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn is_sorted_case_insensitive(items: &[&str]) -> bool {
    let lowered: Vec<String> = items.iter().map(|s| s.to_lowercase()).collect();
    lowered.windows(2).all(|w| w[0] <= w[1])
}

/// Items are ordered by feature name, the same key `normalize` sorts by.
fn item_names<'a>(items: &[&'a str]) -> Vec<&'a str> {
    items
        .iter()
        .map(|item| item.split_once('=').map_or(*item, |(name, _)| name))
        .collect()
}

/// Canonical form: names sorted case-insensitively, each value list sorted
/// case-insensitively without duplicates, repeated names merged.
pub fn normalize(feats: &str) -> Result<String, FeatsError> {
    let mut features = parse(feats)?;
    if features.is_empty() {
        return Ok("_".to_string());
    }
    features.sort_by(|a, b| case_insensitive(a.name, b.name));

    let mut merged: Vec<Feature<'_>> = Vec::with_capacity(features.len());
    for feature in features {
        match merged.last_mut() {
            Some(last) if last.name == feature.name => last.values.extend(feature.values),
            _ => merged.push(feature),
        }
    }

    let items: Vec<String> = merged
        .into_iter()
        .map(|mut f| {
            f.values.sort_by(|a, b| case_insensitive(a, b));
            f.values.dedup();
            format!("{}={}", f.name, f.values.join(","))
        })
        .collect();
    Ok(items.join("|"))
}

/// Every well-formed `(name, value)` pair, skipping malformed items.
pub fn pairs(feats: &str) -> Vec<(&str, &str)> {
    if feats == "_" {
        return Vec::new();
    }
    feats
        .split('|')
        .filter_map(split_item)
        .flat_map(|f| f.values.into_iter().map(move |v| (f.name, v)))
        .collect()
}

pub fn has_value(feats: &str, name: &str, value: &str) -> bool {
    pairs(feats).into_iter().any(|(n, v)| n == name && v == value)
}

/// A violation of the FEATS format rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatsIssue {
    Unsorted { feats: String },
    Invalid { item: String },
    RepeatedValue { feats: String },
    UnsortedValues { item: String },
    InvalidValue { value: String, item: String },
    Repeated { feats: String },
}

impl FeatsIssue {
    pub fn test_id(&self) -> &'static str {
        match self {
            FeatsIssue::Unsorted { .. } => "unsorted-features",
            FeatsIssue::Invalid { .. } => "invalid-feature",
            FeatsIssue::RepeatedValue { .. } => "repeated-feature-value",
            FeatsIssue::UnsortedValues { .. } => "unsorted-feature-values",
            FeatsIssue::InvalidValue { .. } => "invalid-feature-value",
            FeatsIssue::Repeated { .. } => "repeated-feature",
        }
    }

    pub fn into_finding(self) -> Finding {
        Finding::new(2, Category::Morpho, self.test_id(), self.to_string())
    }
}

impl fmt::Display for FeatsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatsIssue::Unsorted { feats } => {
                write!(f, "Morphological features must be sorted: '{}'.", feats)
            }
            FeatsIssue::Invalid { item } => write!(
                f,
                "Spurious morphological feature: '{}'. Should be of the form Feature=Value and must start with [A-Z] and only contain [A-Za-z0-9].",
                item
            ),
            FeatsIssue::RepeatedValue { feats } => {
                write!(f, "Repeated feature values are disallowed: '{}'", feats)
            }
            FeatsIssue::UnsortedValues { item } => write!(
                f,
                "If a feature has multiple values, these must be sorted: '{}'",
                item
            ),
            FeatsIssue::InvalidValue { value, item } => write!(
                f,
                "Spurious value '{}' in '{}'. Must start with [A-Z0-9] and only contain [A-Za-z0-9].",
                value, item
            ),
            FeatsIssue::Repeated { feats } => {
                write!(f, "Repeated features are disallowed: '{}'.", feats)
            }
        }
    }
}

/// Format rules that hold for every language.
pub fn format_issues(feats: &str) -> Vec<FeatsIssue> {
    let mut issues = Vec::new();
    if feats == "_" {
        return issues;
    }

    let items: Vec<&str> = feats.split('|').collect();
    if !is_sorted_case_insensitive(&item_names(&items)) {
        issues.push(FeatsIssue::Unsorted { feats: feats.to_string() });
    }

    let mut names = HashSet::new();
    for item in &items {
        let Some(feature) = captured(item_re(), item) else {
            issues.push(FeatsIssue::Invalid { item: item.to_string() });
            // counted under its raw text so it cannot look repeated
            names.insert(*item);
            continue;
        };
        names.insert(feature.name);

        let distinct: HashSet<&str> = feature.values.iter().copied().collect();
        if distinct.len() != feature.values.len() {
            issues.push(FeatsIssue::RepeatedValue { feats: feats.to_string() });
        }
        if !is_sorted_case_insensitive(&feature.values) {
            issues.push(FeatsIssue::UnsortedValues { item: item.to_string() });
        }
        for value in &feature.values {
            if !value_re().is_match(value) {
                issues.push(FeatsIssue::InvalidValue {
                    value: value.to_string(),
                    item: item.to_string(),
                });
            }
        }
    }

    if names.len() != items.len() {
        issues.push(FeatsIssue::Repeated { feats: feats.to_string() });
    }
    issues
}
