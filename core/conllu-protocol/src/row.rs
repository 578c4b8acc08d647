use core::fmt;

use thiserror::Error;

use crate::ids::{HeadRef, IdError, NodeId};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

pub const COLUMN_COUNT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[repr(u8)]
pub enum Column {
    Id = 0,
    Form = 1,
    Lemma = 2,
    Upos = 3,
    Xpos = 4,
    Feats = 5,
    Head = 6,
    Deprel = 7,
    Deps = 8,
    Misc = 9,
}

impl Column {
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Id,
        Column::Form,
        Column::Lemma,
        Column::Upos,
        Column::Xpos,
        Column::Feats,
        Column::Head,
        Column::Deprel,
        Column::Deps,
        Column::Misc,
    ];

    /// Columns that may never contain whitespace.
    pub const NO_WHITESPACE: [Column; 7] = [
        Column::Id,
        Column::Upos,
        Column::Xpos,
        Column::Feats,
        Column::Head,
        Column::Deprel,
        Column::Deps,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "ID",
            Column::Form => "FORM",
            Column::Lemma => "LEMMA",
            Column::Upos => "UPOS",
            Column::Xpos => "XPOS",
            Column::Feats => "FEATS",
            Column::Head => "HEAD",
            Column::Deprel => "DEPREL",
            Column::Deps => "DEPS",
            Column::Misc => "MISC",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("The line has {0} columns but 10 are expected.")]
    ColumnCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DepsError {
    #[error("malformed head:deprel pair '{0}'")]
    MissingSeparator(String),
    #[error(transparent)]
    Head(#[from] IdError),
}

/// One `head:relation` item of the DEPS column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dep<'a> {
    pub head: &'a str,
    pub rel: &'a str,
}

impl Dep<'_> {
    pub fn head_ref(&self) -> Result<HeadRef, IdError> {
        self.head.parse()
    }
}

impl fmt::Display for Dep<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.head, self.rel)
    }
}

/// Universal part of a relation label (`nmod:poss` -> `nmod`).
pub fn universal_part(deprel: &str) -> &str {
    deprel.split_once(':').map_or(deprel, |(base, _)| base)
}

/// A tab-separated token line with exactly ten fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    line: usize,
    fields: Vec<String>,
    id: Option<NodeId>,
}

impl Row {
    pub fn from_line(line: usize, text: &str) -> Result<Self, RowError> {
        let fields: Vec<String> = text.split('\t').map(str::to_string).collect();
        if fields.len() != COLUMN_COUNT {
            return Err(RowError::ColumnCount(fields.len()));
        }
        let id = fields[0].parse().ok();
        Ok(Self { line, fields, id })
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn get(&self, column: Column) -> &str {
        &self.fields[column.index()]
    }

    pub fn fields(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL.iter().map(move |c| (*c, self.get(*c)))
    }

    /// Parsed ID, `None` when the ID column is malformed.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn raw_id(&self) -> &str {
        self.get(Column::Id)
    }

    pub fn is_word(&self) -> bool {
        self.id.map_or(false, |id| id.is_word())
    }

    pub fn is_range(&self) -> bool {
        self.id.map_or(false, |id| id.is_range())
    }

    pub fn is_empty_node(&self) -> bool {
        self.id.map_or(false, |id| id.is_empty_node())
    }

    /// Word number of a word row.
    pub fn word(&self) -> Option<u32> {
        match self.id {
            Some(NodeId::Word(w)) => Some(w),
            _ => None,
        }
    }

    pub fn form(&self) -> &str {
        self.get(Column::Form)
    }

    pub fn lemma(&self) -> &str {
        self.get(Column::Lemma)
    }

    pub fn upos(&self) -> &str {
        self.get(Column::Upos)
    }

    pub fn xpos(&self) -> &str {
        self.get(Column::Xpos)
    }

    pub fn feats(&self) -> &str {
        self.get(Column::Feats)
    }

    pub fn raw_head(&self) -> &str {
        self.get(Column::Head)
    }

    /// Basic head; `None` for `_` or anything that is not `0` or a word number.
    pub fn head(&self) -> Option<u32> {
        HeadRef::parse_basic(self.raw_head()).ok().map(|h| h.word)
    }

    pub fn deprel(&self) -> &str {
        self.get(Column::Deprel)
    }

    pub fn udeprel(&self) -> &str {
        universal_part(self.deprel())
    }

    pub fn raw_deps(&self) -> &str {
        self.get(Column::Deps)
    }

    /// Splits DEPS into `head:relation` items without validating either half.
    pub fn deps(&self) -> Result<Vec<Dep<'_>>, DepsError> {
        let raw = self.raw_deps();
        if raw == "_" {
            return Ok(Vec::new());
        }
        raw.split('|')
            .map(|item| {
                item.split_once(':')
                    .map(|(head, rel)| Dep { head, rel })
                    .ok_or_else(|| DepsError::MissingSeparator(item.to_string()))
            })
            .collect()
    }

    /// DEPS with parsed head references.
    pub fn enhanced_heads(&self) -> Result<Vec<(HeadRef, &str)>, DepsError> {
        self.deps()?
            .into_iter()
            .map(|d| Ok((d.head_ref()?, d.rel)))
            .collect()
    }

    pub fn misc(&self) -> Misc<'_> {
        Misc(self.get(Column::Misc))
    }
}

/// View over the MISC column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Misc<'a>(pub &'a str);

impl<'a> Misc<'a> {
    pub fn raw(&self) -> &'a str {
        self.0
    }

    /// `key[=value]` attributes in column order.
    pub fn attributes(&self) -> impl Iterator<Item = (&'a str, Option<&'a str>)> {
        let raw = self.0;
        raw.split('|')
            .filter(move |_| raw != "_")
            .map(|attr| match attr.split_once('=') {
                Some((k, v)) => (k, Some(v)),
                None => (attr, None),
            })
    }

    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.attributes()
            .find(|(k, v)| *k == key && v.is_some())
            .and_then(|(_, v)| v)
    }

    /// Exact `key=value` attribute presence.
    pub fn has(&self, attribute: &str) -> bool {
        self.0 != "_" && self.0.split('|').any(|a| a == attribute)
    }

    /// Code-switching language of the token (`Lang=xx`).
    pub fn lang(&self) -> Option<&'a str> {
        self.get("Lang").filter(|l| !l.is_empty())
    }

    pub fn space_after_no(&self) -> bool {
        self.has("SpaceAfter=No")
    }
}
