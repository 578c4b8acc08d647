use core::fmt;
use core::str::FromStr;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Universal part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[repr(u8)]
pub enum Upos {
    Adj = 0,
    Adp = 1,
    Adv = 2,
    Aux = 3,
    Cconj = 4,
    Det = 5,
    Intj = 6,
    Noun = 7,
    Num = 8,
    Part = 9,
    Pron = 10,
    Propn = 11,
    Punct = 12,
    Sconj = 13,
    Sym = 14,
    Verb = 15,
    X = 16,
}

impl Upos {
    pub const ALL: [Upos; 17] = [
        Upos::Adj,
        Upos::Adp,
        Upos::Adv,
        Upos::Aux,
        Upos::Cconj,
        Upos::Det,
        Upos::Intj,
        Upos::Noun,
        Upos::Num,
        Upos::Part,
        Upos::Pron,
        Upos::Propn,
        Upos::Punct,
        Upos::Sconj,
        Upos::Sym,
        Upos::Verb,
        Upos::X,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Upos::Adj => "ADJ",
            Upos::Adp => "ADP",
            Upos::Adv => "ADV",
            Upos::Aux => "AUX",
            Upos::Cconj => "CCONJ",
            Upos::Det => "DET",
            Upos::Intj => "INTJ",
            Upos::Noun => "NOUN",
            Upos::Num => "NUM",
            Upos::Part => "PART",
            Upos::Pron => "PRON",
            Upos::Propn => "PROPN",
            Upos::Punct => "PUNCT",
            Upos::Sconj => "SCONJ",
            Upos::Sym => "SYM",
            Upos::Verb => "VERB",
            Upos::X => "X",
        }
    }
}

impl fmt::Display for Upos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Upos {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Upos::ALL
            .iter()
            .copied()
            .find(|u| u.as_str() == s)
            .ok_or(())
    }
}

bitflags! {
    /// Set of UPOS tags, used by the relation compatibility tables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    #[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
    pub struct UposSet: u32 {
        const ADJ = 1 << 0;
        const ADP = 1 << 1;
        const ADV = 1 << 2;
        const AUX = 1 << 3;
        const CCONJ = 1 << 4;
        const DET = 1 << 5;
        const INTJ = 1 << 6;
        const NOUN = 1 << 7;
        const NUM = 1 << 8;
        const PART = 1 << 9;
        const PRON = 1 << 10;
        const PROPN = 1 << 11;
        const PUNCT = 1 << 12;
        const SCONJ = 1 << 13;
        const SYM = 1 << 14;
        const VERB = 1 << 15;
        const X = 1 << 16;
    }
}

impl From<Upos> for UposSet {
    fn from(upos: Upos) -> Self {
        UposSet::from_bits_truncate(1 << (upos as u32))
    }
}

impl UposSet {
    /// Whether the tag string names a member of this set. Unknown tags never do.
    pub fn admits(&self, tag: &str) -> bool {
        tag.parse::<Upos>()
            .map(|u| self.contains(UposSet::from(u)))
            .unwrap_or(false)
    }
}
