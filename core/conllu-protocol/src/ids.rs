use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize},
    sequence::{pair, preceded, separated_pair},
    IResult,
};
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("unexpected ID format '{0}'")]
    Node(String),
    #[error("invalid head reference '{0}'")]
    Head(String),
}

/// Identifier in the first column of a row.
///
/// `Word(3)` is `3`, `Range(3, 4)` is the multiword token line `3-4`,
/// `Empty(3, 1)` is the empty node `3.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub enum NodeId {
    Word(u32),
    Range(u32, u32),
    Empty(u32, u32),
}

impl NodeId {
    pub fn is_word(&self) -> bool {
        matches!(self, NodeId::Word(_))
    }

    pub fn is_range(&self) -> bool {
        matches!(self, NodeId::Range(..))
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self, NodeId::Empty(..))
    }

    /// Graph position of words and empty nodes; ranges are not graph nodes.
    pub fn as_head_ref(&self) -> Option<HeadRef> {
        match *self {
            NodeId::Word(w) => Some(HeadRef::word(w)),
            NodeId::Empty(w, e) => Some(HeadRef::empty(w, e)),
            NodeId::Range(..) => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Word(w) => write!(f, "{}", w),
            NodeId::Range(b, e) => write!(f, "{}-{}", b, e),
            NodeId::Empty(w, e) => write!(f, "{}.{}", w, e),
        }
    }
}

impl FromStr for NodeId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(node_id)(s)
            .map(|(_, id)| id)
            .map_err(|_| IdError::Node(s.to_string()))
    }
}

/// Head of an edge: the root `0`, a word `n`, or an empty node `n.m`.
///
/// Ordering is numeric, so `1 < 1.1 < 1.2 < 2 < 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct HeadRef {
    pub word: u32,
    /// 0 when the reference points at a word (or the root).
    pub empty: u32,
}

impl HeadRef {
    pub const ROOT: HeadRef = HeadRef { word: 0, empty: 0 };

    pub const fn word(word: u32) -> Self {
        Self { word, empty: 0 }
    }

    pub const fn empty(word: u32, empty: u32) -> Self {
        Self { word, empty }
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    pub fn is_empty_node(&self) -> bool {
        self.empty != 0
    }

    /// Parses a basic HEAD value (`0` or a positive word number).
    pub fn parse_basic(s: &str) -> Result<Self, IdError> {
        all_consuming(basic_head)(s)
            .map(|(_, h)| h)
            .map_err(|_| IdError::Head(s.to_string()))
    }
}

impl Ord for HeadRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.word
            .cmp(&other.word)
            .then_with(|| self.empty.cmp(&other.empty))
    }
}

impl PartialOrd for HeadRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for HeadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.empty == 0 {
            write!(f, "{}", self.word)
        } else {
            write!(f, "{}.{}", self.word, self.empty)
        }
    }
}

impl FromStr for HeadRef {
    type Err = IdError;

    /// Parses an enhanced head reference (`0`, `n` or `n.m`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(enhanced_head)(s)
            .map(|(_, h)| h)
            .map_err(|_| IdError::Head(s.to_string()))
    }
}

/// `[1-9][0-9]*`
fn positive(input: &str) -> IResult<&str, u32> {
    map_res(recognize(pair(one_of("123456789"), digit0)), |s: &str| {
        s.parse::<u32>()
    })(input)
}

/// `[0-9]+`
fn natural(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

fn node_id(input: &str) -> IResult<&str, NodeId> {
    alt((
        map(separated_pair(natural, char('.'), positive), |(w, e)| {
            NodeId::Empty(w, e)
        }),
        map(separated_pair(positive, char('-'), positive), |(b, e)| {
            NodeId::Range(b, e)
        }),
        map(positive, NodeId::Word),
    ))(input)
}

fn basic_head(input: &str) -> IResult<&str, HeadRef> {
    alt((map(tag("0"), |_| HeadRef::ROOT), map(positive, HeadRef::word)))(input)
}

fn enhanced_head(input: &str) -> IResult<&str, HeadRef> {
    map(
        pair(
            alt((map(tag("0"), |_| 0), positive)),
            opt(preceded(char('.'), positive)),
        ),
        |(w, e)| HeadRef::empty(w, e.unwrap_or(0)),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_shapes() {
        assert_eq!("7".parse::<NodeId>(), Ok(NodeId::Word(7)));
        assert_eq!("3-4".parse::<NodeId>(), Ok(NodeId::Range(3, 4)));
        assert_eq!("0.1".parse::<NodeId>(), Ok(NodeId::Empty(0, 1)));
        assert_eq!("12.3".parse::<NodeId>(), Ok(NodeId::Empty(12, 3)));
    }

    #[test]
    fn test_node_id_rejects_malformed() {
        for bad in ["0", "01", "1.0", "1-", "-1", "1.2.3", "a", "", " 1", "1 "] {
            assert!(bad.parse::<NodeId>().is_err(), "{} should not parse", bad);
        }
    }

    #[test]
    fn test_node_id_display_round_trip() {
        for s in ["1", "10-11", "4.2"] {
            assert_eq!(s.parse::<NodeId>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn test_head_ref_order_is_numeric() {
        let mut heads: Vec<HeadRef> = ["10", "2", "1.2", "0", "1", "1.1"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        heads.sort();
        let rendered: Vec<String> = heads.iter().map(|h| h.to_string()).collect();
        assert_eq!(rendered, ["0", "1", "1.1", "1.2", "2", "10"]);
    }

    #[test]
    fn test_basic_head_rejects_decimal() {
        assert_eq!(HeadRef::parse_basic("0"), Ok(HeadRef::ROOT));
        assert_eq!(HeadRef::parse_basic("5"), Ok(HeadRef::word(5)));
        assert!(HeadRef::parse_basic("5.1").is_err());
        assert!(HeadRef::parse_basic("_").is_err());
        assert!(HeadRef::parse_basic("00").is_err());
    }

    #[test]
    fn test_enhanced_head_accepts_empty_node_before_first_word() {
        assert_eq!("0.1".parse::<HeadRef>(), Ok(HeadRef::empty(0, 1)));
        assert_eq!("3.2".parse::<HeadRef>(), Ok(HeadRef::empty(3, 2)));
        assert!("3.0".parse::<HeadRef>().is_err());
        assert!("03".parse::<HeadRef>().is_err());
    }
}
