//! Classification of `#` comment lines.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, eof, peek, rest},
    sequence::{preceded, tuple},
    IResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comment<'a> {
    /// `# sent_id = X`
    SentId(&'a str),
    /// Starts like a sent_id line but is not one.
    MalformedSentId,
    /// `# text = ...`, value untrimmed at the end.
    Text(&'a str),
    NewDoc,
    NewPar,
    Other,
}

fn sent_id(input: &str) -> IResult<&str, &str> {
    all_consuming(preceded(
        tuple((tag("# sent_id"), multispace0, char('='), multispace0)),
        take_till1(char::is_whitespace),
    ))(input)
}

fn text(input: &str) -> IResult<&str, &str> {
    preceded(
        tuple((char('#'), multispace0, tag("text"), multispace0, char('='), multispace0)),
        rest,
    )(input)
}

fn marker<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(
        tuple((char('#'), multispace0, tag(name))),
        peek(alt((eof, multispace1))),
    )
}

pub fn classify(line: &str) -> Comment<'_> {
    if let Ok((_, id)) = sent_id(line) {
        return Comment::SentId(id);
    }
    if line.starts_with("# sent_id") || line.starts_with("#sent_id") {
        return Comment::MalformedSentId;
    }
    if let Ok((_, value)) = text(line) {
        if !value.is_empty() {
            return Comment::Text(value);
        }
    }
    if marker("newdoc")(line).is_ok() {
        return Comment::NewDoc;
    }
    if marker("newpar")(line).is_ok() {
        return Comment::NewPar;
    }
    Comment::Other
}
