// Message path parsing. Only the subset the reducer needs: topic, field access, slices, filters.
// Grammar: /topic.field[0:2]{id==3}.values

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{map, map_res, opt, recognize, value},
    multi::{many0, many0_count, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::error::PathParseError;

/// Literal operand of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
}

impl Literal {
    /// Compare against a JSON value from a message payload.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match (self, value) {
            (Literal::Number(n), serde_json::Value::Number(v)) => v.as_f64() == Some(*n),
            (Literal::String(s), serde_json::Value::String(v)) => s == v,
            (Literal::Bool(b), serde_json::Value::Bool(v)) => b == v,
            _ => false,
        }
    }
}

/// Filter operand: a literal, or a `$variable` resolved at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Literal(Literal),
    Variable(String),
}

/// One end of a slice. Negative indices count from the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliceBound {
    Index(i64),
    Variable(String),
}

/// Typed path operation applied after the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PathOp {
    Field(String),
    /// Inclusive slice; `[n]` parses as `start == end == n`. `None` is an open end.
    Slice {
        start: Option<SliceBound>,
        end: Option<SliceBound>,
    },
    Filter {
        path: Vec<String>,
        value: Operand,
    },
}

impl PathOp {
    /// True if the operation references a runtime-computed operand.
    pub fn is_dynamic(&self) -> bool {
        match self {
            PathOp::Field(_) => false,
            PathOp::Slice { start, end } => [start, end]
                .iter()
                .any(|bound| matches!(bound, Some(SliceBound::Variable(_)))),
            PathOp::Filter { value, .. } => matches!(value, Operand::Variable(_)),
        }
    }
}

/// A parsed message path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPath {
    pub topic_name: String,
    pub ops: Vec<PathOp>,
}

impl ParsedPath {
    pub fn is_dynamic(&self) -> bool {
        self.ops.iter().any(PathOp::is_dynamic)
    }
}

/// Path parser seam. The host may supply its own implementation.
pub trait PathParser {
    fn parse(&self, text: &str) -> Result<ParsedPath, PathParseError>;
}

/// Default parser for the message path grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessagePathParser;

impl PathParser for MessagePathParser {
    fn parse(&self, text: &str) -> Result<ParsedPath, PathParseError> {
        let input = text.trim();
        if input.is_empty() {
            return Err(PathParseError::Empty);
        }

        let (rest, topic_name) =
            topic(input).map_err(|_| PathParseError::MissingTopic(input.to_string()))?;
        let (rest, ops) = many0(part)(rest).map_err(|_| PathParseError::Trailing(rest.to_string()))?;

        if !rest.is_empty() {
            return Err(PathParseError::Trailing(rest.chars().take(32).collect()));
        }

        Ok(ParsedPath { topic_name, ops })
    }
}

// ============================================================================
// Nom Parser Combinators
// ============================================================================

fn name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

/// Topic name: `/a/b` or `a/b`.
fn topic(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(opt(char('/')), separated_list1(char('/'), name))),
        |s: &str| s.to_string(),
    )(input)
}

fn ident(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0_count(alt((alphanumeric1, tag("_")))),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

fn variable(input: &str) -> IResult<&str, String> {
    preceded(char('$'), ident)(input)
}

fn bound(input: &str) -> IResult<&str, SliceBound> {
    terminated(
        alt((
            map(integer, SliceBound::Index),
            map(variable, SliceBound::Variable),
        )),
        multispace0,
    )(input)
}

fn quoted(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('"'), take_until("\""), char('"')),
            delimited(char('\''), take_until("'"), char('\'')),
        )),
        |s: &str| s.to_string(),
    )(input)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::Bool(true), tag("true")),
        value(Literal::Bool(false), tag("false")),
        map(quoted, Literal::String),
        map(double, Literal::Number),
    ))(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    alt((
        map(variable, Operand::Variable),
        map(literal, Operand::Literal),
    ))(input)
}

/// `.field`
fn field(input: &str) -> IResult<&str, PathOp> {
    map(preceded(char('.'), ident), PathOp::Field)(input)
}

/// `[n]`, `[a:b]`, `[:]`, `[$i]`
fn bracket(input: &str) -> IResult<&str, PathOp> {
    delimited(
        pair(char('['), multispace0),
        alt((
            map(
                separated_pair(opt(bound), pair(char(':'), multispace0), opt(bound)),
                |(start, end)| PathOp::Slice { start, end },
            ),
            map(bound, |b| PathOp::Slice {
                start: Some(b.clone()),
                end: Some(b),
            }),
        )),
        char(']'),
    )(input)
}

/// `{a.b==literal}` or `{a==$var}`
fn filter(input: &str) -> IResult<&str, PathOp> {
    delimited(
        tuple((char('{'), multispace0, opt(char('.')))),
        map(
            separated_pair(
                separated_list1(char('.'), ident),
                tuple((multispace0, tag("=="), multispace0)),
                operand,
            ),
            |(path, value)| PathOp::Filter { path, value },
        ),
        pair(multispace0, char('}')),
    )(input)
}

fn part(input: &str) -> IResult<&str, PathOp> {
    alt((field, bracket, filter))(input)
}
