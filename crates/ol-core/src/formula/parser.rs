//! Nom grammar for naming formulas
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := factor (('*' | '/') factor)*
//! factor  := string | '(' expr ')' | field | number | '-' factor
//! field   := ident ('.' ident)*
//! string  := '\'' [^']* '\'' | '"' [^"]* '"'
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_until, take_while},
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, recognize},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded},
};

use super::FormulaError;

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn from_char(c: char) -> Self {
        match c {
            '+' => Self::Add,
            '-' => Self::Sub,
            '*' => Self::Mul,
            _ => Self::Div,
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
        }
    }
}

/// Parsed formula
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Text(String),
    Number(f64),
    /// Dotted field path into the context
    Field(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Parse a whole formula
pub fn parse_formula(formula: &str) -> Result<Expr, FormulaError> {
    match all_consuming(delimited(multispace0, expr, multispace0))(formula) {
        Ok((_, parsed)) => Ok(parsed),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => Err(FormulaError::Parse {
            formula: formula.to_string(),
            offset: formula.len() - e.input.len(),
        }),
        Err(nom::Err::Incomplete(_)) => Err(FormulaError::Parse {
            formula: formula.to_string(),
            offset: formula.len(),
        }),
    }
}

fn expr(input: &str) -> IResult<&str, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(operator("+-"), term))(input)?;
    Ok((input, fold(first, rest)))
}

fn term(input: &str) -> IResult<&str, Expr> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0(pair(operator("*/"), factor))(input)?;
    Ok((input, fold(first, rest)))
}

/// Left-associative fold of an operator chain
fn fold(first: Expr, rest: Vec<(char, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op: BinaryOp::from_char(op),
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn operator<'a>(ops: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, char> {
    delimited(multispace0, one_of(ops), multispace0)
}

fn factor(input: &str) -> IResult<&str, Expr> {
    // Fields before numbers so `nan` or `inf` read as identifiers
    delimited(
        multispace0,
        alt((string_literal, parens, field, number, negation)),
        multispace0,
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, Expr> {
    map(
        alt((
            delimited(char('\''), take_until("'"), char('\'')),
            delimited(char('"'), take_until("\""), char('"')),
        )),
        |s: &str| Expr::Text(s.to_string()),
    )(input)
}

fn parens(input: &str) -> IResult<&str, Expr> {
    delimited(char('('), expr, char(')'))(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn field(input: &str) -> IResult<&str, Expr> {
    map(recognize(separated_list1(char('.'), identifier)), |s: &str| {
        Expr::Field(s.to_string())
    })(input)
}

fn number(input: &str) -> IResult<&str, Expr> {
    map(double, Expr::Number)(input)
}

fn negation(input: &str) -> IResult<&str, Expr> {
    map(preceded(char('-'), factor), |e| Expr::Neg(Box::new(e)))(input)
}
