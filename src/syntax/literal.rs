//! Restricted literal parser for expected answers.
//!
//! Annotation text is data, never code: only row lists of plain scalars and
//! `(error_kind, message)` pairs are accepted.

use crate::test::{Expected, TestKind};
use crate::value::{Row, Scalar};
use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "syntax/literal.pest"]
struct LiteralParser;

/// Why an annotation could not be read, and where in its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralError {
    pub message: String,
    /// Byte offset into the annotation text
    pub offset: usize,
}

impl std::fmt::Display for LiteralError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (at offset {})", self.message, self.offset)
    }
}

impl std::error::Error for LiteralError {}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses the text of an EQUALS or RAISES annotation.
///
/// DEBUG annotations carry no answer and are rejected here.
pub fn parse_expected(kind: TestKind, text: &str) -> Result<Expected, LiteralError> {
    match kind {
        TestKind::Equals => parse_rows(text).map(Expected::Rows),
        TestKind::Raises => {
            let (kind, message) = parse_error_spec(text)?;
            Ok(Expected::Error { kind, message })
        }
        TestKind::Debug => Err(LiteralError {
            message: "DEBUG annotations take no expected value".into(),
            offset: 0,
        }),
    }
}

/// Parses `[(a, b), (c, d)]`.
pub fn parse_rows(text: &str) -> Result<Vec<Row>, LiteralError> {
    let answer = parse_rule(Rule::rows_answer, text)?;
    let rows = first_inner(answer, Rule::rows)?;
    rows.into_inner().map(build_row).collect()
}

/// Parses `(ErrorKind, 'message')`, returning the bare kind name and message.
pub fn parse_error_spec(text: &str) -> Result<(String, String), LiteralError> {
    let answer = parse_rule(Rule::error_answer, text)?;
    let spec = first_inner(answer, Rule::error_spec)?;
    let offset = spec.as_span().start();
    let mut parts = spec.into_inner();
    let (Some(kind), Some(message)) = (parts.next(), parts.next()) else {
        return Err(LiteralError {
            message: "expected (error_kind, message)".into(),
            offset,
        });
    };

    let kind = match kind.as_rule() {
        // sqlite3.OperationalError -> OperationalError
        Rule::path => kind
            .as_str()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_string(),
        _ => unescape_string(kind)?,
    };
    Ok((kind, unescape_string(message)?))
}

// ============================================================================
// BUILDERS
// ============================================================================

fn build_row(pair: Pair<Rule>) -> Result<Row, LiteralError> {
    let offset = pair.as_span().start();
    let mut values = Vec::new();
    let mut trailing_comma = false;
    for item in pair.into_inner() {
        if item.as_rule() == Rule::trailing_comma {
            trailing_comma = true;
        } else {
            values.push(build_scalar(item)?);
        }
    }
    if values.len() == 1 && !trailing_comma {
        return Err(LiteralError {
            message: "a one-column row needs a trailing comma, as in (x,)".into(),
            offset,
        });
    }
    Ok(Row::new(values))
}

fn build_scalar(pair: Pair<Rule>) -> Result<Scalar, LiteralError> {
    let offset = pair.as_span().start();
    let text = pair.as_str();
    match pair.as_rule() {
        Rule::null => Ok(Scalar::Null),
        Rule::boolean => Ok(Scalar::Integer(i64::from(text == "True"))),
        Rule::integer => text.parse::<i64>().map(Scalar::Integer).map_err(|_| LiteralError {
            message: format!("integer out of range: {}", text),
            offset,
        }),
        Rule::real => text.parse::<f64>().map(Scalar::Real).map_err(|_| LiteralError {
            message: format!("invalid number: {}", text),
            offset,
        }),
        Rule::string => unescape_string(pair).map(Scalar::Text),
        Rule::blob => decode_hex(pair).map(Scalar::Blob),
        other => Err(LiteralError {
            message: format!("unexpected {:?}", other),
            offset,
        }),
    }
}

fn unescape_string(pair: Pair<Rule>) -> Result<String, LiteralError> {
    let offset = pair.as_span().start();
    pair.into_inner()
        .find(|p| matches!(p.as_rule(), Rule::single_inner | Rule::double_inner))
        .map(|p| unescape(p.as_str()))
        .ok_or(LiteralError {
            message: "malformed string literal".into(),
            offset,
        })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(c @ ('\\' | '\'' | '"')) => out.push(c),
            // Unknown escapes are kept as written.
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn decode_hex(pair: Pair<Rule>) -> Result<Vec<u8>, LiteralError> {
    let offset = pair.as_span().start();
    let digits = pair
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or_default();
    if digits.len() % 2 != 0 {
        return Err(LiteralError {
            message: "blob literal needs an even number of hex digits".into(),
            offset,
        });
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| LiteralError {
                message: format!("invalid hex digits: {}", &digits[i..i + 2]),
                offset: offset + i,
            })
        })
        .collect()
}

// ============================================================================
// HELPERS
// ============================================================================

fn parse_rule(rule: Rule, text: &str) -> Result<Pair<'_, Rule>, LiteralError> {
    let mut pairs = LiteralParser::parse(rule, text).map_err(convert_parse_error)?;
    pairs.next().ok_or(LiteralError {
        message: "empty answer".into(),
        offset: 0,
    })
}

fn first_inner(pair: Pair<'_, Rule>, expected: Rule) -> Result<Pair<'_, Rule>, LiteralError> {
    let offset = pair.as_span().start();
    pair.into_inner()
        .find(|p| p.as_rule() == expected)
        .ok_or(LiteralError {
            message: format!("missing {:?}", expected),
            offset,
        })
}

fn convert_parse_error(error: Error<Rule>) -> LiteralError {
    let offset = match error.location {
        pest::error::InputLocation::Pos(pos) => pos,
        pest::error::InputLocation::Span((start, _)) => start,
    };
    let message = match &error.variant {
        pest::error::ErrorVariant::ParsingError { positives, .. }
            if positives.contains(&Rule::trailing_comma) || positives.contains(&Rule::row) =>
        {
            "expected a row such as (1, 'a') or a closing bracket".to_string()
        }
        pest::error::ErrorVariant::ParsingError { positives, .. }
            if positives.contains(&Rule::path) =>
        {
            "expected an error kind such as OperationalError".to_string()
        }
        pest::error::ErrorVariant::ParsingError { positives, .. }
            if positives.contains(&Rule::string) =>
        {
            "expected a quoted string".to_string()
        }
        other => other.message().into_owned(),
    };
    LiteralError { message, offset }
}
