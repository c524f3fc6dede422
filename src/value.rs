//! Result values: the scalars SQLite hands back and the rows built from them.
//!
//! `Display` renders values in annotation syntax, so a failing comparison shows
//! text a user can paste straight back into an `-- EQUALS` line.

use rusqlite::types::ValueRef;
use std::fmt;

/// A single column value.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Scalar {
    /// Plain rendering used inside result tables: no quotes around text.
    pub fn to_cell(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Real(a), Scalar::Real(b)) => a == b,
            // 2 == 2.0
            (Scalar::Integer(i), Scalar::Real(r)) | (Scalar::Real(r), Scalar::Integer(i)) => {
                *i as f64 == *r
            }
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            (Scalar::Blob(a), Scalar::Blob(b)) => a == b,
            _ => false,
        }
    }
}

impl From<ValueRef<'_>> for Scalar {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Scalar::Null,
            ValueRef::Integer(i) => Scalar::Integer(i),
            ValueRef::Real(r) => Scalar::Real(r),
            ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()),
            ValueRef::Blob(bytes) => Scalar::Blob(bytes.to_vec()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "NULL"),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Real(r) => write!(f, "{:?}", r),
            Scalar::Text(s) => write_quoted(f, s),
            Scalar::Blob(bytes) => {
                write!(f, "X'")?;
                for b in bytes {
                    write!(f, "{:02X}", b)?;
                }
                write!(f, "'")
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "'")?;
    for c in s.chars() {
        match c {
            '\'' => write!(f, "\\'")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "'")
}

/// One result row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<Scalar>);

impl Row {
    pub fn new(values: Vec<Scalar>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Scalar] {
        &self.0
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        if self.0.len() == 1 {
            write!(f, ",")?;
        }
        write!(f, ")")
    }
}

/// Renders a row list the way an `-- EQUALS` annotation spells it.
pub fn format_rows(rows: &[Row]) -> String {
    let items: Vec<String> = rows.iter().map(Row::to_string).collect();
    format!("[{}]", items.join(", "))
}
