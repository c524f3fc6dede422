//! Syntax module for annotated SQL files
//!
//! Two layers: the line scanner that cuts a file into test cases, and the
//! literal parser that reads the expected answers out of the annotations.

pub mod literal;
pub mod scanner;

pub use literal::{parse_expected, LiteralError};
pub use scanner::{extract_tests, ScanState, TestBlocks};
