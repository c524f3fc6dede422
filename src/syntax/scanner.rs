//! Line scanner and test block extractor.
//!
//! Walks an annotated SQL file line by line and cuts it into [`TestCase`]s:
//!
//! ```sql
//! CREATE TABLE t(x);            -- setup
//! INSERT INTO t VALUES (1);     -- setup
//! SELECT x FROM t;              -- test query
//! -- EQUALS [(1,)]              -- annotation
//! ```
//!
//! Lines keep their terminators, so `setup_script + query` of every case,
//! in order, spells out the file minus the annotation lines.

use crate::errors::{DoctestError, SourceContext};
use crate::syntax::literal::{self, LiteralError};
use crate::test::{TestCase, TestKind};
use tracing::debug;

/// Leading keywords that make a statement a test query.
pub const QUERY_KEYWORDS: [&str; 3] = ["SELECT", "VALUES", "WITH"];

const LINE_COMMENT: &str = "--";
const ANNOTATION_PREFIX: &str = "-- ";
const BLOCK_COMMENT_OPEN: &str = "/*";
const BLOCK_COMMENT_CLOSE: &str = "*/";
const TERMINATOR: char = ';';

/// Scanner bookkeeping between emitted test cases.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanState {
    pub in_comment: bool,
    pub in_statement: bool,
    /// First line of the current setup script
    pub block_start: usize,
    /// First line of the pending test query, if one has started
    pub query_start: Option<usize>,
}

/// Lazy iterator over the test cases of one file.
#[derive(Debug)]
pub struct TestBlocks<'a> {
    name: String,
    lines: Vec<&'a str>,
    cursor: usize,
    state: ScanState,
    done: bool,
}

/// Starts scanning `source`. `name` labels diagnostics.
pub fn extract_tests<'a>(name: impl Into<String>, source: &'a str) -> TestBlocks<'a> {
    TestBlocks {
        name: name.into(),
        lines: source.split_inclusive('\n').collect(),
        cursor: 0,
        state: ScanState::default(),
        done: false,
    }
}

impl TestBlocks<'_> {
    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn emit(&mut self, query_start: usize, query_end: usize) -> Result<TestCase, DoctestError> {
        let setup_script = self.lines[self.state.block_start..query_start].concat();
        let query = self.lines[query_start..=query_end].concat();

        let kind = self
            .lines
            .get(query_end + 1)
            .and_then(|line| annotation_kind(line));

        let expected = match kind {
            Some(kind @ (TestKind::Equals | TestKind::Raises)) => {
                let text = self.take_answer(kind);
                match literal::parse_expected(kind, &text) {
                    Ok(expected) => Some(expected),
                    Err(err) => {
                        self.done = true;
                        return Err(self.annotation_error(kind, query_start, text, err));
                    }
                }
            }
            // DEBUG lines stay in place and read as plain comments
            _ => None,
        };

        self.state.block_start = self.cursor;
        self.state.query_start = None;

        Ok(TestCase {
            setup_script,
            query,
            expected,
            kind,
            line: query_start + 1,
        })
    }

    /// Consumes the annotation line and any `--` continuation lines after it.
    fn take_answer(&mut self, kind: TestKind) -> String {
        let header_len = ANNOTATION_PREFIX.len() + kind.keyword().len();
        let header = self.lines[self.cursor];
        let mut parts = vec![header[header_len..].trim()];
        self.cursor += 1;
        while let Some(&line) = self.lines.get(self.cursor) {
            let Some(rest) = line.strip_prefix(LINE_COMMENT) else {
                break;
            };
            parts.push(rest.trim());
            self.cursor += 1;
        }
        parts.join("\n")
    }

    fn annotation_error(
        &self,
        kind: TestKind,
        query_start: usize,
        text: String,
        err: LiteralError,
    ) -> DoctestError {
        let line = query_start + 1;
        let offset = err.offset.min(text.len());
        let source = SourceContext::new(format!("{}:{} ({})", self.name, line, kind), text);
        DoctestError::Annotation {
            keyword: kind.keyword(),
            line,
            message: err.message,
            src: source.to_named_source(),
            span: (offset, 0).into(),
        }
    }

    fn finish(&mut self) {
        self.done = true;
        if self.state.in_comment || self.state.in_statement {
            debug!(
                "{}: ignoring incomplete block starting at line {}",
                self.name,
                self.state.block_start + 1
            );
        }
    }
}

impl Iterator for TestBlocks<'_> {
    type Item = Result<TestCase, DoctestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.cursor < self.lines.len() {
            let i = self.cursor;
            self.cursor += 1;

            let line = strip_line_comment(self.lines[i]);
            if line.is_empty() {
                continue;
            }

            if line.starts_with(BLOCK_COMMENT_OPEN) {
                self.state.in_comment = true;
            }
            if line.ends_with(BLOCK_COMMENT_CLOSE) {
                self.state.in_comment = false;
                continue;
            }
            if self.state.in_comment {
                continue;
            }

            if !self.state.in_statement {
                self.state.in_statement = true;
                if is_query_start(line) {
                    self.state.query_start = Some(i);
                }
            }

            if !line.ends_with(TERMINATOR) {
                continue;
            }
            self.state.in_statement = false;

            let Some(query_start) = self.state.query_start else {
                continue;
            };
            return Some(self.emit(query_start, i));
        }

        self.finish();
        None
    }
}

// ============================================================================
// LINE CLASSIFICATION
// ============================================================================

/// Code part of a line: everything before `--`, trimmed.
fn strip_line_comment(line: &str) -> &str {
    line.split_once(LINE_COMMENT)
        .map_or(line, |(code, _)| code)
        .trim()
}

fn is_query_start(line: &str) -> bool {
    let keyword = line
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    QUERY_KEYWORDS
        .iter()
        .any(|k| k.eq_ignore_ascii_case(keyword))
}

fn annotation_kind(line: &str) -> Option<TestKind> {
    let rest = line.strip_prefix(ANNOTATION_PREFIX)?;
    TestKind::ALL
        .into_iter()
        .find(|kind| rest.starts_with(kind.keyword()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::Expected;
    use crate::value::{Row, Scalar};

    fn collect(source: &str) -> Vec<TestCase> {
        extract_tests("test.sql", source)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_strip_line_comment() {
        assert_eq!(strip_line_comment("SELECT 1; -- note\n"), "SELECT 1;");
        assert_eq!(strip_line_comment("-- only a comment\n"), "");
        assert_eq!(strip_line_comment("   \n"), "");
    }

    #[test]
    fn test_is_query_start() {
        assert!(is_query_start("SELECT 1;"));
        assert!(is_query_start("select x"));
        assert!(is_query_start("VALUES(1);"));
        assert!(is_query_start("WITH t AS (SELECT 1)"));
        assert!(!is_query_start("CREATE TABLE t(x);"));
        assert!(!is_query_start("SELECTED"));
    }

    #[test]
    fn test_annotation_kind() {
        assert_eq!(annotation_kind("-- EQUALS [(1,)]\n"), Some(TestKind::Equals));
        assert_eq!(annotation_kind("-- RAISES (E, 'm')"), Some(TestKind::Raises));
        assert_eq!(annotation_kind("-- DEBUG\n"), Some(TestKind::Debug));
        assert_eq!(annotation_kind("--EQUALS [(1,)]"), None);
        assert_eq!(annotation_kind("-- just a note"), None);
    }

    #[test]
    fn extracts_a_single_equals_test() {
        let cases = collect("SELECT 1 + 1;\n-- EQUALS [(2,)]\n");
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].query.trim(), "SELECT 1 + 1;");
        assert_eq!(cases[0].setup_script, "");
        assert_eq!(cases[0].kind, Some(TestKind::Equals));
        assert_eq!(
            cases[0].expected,
            Some(Expected::Rows(vec![Row::new(vec![Scalar::Integer(2)])]))
        );
        assert_eq!(cases[0].line, 1);
    }

    #[test]
    fn multi_line_queries_and_answers() {
        let source = "\
SELECT x,
       y
FROM t;
-- EQUALS [
--   (1, 2),
--   (3, 4),
-- ]
SELECT 5;
";
        let cases = collect(source);
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].query, "SELECT x,\n       y\nFROM t;\n");
        let Some(Expected::Rows(rows)) = &cases[0].expected else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(cases[1].setup_script, "");
        assert_eq!(cases[1].query, "SELECT 5;\n");
        assert_eq!(cases[1].line, 8);
    }

    #[test]
    fn non_query_statements_become_setup() {
        let source =
            "CREATE TABLE t(x);\nINSERT INTO t VALUES (1);\nSELECT x FROM t;\n-- EQUALS [(1,)]\n";
        let cases = collect(source);
        assert_eq!(cases.len(), 1);
        assert_eq!(
            cases[0].setup_script,
            "CREATE TABLE t(x);\nINSERT INTO t VALUES (1);\n"
        );
        assert_eq!(cases[0].line, 3);
    }

    #[test]
    fn block_comments_are_skipped() {
        let source = "/*\nSELECT 'hidden';\n*/\n/* SELECT 2; */\nSELECT 1;\n-- EQUALS [(1,)]\n";
        let cases = collect(source);
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].query, "SELECT 1;\n");
        assert!(cases[0].setup_script.contains("hidden"));
    }

    #[test]
    fn unannotated_query_has_no_answer() {
        let cases = collect("SELECT 1;\nSELECT 2;\n-- EQUALS [(2,)]\n");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].expected, None);
        assert_eq!(cases[0].kind, None);
        assert_eq!(cases[1].kind, Some(TestKind::Equals));
    }

    #[test]
    fn query_on_last_line_has_no_answer() {
        let cases = collect("SELECT 1;");
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].expected, None);
    }

    #[test]
    fn debug_annotation_is_left_in_place() {
        let cases = collect("SELECT 1;\n-- DEBUG\nSELECT 2;\n");
        assert_eq!(cases[0].kind, Some(TestKind::Debug));
        assert_eq!(cases[0].expected, None);
        assert_eq!(cases[1].setup_script, "-- DEBUG\n");
    }

    #[test]
    fn raises_annotation_parses_error_spec() {
        let cases = collect(
            "SELECT * FROM missing;\n-- RAISES (OperationalError, \"no such table: missing\")\n",
        );
        assert_eq!(
            cases[0].expected,
            Some(Expected::Error {
                kind: "OperationalError".into(),
                message: "no such table: missing".into()
            })
        );
    }

    #[test]
    fn unterminated_trailing_block_is_dropped() {
        let mut blocks = extract_tests("t.sql", "SELECT 1;\n-- EQUALS [(1,)]\nSELECT 2\n");
        assert!(blocks.next().is_some());
        assert!(blocks.next().is_none());
        assert!(blocks.state().in_statement);

        let cases = collect("SELECT 1;\n/* never closed\nSELECT 2;\n");
        assert_eq!(cases.len(), 1);
    }

    #[test]
    fn malformed_annotation_is_an_error() {
        let mut blocks = extract_tests("t.sql", "SELECT 1;\n-- EQUALS [(1,]\nSELECT 2;\n");
        let err = blocks.next().unwrap().unwrap_err();
        assert!(matches!(err, DoctestError::Annotation { line: 1, keyword: "EQUALS", .. }));
        assert!(blocks.next().is_none());
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(collect("").is_empty());
        assert!(collect("\n\n-- nothing here\n").is_empty());
    }
}
