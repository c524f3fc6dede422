//! sqldoc error handling.
//!
//! Everything that stops a run is a [`DoctestError`]. Test failures are not
//! errors: they are counted in the run summary and the run carries on.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Names a piece of text so diagnostics can point into it.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

/// Fatal conditions for a doctest run.
#[derive(Debug, Error, Diagnostic)]
pub enum DoctestError {
    #[error("could not read {}", path.display())]
    #[diagnostic(code(sqldoc::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {keyword} annotation for the query on line {line}: {message}")]
    #[diagnostic(
        code(sqldoc::annotation),
        help("expected rows look like [(1, 'a'), (2, NULL)]; expected errors look like (OperationalError, 'message')")
    )]
    Annotation {
        keyword: &'static str,
        line: usize,
        message: String,
        #[source_code]
        src: Arc<NamedSource<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("setup script failed: {source}")]
    #[diagnostic(
        code(sqldoc::setup),
        help("setup statements must run cleanly; the test file itself is broken")
    )]
    Setup {
        script: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("query on line {line} failed: {source}")]
    #[diagnostic(
        code(sqldoc::query),
        help("annotate the query with `-- RAISES (ErrorKind, 'message')` if the failure is expected")
    )]
    Query {
        line: usize,
        query: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("could not open the in-memory database: {0}")]
    #[diagnostic(code(sqldoc::engine))]
    Engine(#[source] rusqlite::Error),

    #[error("{failed} of {total} tests failed")]
    #[diagnostic(code(sqldoc::failures))]
    Failures { failed: usize, total: usize },
}

impl DoctestError {
    /// Short machine-friendly name of the error category.
    pub fn category(&self) -> &'static str {
        match self {
            DoctestError::Io { .. } => "io",
            DoctestError::Annotation { .. } => "annotation",
            DoctestError::Setup { .. } => "setup",
            DoctestError::Query { .. } => "query",
            DoctestError::Engine(_) => "engine",
            DoctestError::Failures { .. } => "failures",
        }
    }
}
