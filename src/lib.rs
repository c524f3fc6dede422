pub use crate::errors::DoctestError;
pub use crate::test::{Expected, HarnessConfig, RunSummary, TestCase, TestKind, TestResult};

pub mod cli;
pub mod engine;
pub mod errors;
pub mod syntax;
pub mod value;
