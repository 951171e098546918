//! Failure channel for everything that is not a user-facing semantic
//! diagnostic: I/O trouble, syntax errors, and internal invariant
//! violations. Semantic diagnostics go through [`crate::diag::ErrorLog`]
//! instead and only surface here as a `PhaseFailed` marker once the driver
//! refuses to continue.

use snafu::Snafu;

use crate::source::Pos;
use crate::sym_table::SymTableError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(display("cannot read {path}: {source}"))]
  ReadInput { path: String, source: std::io::Error },

  #[snafu(display("cannot write {path}: {source}"))]
  WriteOutput { path: String, source: std::io::Error },

  #[snafu(display("{pos} syntax error: {message}"))]
  Parse { pos: Pos, message: String },

  /// Diagnostics were recorded; the sink already printed them.
  #[snafu(display("{phase} reported errors"))]
  PhaseFailed { phase: &'static str },

  #[snafu(display("internal error: {source}"))]
  Internal { source: SymTableError },
}

impl From<SymTableError> for CompileError {
  fn from(source: SymTableError) -> CompileError {
    CompileError::Internal { source }
  }
}
