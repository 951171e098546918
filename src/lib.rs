//! Crate root: wires together the compilation pipeline.
//!
//! The phases run in a fixed order over one shared AST:
//! - the lalrpop-generated parser builds the tree (`src/mini.lalrpop`),
//! - `name_analysis` binds identifiers and assigns storage,
//! - `type_check` validates every expression and statement,
//! - `mips_gen` lowers the tree to SPIM-flavoured MIPS text.
//!
//! Semantic errors accumulate in a [`diag::ErrorLog`]; after each phase the
//! driver refuses to continue if anything was recorded.

use lalrpop_util::lalrpop_mod;

pub mod ast;
pub mod diag;
pub mod error;
pub mod mips_gen;
pub mod name_analysis;
pub mod source;
pub mod sym_table;
pub mod type_check;
pub mod types;
pub mod unparse;

lalrpop_mod!(mini);

use diag::ErrorLog;
use error::{CompileError, CompileResult};
use source::{LineIndex, Pos};

/// Parse Mini source text into an AST.
pub fn parse(source_text: &str) -> CompileResult<ast::Program> {
  let lines = LineIndex::new(source_text);
  mini::ProgramParser::new()
    .parse(&lines, source_text)
    .map_err(|err| describe_parse_error(&lines, err))
}

/// Compile source text all the way to assembly text. Diagnostics are
/// reported through `diag`; the `Err` value only says which phase refused
/// to continue.
pub fn compile_with_log(source_text: &str, diag: &mut ErrorLog) -> CompileResult<String> {
  let mut program = parse(source_text)?;

  name_analysis::analyze(&mut program, diag)?;
  if diag.seen() {
    return Err(CompileError::PhaseFailed { phase: "name analysis" });
  }

  type_check::check(&program, diag);
  if diag.seen() {
    return Err(CompileError::PhaseFailed { phase: "type checking" });
  }

  Ok(mips_gen::gen_program(&program).dump())
}

/// Compile source text with a throwaway diagnostic log.
pub fn compile(source_text: &str) -> CompileResult<String> {
  let mut diag = ErrorLog::new();
  compile_with_log(source_text, &mut diag)
}

fn describe_parse_error(
  lines: &LineIndex,
  err: lalrpop_util::ParseError<usize, lalrpop_util::lexer::Token<'_>, &str>,
) -> CompileError {
  use lalrpop_util::ParseError::*;
  let (pos, message) = match err {
    InvalidToken { location } => (lines.pos(location), "invalid token".to_string()),
    UnrecognizedEof { location, .. } => {
      (lines.pos(location), "unexpected end of input".to_string())
    }
    UnrecognizedToken { token: (start, token, _), .. } => {
      (lines.pos(start), format!("unexpected token `{}`", token))
    }
    ExtraToken { token: (start, token, _) } => {
      (lines.pos(start), format!("extra token `{}`", token))
    }
    User { error } => (Pos::none(), error.to_string()),
  };
  CompileError::Parse { pos, message }
}
