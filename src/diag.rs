//! The diagnostic sink.
//!
//! A monotonic recorder: every semantic error is formatted, printed to
//! stderr right away, and remembered. The driver polls [`ErrorLog::seen`]
//! between phases and refuses to start the next one once anything was
//! recorded. Nothing is ever removed.

use crate::source::Pos;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
  pub pos: Pos,
  pub message: String,
}

impl Diagnostic {
  pub fn render(&self) -> String {
    format!("{} ***ERROR*** {}", self.pos, self.message)
  }
}

#[derive(Default)]
pub struct ErrorLog {
  entries: Vec<Diagnostic>,
}

impl ErrorLog {
  pub fn new() -> ErrorLog {
    ErrorLog::default()
  }

  /// Record a fatal semantic error. Compilation continues inside the
  /// current phase so later independent errors still surface.
  pub fn fatal(&mut self, pos: Pos, message: &str) {
    let diag = Diagnostic { pos, message: message.to_string() };
    eprintln!("{}", diag.render());
    self.entries.push(diag);
  }

  /// True once any error has been recorded.
  pub fn seen(&self) -> bool {
    !self.entries.is_empty()
  }

  pub fn entries(&self) -> &[Diagnostic] {
    &self.entries
  }
}
