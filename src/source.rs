//! Source positions.
//!
//! The lalrpop lexer reports byte offsets; diagnostics and AST leaves want
//! `line:col` pairs. A [`LineIndex`] is built once per input and handed to
//! the parser as a grammar parameter.

use std::fmt::{Display, Formatter};

/// A 1-based line/column pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pos {
  pub line: u32,
  pub col: u32,
}

impl Pos {
  pub fn new(line: u32, col: u32) -> Pos {
    Pos { line, col }
  }

  /// The position used for program-level diagnostics such as a missing
  /// `main` function.
  pub fn none() -> Pos {
    Pos { line: 0, col: 0 }
  }
}

impl Display for Pos {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}", self.line, self.col)
  }
}

/// Maps byte offsets into a source buffer to line/column positions.
pub struct LineIndex {
  /// Byte offset of the start of each line, in ascending order.
  starts: Vec<usize>,
}

impl LineIndex {
  pub fn new(source: &str) -> LineIndex {
    let mut starts = vec![0];
    for (i, b) in source.bytes().enumerate() {
      if b == b'\n' {
        starts.push(i + 1);
      }
    }
    LineIndex { starts }
  }

  /// Position of the given byte offset. Columns count bytes from the
  /// start of the line.
  pub fn pos(&self, offset: usize) -> Pos {
    let line = match self.starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i - 1,
    };
    Pos {
      line: (line + 1) as u32,
      col: (offset - self.starts[line] + 1) as u32,
    }
  }
}
