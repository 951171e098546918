//! Semantic types assigned by the type checker.
//!
//! Scalars compare structurally; struct types are nominal and compare by the
//! name of their declaration (struct declarations only live in the global
//! scope, so the name is the identity). `Str` is only ever the type of a
//! string literal.

use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq)]
pub enum SemType {
  Int,
  Bool,
  Void,
  Str,
  /// The type of a function name.
  Fn { params: Vec<SemType>, ret: Box<SemType> },
  /// The type of a struct declaration's name.
  StructDef(String),
  /// The type of a variable declared with `struct <name>`.
  StructVar(String),
  /// Assigned wherever a rule already failed; suppresses cascading errors.
  Error,
}

impl SemType {
  pub fn is_int(&self) -> bool {
    matches!(self, SemType::Int)
  }

  pub fn is_bool(&self) -> bool {
    matches!(self, SemType::Bool)
  }

  pub fn is_void(&self) -> bool {
    matches!(self, SemType::Void)
  }

  pub fn is_str(&self) -> bool {
    matches!(self, SemType::Str)
  }

  pub fn is_fn(&self) -> bool {
    matches!(self, SemType::Fn { .. })
  }

  pub fn is_struct_def(&self) -> bool {
    matches!(self, SemType::StructDef(_))
  }

  pub fn is_struct_var(&self) -> bool {
    matches!(self, SemType::StructVar(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, SemType::Error)
  }
}

impl Display for SemType {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      SemType::Int => write!(f, "int"),
      SemType::Bool => write!(f, "bool"),
      SemType::Void => write!(f, "void"),
      SemType::Str => write!(f, "string"),
      SemType::Fn { params, ret } => {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        write!(f, "{}->{}", params.join(","), ret)
      }
      SemType::StructDef(name) => write!(f, "struct {}", name),
      SemType::StructVar(name) => write!(f, "struct {}", name),
      SemType::Error => write!(f, "error"),
    }
  }
}
