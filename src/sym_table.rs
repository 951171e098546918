//! Symbols and the scope-stack symbol table.
//!
//! The table is a transient scaffold used by name analysis: scopes nest
//! strictly LIFO and frames are discarded on exit. Symbols themselves are
//! reference counted because identifier nodes in the AST keep pointing at
//! them long after the frame that introduced them is gone.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use snafu::Snafu;

use crate::types::SemType;

#[derive(Debug, Snafu)]
pub enum SymTableError {
  #[snafu(display("no open scope to close"))]
  EmptyScope,

  #[snafu(display("`{name}` is already declared in this scope"))]
  DuplicateName { name: String },
}

/// Where a variable lives at run time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarLoc {
  /// Not yet assigned by name analysis.
  Unresolved,
  /// In `.data`, addressed through the label `_<name>`.
  Global,
  /// On the stack, at `offset($fp)`. The offset is the lowest address of
  /// the variable's allocation, so struct fields grow upward from it.
  Local { offset: i32 },
  /// Inside a struct, `offset` bytes above the struct's base address.
  Field { offset: i32 },
}

/// A variable, formal parameter, or struct field.
pub struct VarSym {
  pub ty: SemType,
  /// For variables of struct type, the symbol of the struct declaration.
  pub struct_def: Option<Rc<Symbol>>,
  pub loc: Cell<VarLoc>,
}

impl VarSym {
  pub fn scalar(ty: SemType) -> VarSym {
    VarSym { ty, struct_def: None, loc: Cell::new(VarLoc::Unresolved) }
  }

  pub fn of_struct(name: &str, struct_def: Rc<Symbol>) -> VarSym {
    VarSym {
      ty: SemType::StructVar(name.to_string()),
      struct_def: Some(struct_def),
      loc: Cell::new(VarLoc::Unresolved),
    }
  }

  /// Bytes this variable occupies.
  pub fn size(&self) -> i32 {
    match &self.struct_def {
      Some(def) => def.as_struct_def().map(|d| d.size).unwrap_or(4),
      None => 4,
    }
  }
}

/// A function name. The formal types are filled in after the formals have
/// been analysed, which happens after the symbol is already declared so
/// that recursive calls resolve.
pub struct FnSym {
  pub ret: SemType,
  pub params: RefCell<Vec<SemType>>,
}

impl FnSym {
  pub fn new(ret: SemType) -> FnSym {
    FnSym { ret, params: RefCell::new(Vec::new()) }
  }

  pub fn num_params(&self) -> usize {
    self.params.borrow().len()
  }

  pub fn fn_type(&self) -> SemType {
    SemType::Fn {
      params: self.params.borrow().clone(),
      ret: Box::new(self.ret.clone()),
    }
  }
}

/// A struct declaration: a frozen field table plus the total size of an
/// instance.
pub struct StructDefSym {
  pub name: String,
  pub size: i32,
  fields: HashMap<String, Rc<Symbol>>,
}

impl StructDefSym {
  pub fn new(name: String, fields: HashMap<String, Rc<Symbol>>, size: i32) -> StructDefSym {
    StructDefSym { name, fields, size }
  }

  pub fn field(&self, name: &str) -> Option<Rc<Symbol>> {
    self.fields.get(name).cloned()
  }
}

pub enum Symbol {
  Var(VarSym),
  Fn(FnSym),
  StructDef(StructDefSym),
}

impl Symbol {
  /// The semantic type an identifier bound to this symbol has.
  pub fn sem_type(&self) -> SemType {
    match self {
      Symbol::Var(var) => var.ty.clone(),
      Symbol::Fn(fun) => fun.fn_type(),
      Symbol::StructDef(def) => SemType::StructDef(def.name.clone()),
    }
  }

  pub fn as_var(&self) -> Option<&VarSym> {
    match self {
      Symbol::Var(var) => Some(var),
      _ => None,
    }
  }

  pub fn as_fn(&self) -> Option<&FnSym> {
    match self {
      Symbol::Fn(fun) => Some(fun),
      _ => None,
    }
  }

  pub fn as_struct_def(&self) -> Option<&StructDefSym> {
    match self {
      Symbol::StructDef(def) => Some(def),
      _ => None,
    }
  }

  /// True for variables declared with a struct type.
  pub fn is_struct_var(&self) -> bool {
    matches!(self, Symbol::Var(var) if var.struct_def.is_some())
  }
}

/// An ordered stack of scope frames, innermost last.
pub struct SymTable {
  scopes: Vec<HashMap<String, Rc<Symbol>>>,
}

impl SymTable {
  /// A table with the outermost scope already open.
  pub fn new() -> SymTable {
    SymTable { scopes: vec![HashMap::new()] }
  }

  pub fn open_scope(&mut self) {
    self.scopes.push(HashMap::new());
  }

  pub fn close_scope(&mut self) -> Result<(), SymTableError> {
    match self.scopes.pop() {
      Some(_) => Ok(()),
      None => Err(SymTableError::EmptyScope),
    }
  }

  /// Number of open frames; name analysis asserts this is balanced around
  /// every statement.
  pub fn depth(&self) -> usize {
    self.scopes.len()
  }

  /// Add `name` to the innermost frame.
  pub fn declare(&mut self, name: &str, sym: Rc<Symbol>) -> Result<(), SymTableError> {
    let scope = self.scopes.last_mut().ok_or(SymTableError::EmptyScope)?;
    if scope.contains_key(name) {
      return Err(SymTableError::DuplicateName { name: name.to_string() });
    }
    scope.insert(name.to_string(), sym);
    Ok(())
  }

  /// Look `name` up in the innermost frame only.
  pub fn find_innermost(&self, name: &str) -> Option<Rc<Symbol>> {
    self.scopes.last().and_then(|scope| scope.get(name).cloned())
  }

  /// Look `name` up from the innermost frame outward.
  pub fn find(&self, name: &str) -> Option<Rc<Symbol>> {
    for scope in self.scopes.iter().rev() {
      if let Some(sym) = scope.get(name) {
        return Some(sym.clone());
      }
    }
    None
  }

  /// Consume the table and hand back its innermost frame. Used to freeze a
  /// struct's field scope into a [`StructDefSym`].
  pub fn into_innermost(mut self) -> HashMap<String, Rc<Symbol>> {
    self.scopes.pop().unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn inner_scope_shadows_and_pops() {
    let mut table = SymTable::new();
    table
      .declare("x", Rc::new(Symbol::Var(VarSym::scalar(SemType::Int))))
      .unwrap();
    table.open_scope();
    table
      .declare("x", Rc::new(Symbol::Var(VarSym::scalar(SemType::Bool))))
      .unwrap();
    assert_eq!(table.find("x").unwrap().sem_type(), SemType::Bool);
    table.close_scope().unwrap();
    assert_eq!(table.find("x").unwrap().sem_type(), SemType::Int);
  }

  #[test]
  fn duplicate_in_same_scope_is_rejected() {
    let mut table = SymTable::new();
    table
      .declare("x", Rc::new(Symbol::Var(VarSym::scalar(SemType::Int))))
      .unwrap();
    let err = table
      .declare("x", Rc::new(Symbol::Var(VarSym::scalar(SemType::Int))))
      .unwrap_err();
    assert!(matches!(err, SymTableError::DuplicateName { .. }));
  }

  #[test]
  fn closing_the_last_scope_then_again_is_an_error() {
    let mut table = SymTable::new();
    table.close_scope().unwrap();
    assert!(matches!(table.close_scope(), Err(SymTableError::EmptyScope)));
  }
}
