//! Name analysis.
//!
//! Walks the AST once, binding every identifier to a symbol, assigning
//! frame offsets to formals and locals, laying out struct fields, and
//! recording diagnostics for declaration errors. Scope handling is funneled
//! through [`NameAnalyzer::with_scope`] so a frame opened for a function
//! body or a branch is closed on every exit path.
//!
//! Offset convention: formal `i` (0-based) lives at `-4*i($fp)`; locals
//! start at `-(4*n + 8)` below the saved `$ra`/`$fp` words and grow
//! downward. A variable's recorded offset is the lowest address of its
//! allocation, so struct fields are addressed by adding their field offset
//! to it.

use std::rc::Rc;

use crate::ast::*;
use crate::diag::ErrorLog;
use crate::error::CompileResult;
use crate::source::Pos;
use crate::sym_table::{FnSym, StructDefSym, SymTable, Symbol, VarLoc, VarSym};

/// Run name analysis over a freshly parsed program. Semantic errors land in
/// `diag`; the `Err` channel is reserved for internal invariant violations.
pub fn analyze(program: &mut Program, diag: &mut ErrorLog) -> CompileResult<()> {
  let mut analyzer = NameAnalyzer {
    table: SymTable::new(),
    diag,
    has_main: false,
    cur_offset: 0,
    min_offset: 0,
  };
  analyzer.program(program)
}

struct NameAnalyzer<'a> {
  table: SymTable,
  diag: &'a mut ErrorLog,
  has_main: bool,
  /// Next free local slot in the current function, as an `$fp` offset.
  cur_offset: i32,
  /// Lowest value `cur_offset` has reached in the current function.
  min_offset: i32,
}

impl<'a> NameAnalyzer<'a> {
  fn program(&mut self, program: &mut Program) -> CompileResult<()> {
    for decl in &mut program.decls {
      match decl {
        Decl::Var(var) => {
          if let Some(sym) = self.var_decl(var, None)? {
            if let Some(v) = sym.as_var() {
              v.loc.set(VarLoc::Global);
            }
          }
        }
        Decl::Fn(fun) => self.fn_decl(fun)?,
        Decl::Struct(st) => self.struct_decl(st)?,
      }
    }
    if !self.has_main {
      self.diag.fatal(Pos::none(), "No main function");
    }
    Ok(())
  }

  /// Open a scope, run `body`, and close the scope again whether or not
  /// `body` bailed out.
  fn with_scope<R>(
    &mut self,
    body: impl FnOnce(&mut Self) -> CompileResult<R>,
  ) -> CompileResult<R> {
    self.table.open_scope();
    let result = body(self);
    self.table.close_scope()?;
    result
  }

  /// Process one variable declaration. For struct fields, `field_table`
  /// holds the struct's own isolated scope; the type name is still resolved
  /// through the enclosing table. Returns the created symbol, or `None` if
  /// the declaration was bad.
  fn var_decl(
    &mut self,
    var: &mut VarDecl,
    mut field_table: Option<&mut SymTable>,
  ) -> CompileResult<Option<Rc<Symbol>>> {
    let name = var.name.name.clone();
    let mut bad = false;
    let mut struct_def: Option<Rc<Symbol>> = None;

    match &mut var.ty {
      TypeSpec::Void => {
        self.diag.fatal(var.name.pos, "Non-function declared void");
        bad = true;
      }
      TypeSpec::Struct(type_id) => match self.table.find(&type_id.name) {
        Some(sym) if sym.as_struct_def().is_some() => {
          type_id.sym = Some(sym.clone());
          struct_def = Some(sym);
        }
        _ => {
          self.diag.fatal(type_id.pos, "Invalid name of struct type");
          bad = true;
        }
      },
      _ => {}
    }

    let already = match field_table.as_deref() {
      Some(table) => table.find_innermost(&name).is_some(),
      None => self.table.find_innermost(&name).is_some(),
    };
    if already {
      self.diag.fatal(var.name.pos, "Multiply declared identifier");
      bad = true;
    }

    if bad {
      return Ok(None);
    }

    let var_sym = match (&var.ty, struct_def) {
      (TypeSpec::Struct(type_id), Some(def)) => VarSym::of_struct(&type_id.name, def),
      _ => VarSym::scalar(var.ty.sem_type()),
    };
    let sym = Rc::new(Symbol::Var(var_sym));
    match field_table.as_deref_mut() {
      Some(table) => table.declare(&name, sym.clone())?,
      None => self.table.declare(&name, sym.clone())?,
    }
    var.name.sym = Some(sym.clone());
    Ok(Some(sym))
  }

  /// A local declaration also claims stack space.
  fn local_var_decl(&mut self, var: &mut VarDecl) -> CompileResult<()> {
    if let Some(sym) = self.var_decl(var, None)? {
      if let Some(v) = sym.as_var() {
        let size = v.size();
        v.loc.set(VarLoc::Local { offset: self.cur_offset - size + 4 });
        self.cur_offset -= size;
        self.min_offset = self.min_offset.min(self.cur_offset);
      }
    }
    Ok(())
  }

  fn fn_decl(&mut self, fun: &mut FnDecl) -> CompileResult<()> {
    let name = fun.name.name.clone();
    if name == "main" {
      self.has_main = true;
    }

    let mut fn_sym = None;
    if self.table.find_innermost(&name).is_some() {
      self.diag.fatal(fun.name.pos, "Multiply declared identifier");
    } else {
      let sym = Rc::new(Symbol::Fn(FnSym::new(fun.ret.sem_type())));
      self.table.declare(&name, sym.clone())?;
      fun.name.sym = Some(sym.clone());
      fn_sym = Some(sym);
    }

    let num_formals = fun.formals.len() as i32;
    self.with_scope(|a| {
      let mut param_types = Vec::new();
      let mut offset = 0;
      for formal in &mut fun.formals {
        if let Some(sym) = a.formal_decl(formal)? {
          if let Some(v) = sym.as_var() {
            v.loc.set(VarLoc::Local { offset });
          }
          param_types.push(sym.sem_type());
        }
        offset -= 4;
      }
      if let Some(sym) = &fn_sym {
        if let Some(f) = sym.as_fn() {
          *f.params.borrow_mut() = param_types;
        }
      }

      a.cur_offset = -(num_formals * 4) - 8;
      a.min_offset = a.cur_offset;
      for decl in &mut fun.body.decls {
        a.local_var_decl(decl)?;
      }
      for stmt in &mut fun.body.stmts {
        a.stmt(stmt)?;
      }
      Ok(())
    })?;

    fun.locals_size = -(num_formals * 4) - 8 - self.min_offset;
    Ok(())
  }

  fn formal_decl(&mut self, formal: &mut FormalDecl) -> CompileResult<Option<Rc<Symbol>>> {
    let name = formal.name.name.clone();
    let mut bad = false;

    if matches!(formal.ty, TypeSpec::Void) {
      self.diag.fatal(formal.name.pos, "Non-function declared void");
      bad = true;
    }
    if self.table.find_innermost(&name).is_some() {
      self.diag.fatal(formal.name.pos, "Multiply declared identifier");
      bad = true;
    }
    if bad {
      return Ok(None);
    }

    // Formals are always one word; a struct-typed formal is a plain
    // variable of struct type with no instance storage of its own.
    let sym = Rc::new(Symbol::Var(VarSym::scalar(formal.ty.sem_type())));
    self.table.declare(&name, sym.clone())?;
    formal.name.sym = Some(sym.clone());
    Ok(Some(sym))
  }

  fn struct_decl(&mut self, st: &mut StructDecl) -> CompileResult<()> {
    let name = st.name.name.clone();
    let mut bad = false;
    if self.table.find_innermost(&name).is_some() {
      self.diag.fatal(st.name.pos, "Multiply declared identifier");
      bad = true;
    }

    // Fields live in their own isolated table; only struct type names
    // inside field declarations consult the enclosing scopes.
    let mut field_table = SymTable::new();
    let mut size = 0;
    for field in &mut st.fields {
      if let Some(sym) = self.var_decl(field, Some(&mut field_table))? {
        if let Some(v) = sym.as_var() {
          v.loc.set(VarLoc::Field { offset: size });
          size += v.size();
        }
      }
    }

    if !bad {
      let def = StructDefSym::new(name.clone(), field_table.into_innermost(), size);
      let sym = Rc::new(Symbol::StructDef(def));
      self.table.declare(&name, sym.clone())?;
      st.name.sym = Some(sym);
    }
    Ok(())
  }

  fn stmt(&mut self, stmt: &mut Stmt) -> CompileResult<()> {
    let depth = self.table.depth();
    let result = self.stmt_inner(stmt);
    debug_assert_eq!(depth, self.table.depth());
    result
  }

  fn stmt_inner(&mut self, stmt: &mut Stmt) -> CompileResult<()> {
    match stmt {
      Stmt::Assign(assign) => {
        self.exp(&mut assign.lhs);
        self.exp(&mut assign.rhs);
        Ok(())
      }
      Stmt::PostInc(exp) | Stmt::PostDec(exp) | Stmt::Read(exp) | Stmt::Write(exp) => {
        self.exp(exp);
        Ok(())
      }
      Stmt::If { cond, decls, stmts } => {
        self.exp(cond);
        self.with_scope(|a| {
          for decl in decls.iter_mut() {
            a.local_var_decl(decl)?;
          }
          for stmt in stmts.iter_mut() {
            a.stmt(stmt)?;
          }
          Ok(())
        })
      }
      Stmt::IfElse { cond, then_decls, then_stmts, else_decls, else_stmts } => {
        self.exp(cond);
        self.with_scope(|a| {
          for decl in then_decls.iter_mut() {
            a.local_var_decl(decl)?;
          }
          for stmt in then_stmts.iter_mut() {
            a.stmt(stmt)?;
          }
          Ok(())
        })?;
        self.with_scope(|a| {
          for decl in else_decls.iter_mut() {
            a.local_var_decl(decl)?;
          }
          for stmt in else_stmts.iter_mut() {
            a.stmt(stmt)?;
          }
          Ok(())
        })
      }
      Stmt::While { cond, decls, stmts } => {
        self.exp(cond);
        self.with_scope(|a| {
          for decl in decls.iter_mut() {
            a.local_var_decl(decl)?;
          }
          for stmt in stmts.iter_mut() {
            a.stmt(stmt)?;
          }
          Ok(())
        })
      }
      Stmt::Call(call) => {
        self.call_exp(call);
        Ok(())
      }
      Stmt::Return(exp) => {
        if let Some(exp) = exp {
          self.exp(exp);
        }
        Ok(())
      }
    }
  }

  fn exp(&mut self, exp: &mut Exp) {
    match exp {
      Exp::IntLit { .. } | Exp::StrLit { .. } | Exp::True { .. } | Exp::False { .. } => {}
      Exp::Id(id) => self.id_use(id),
      Exp::Dot(dot) => self.dot_access(dot),
      Exp::Assign(assign) => {
        self.exp(&mut assign.lhs);
        self.exp(&mut assign.rhs);
      }
      Exp::Call(call) => self.call_exp(call),
      Exp::Unary { operand, .. } => self.exp(operand),
      Exp::Binary { lhs, rhs, .. } => {
        self.exp(lhs);
        self.exp(rhs);
      }
    }
  }

  fn id_use(&mut self, id: &mut Ident) {
    match self.table.find(&id.name) {
      Some(sym) => id.sym = Some(sym),
      None => self.diag.fatal(id.pos, "Undeclared identifier"),
    }
  }

  /// Resolve `loc.field`. The left side determines the struct declaration
  /// whose field table the right side is looked up in; a field that is
  /// itself a struct variable hands its declaration on for further
  /// chaining.
  fn dot_access(&mut self, dot: &mut DotAccess) {
    self.exp(&mut dot.loc);

    let mut struct_table: Option<Rc<Symbol>> = None;
    match &dot.loc {
      Exp::Id(id) => match &id.sym {
        // Undeclared; already reported, do not cascade.
        None => dot.bad = true,
        Some(sym) => match sym.as_var().and_then(|v| v.struct_def.clone()) {
          Some(def) => struct_table = Some(def),
          None => {
            self.diag.fatal(id.pos, "Dot-access of non-struct type");
            dot.bad = true;
          }
        },
      },
      Exp::Dot(inner) => {
        if inner.bad {
          dot.bad = true;
        } else {
          match &inner.struct_sym {
            Some(def) => struct_table = Some(def.clone()),
            None => {
              self.diag.fatal(inner.field.pos, "Dot-access of non-struct type");
              dot.bad = true;
            }
          }
        }
      }
      // The grammar only builds dot-accesses from lvalues.
      _ => unreachable!("dot-access of a non-lvalue expression"),
    }

    let def_sym = match struct_table {
      Some(sym) if !dot.bad => sym,
      _ => return,
    };
    let def = match def_sym.as_struct_def() {
      Some(def) => def,
      None => unreachable!("struct table resolved to a non-struct symbol"),
    };
    match def.field(&dot.field.name) {
      None => {
        self.diag.fatal(dot.field.pos, "Invalid struct field name");
        dot.bad = true;
      }
      Some(field_sym) => {
        dot.field.sym = Some(field_sym.clone());
        if let Some(next) = field_sym.as_var().and_then(|v| v.struct_def.clone()) {
          dot.struct_sym = Some(next);
        }
      }
    }
  }

  fn call_exp(&mut self, call: &mut CallExp) {
    self.id_use(&mut call.callee);
    for arg in &mut call.args {
      self.exp(arg);
    }
  }
}
