//! Type checking.
//!
//! A post-order pass over the bound AST. Every expression gets a semantic
//! type; statements are validated against the enclosing function's declared
//! return type. A failed rule types the expression as `Error`, and an
//! operand that is already `Error` never triggers a second complaint, so
//! one mistake produces one diagnostic.
//!
//! The pass only reads the tree; its entire output is the diagnostic log.

use crate::ast::*;
use crate::diag::ErrorLog;
use crate::source::Pos;
use crate::types::SemType;

pub fn check(program: &Program, diag: &mut ErrorLog) {
  let mut checker = TypeChecker { diag };
  for decl in &program.decls {
    if let Decl::Fn(fun) = decl {
      let ret = fun.ret.sem_type();
      for stmt in &fun.body.stmts {
        checker.stmt(stmt, &ret);
      }
    }
  }
}

struct TypeChecker<'a> {
  diag: &'a mut ErrorLog,
}

impl<'a> TypeChecker<'a> {
  fn stmt(&mut self, stmt: &Stmt, ret: &SemType) {
    match stmt {
      Stmt::Assign(assign) => {
        self.assign_exp(assign);
      }
      Stmt::PostInc(exp) | Stmt::PostDec(exp) => {
        let ty = self.exp(exp);
        if !ty.is_error() && !ty.is_int() {
          self
            .diag
            .fatal(exp.pos(), "Arithmetic operator applied to non-numeric operand");
        }
      }
      Stmt::Read(exp) => {
        let ty = self.exp(exp);
        if ty.is_fn() {
          self.diag.fatal(exp.pos(), "Attempt to read a function");
        }
        if ty.is_struct_def() {
          self.diag.fatal(exp.pos(), "Attempt to read a struct name");
        }
        if ty.is_struct_var() {
          self.diag.fatal(exp.pos(), "Attempt to read a struct variable");
        }
      }
      Stmt::Write(exp) => {
        let ty = self.exp(exp);
        if ty.is_fn() {
          self.diag.fatal(exp.pos(), "Attempt to write a function");
        }
        if ty.is_struct_def() {
          self.diag.fatal(exp.pos(), "Attempt to write a struct name");
        }
        if ty.is_struct_var() {
          self.diag.fatal(exp.pos(), "Attempt to write a struct variable");
        }
        if ty.is_void() {
          self.diag.fatal(exp.pos(), "Attempt to write void");
        }
      }
      Stmt::If { cond, stmts, .. } => {
        self.cond(cond, "Non-bool expression used as an if condition");
        for stmt in stmts {
          self.stmt(stmt, ret);
        }
      }
      Stmt::IfElse { cond, then_stmts, else_stmts, .. } => {
        self.cond(cond, "Non-bool expression used as an if condition");
        for stmt in then_stmts {
          self.stmt(stmt, ret);
        }
        for stmt in else_stmts {
          self.stmt(stmt, ret);
        }
      }
      Stmt::While { cond, stmts, .. } => {
        self.cond(cond, "Non-bool expression used as a while condition");
        for stmt in stmts {
          self.stmt(stmt, ret);
        }
      }
      Stmt::Call(call) => {
        self.call_exp(call);
      }
      Stmt::Return(Some(exp)) => {
        let ty = self.exp(exp);
        if ret.is_void() {
          self
            .diag
            .fatal(exp.pos(), "Return with a value in a void function");
        } else if !ret.is_error() && !ty.is_error() && *ret != ty {
          self.diag.fatal(exp.pos(), "Bad return value");
        }
      }
      Stmt::Return(None) => {
        if !ret.is_void() {
          self.diag.fatal(Pos::none(), "Missing return value");
        }
      }
    }
  }

  fn cond(&mut self, cond: &Exp, message: &str) {
    let ty = self.exp(cond);
    if !ty.is_error() && !ty.is_bool() {
      self.diag.fatal(cond.pos(), message);
    }
  }

  fn exp(&mut self, exp: &Exp) -> SemType {
    match exp {
      Exp::IntLit { .. } => SemType::Int,
      Exp::StrLit { .. } => SemType::Str,
      Exp::True { .. } | Exp::False { .. } => SemType::Bool,
      Exp::Id(id) => bound_type(id),
      // A dot-access was fully resolved by name analysis; its type is the
      // type of the field it bound.
      Exp::Dot(dot) => bound_type(&dot.field),
      Exp::Assign(assign) => self.assign_exp(assign),
      Exp::Call(call) => self.call_exp(call),
      Exp::Unary { op, operand } => {
        let ty = self.exp(operand);
        match op {
          UnaryOp::Neg => {
            if ty.is_error() {
              SemType::Error
            } else if !ty.is_int() {
              self
                .diag
                .fatal(operand.pos(), "Arithmetic operator applied to non-numeric operand");
              SemType::Error
            } else {
              SemType::Int
            }
          }
          UnaryOp::Not => {
            if ty.is_error() {
              SemType::Error
            } else if !ty.is_bool() {
              self
                .diag
                .fatal(operand.pos(), "Logical operator applied to non-bool operand");
              SemType::Error
            } else {
              SemType::Bool
            }
          }
        }
      }
      Exp::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs),
    }
  }

  /// Both operands of a binary operator are checked independently, so one
  /// expression can produce two diagnostics.
  fn binary(&mut self, op: BinaryOp, lhs: &Exp, rhs: &Exp) -> SemType {
    let tl = self.exp(lhs);
    let tr = self.exp(rhs);

    if op.is_arithmetic() {
      let mut result = SemType::Int;
      if !tl.is_error() && !tl.is_int() {
        self
          .diag
          .fatal(lhs.pos(), "Arithmetic operator applied to non-numeric operand");
        result = SemType::Error;
      }
      if !tr.is_error() && !tr.is_int() {
        self
          .diag
          .fatal(rhs.pos(), "Arithmetic operator applied to non-numeric operand");
        result = SemType::Error;
      }
      if tl.is_error() || tr.is_error() {
        result = SemType::Error;
      }
      result
    } else if op.is_logical() {
      let mut result = SemType::Bool;
      if !tl.is_error() && !tl.is_bool() {
        self
          .diag
          .fatal(lhs.pos(), "Logical operator applied to non-bool operand");
        result = SemType::Error;
      }
      if !tr.is_error() && !tr.is_bool() {
        self
          .diag
          .fatal(rhs.pos(), "Logical operator applied to non-bool operand");
        result = SemType::Error;
      }
      if tl.is_error() || tr.is_error() {
        result = SemType::Error;
      }
      result
    } else if op.is_relational() {
      let mut result = SemType::Bool;
      if !tl.is_error() && !tl.is_int() {
        self
          .diag
          .fatal(lhs.pos(), "Relational operator applied to non-numeric operand");
        result = SemType::Error;
      }
      if !tr.is_error() && !tr.is_int() {
        self
          .diag
          .fatal(rhs.pos(), "Relational operator applied to non-numeric operand");
        result = SemType::Error;
      }
      if tl.is_error() || tr.is_error() {
        result = SemType::Error;
      }
      result
    } else {
      // Equality tier. The operator's reported position is its left
      // operand.
      let pos = lhs.pos();
      let mut result = SemType::Bool;
      if tl.is_void() && tr.is_void() {
        self
          .diag
          .fatal(pos, "Equality operator applied to void functions");
        result = SemType::Error;
      }
      if tl.is_fn() && tr.is_fn() {
        self.diag.fatal(pos, "Equality operator applied to functions");
        result = SemType::Error;
      }
      if tl.is_struct_def() && tr.is_struct_def() {
        self
          .diag
          .fatal(pos, "Equality operator applied to struct names");
        result = SemType::Error;
      }
      if tl.is_struct_var() && tr.is_struct_var() {
        self
          .diag
          .fatal(pos, "Equality operator applied to struct variables");
        result = SemType::Error;
      }
      if tl != tr && !tl.is_error() && !tr.is_error() {
        self.diag.fatal(pos, "Type mismatch");
        result = SemType::Error;
      }
      if tl.is_error() || tr.is_error() {
        result = SemType::Error;
      }
      result
    }
  }

  fn assign_exp(&mut self, assign: &AssignExp) -> SemType {
    let tl = self.exp(&assign.lhs);
    let tr = self.exp(&assign.rhs);
    let pos = assign.lhs.pos();
    let mut result = tl.clone();

    if tl.is_fn() && tr.is_fn() {
      self.diag.fatal(pos, "Function assignment");
      result = SemType::Error;
    }
    if tl.is_struct_def() && tr.is_struct_def() {
      self.diag.fatal(pos, "Struct name assignment");
      result = SemType::Error;
    }
    if tl.is_struct_var() && tr.is_struct_var() {
      self.diag.fatal(pos, "Struct variable assignment");
      result = SemType::Error;
    }
    if tl != tr && !tl.is_error() && !tr.is_error() {
      self.diag.fatal(pos, "Type mismatch");
      result = SemType::Error;
    }
    if tl.is_error() || tr.is_error() {
      result = SemType::Error;
    }
    result
  }

  fn call_exp(&mut self, call: &CallExp) -> SemType {
    let sym = match &call.callee.sym {
      Some(sym) => sym.clone(),
      // Unresolved callee; name analysis already complained.
      None => return SemType::Error,
    };
    let fn_sym = match sym.as_fn() {
      Some(fn_sym) => fn_sym,
      None => {
        self
          .diag
          .fatal(call.callee.pos, "Attempt to call a non-function");
        return SemType::Error;
      }
    };

    if call.args.len() != fn_sym.num_params() {
      self
        .diag
        .fatal(call.callee.pos, "Function call with wrong number of args");
      return fn_sym.ret.clone();
    }

    let params = fn_sym.params.borrow().clone();
    for (arg, formal) in call.args.iter().zip(params.iter()) {
      let actual = self.exp(arg);
      if !actual.is_error() && actual != *formal {
        self
          .diag
          .fatal(arg.pos(), "Type of actual does not match type of formal");
      }
    }
    fn_sym.ret.clone()
  }
}

/// The type of a bound identifier; unresolved bindings type as `Error` so
/// an undeclared name reported by the previous phase stays a single error.
fn bound_type(id: &Ident) -> SemType {
  match &id.sym {
    Some(sym) => sym.sem_type(),
    None => SemType::Error,
  }
}
