//! Code generation.
//!
//! Walks the bound, typed AST and emits MIPS text. Every expression in
//! value mode pushes exactly one word onto the runtime stack; boolean
//! expressions also support jump mode, where they branch straight to
//! caller-supplied labels instead of materialising 0/1.
//!
//! Frame shape for a function with `n` formals: the caller pushes the
//! arguments left to right, the prologue pushes `$ra` and the old `$fp`,
//! sets `$fp = $sp + 4n + 8` (so formal `i` sits at `-4i($fp)`), and
//! reserves the locals area below the saved words. The epilogue runs at a
//! per-function label, restores `$ra` and `$fp`, and rolls `$sp` back past
//! the arguments, so call sites never clean up.

use std::collections::HashMap;

use crate::ast::*;
use crate::sym_table::{Symbol, VarLoc, VarSym};
use crate::types::SemType;

use super::mips_isa::{AsmProg, Directive, Inst, Mem, Operand, Reg};

/// Generate the full assembly program. Only runs on programs that passed
/// name analysis and type checking; unbound identifiers are a bug here.
pub fn gen_program(program: &Program) -> AsmProg {
  let mut gen = MipsGen {
    prog: AsmProg::new(),
    next_label: 0,
    str_pool: HashMap::new(),
  };
  for decl in &program.decls {
    match decl {
      Decl::Var(var) => gen.gen_global(var),
      Decl::Fn(fun) => gen.gen_fn(fun),
      // Struct declarations produce no code; instances get their space
      // from the variables declared with them.
      Decl::Struct(_) => {}
    }
  }
  gen.prog
}

struct MipsGen {
  prog: AsmProg,
  next_label: u32,
  /// One `.asciiz` per distinct string value.
  str_pool: HashMap<String, String>,
}

impl MipsGen {
  fn fresh_label(&mut self) -> String {
    let label = format!("_L{}", self.next_label);
    self.next_label += 1;
    label
  }

  fn gen_global(&mut self, var: &VarDecl) {
    let v = bound_var(&var.name);
    self.prog.directive(Directive::Data);
    self.prog.directive(Directive::Align(2));
    self.prog.label(global_label(&var.name.name));
    self.prog.directive(Directive::Space(v.size()));
  }

  fn gen_fn(&mut self, fun: &FnDecl) {
    let is_main = fun.name.name == "main";
    let num_formals = fun.formals.len() as i32;

    self.prog.directive(Directive::Text);
    if is_main {
      self.prog.label("main");
      self.prog.label("__start");
    } else {
      self.prog.label(format!("_{}", fun.name.name));
    }

    self.prog.comment("prologue");
    self.prog.push(Reg::Ra);
    self.prog.push(Reg::Fp);
    self
      .prog
      .inst(Inst::Addu(Reg::Fp, Reg::Sp, Operand::Imm(num_formals * 4 + 8)));
    if fun.locals_size > 0 {
      self
        .prog
        .inst(Inst::Sub(Reg::Sp, Reg::Sp, Operand::Imm(fun.locals_size)));
    }

    let ret_label = self.fresh_label();
    for stmt in &fun.body.stmts {
      self.gen_stmt(stmt, &ret_label);
    }

    self.prog.comment("epilogue");
    self.prog.label(ret_label);
    self
      .prog
      .inst(Inst::Lw(Reg::Ra, Mem::Indexed(Reg::Fp, -(num_formals * 4))));
    self.prog.inst(Inst::Move(Reg::T0, Reg::Fp));
    self
      .prog
      .inst(Inst::Lw(Reg::Fp, Mem::Indexed(Reg::Fp, -(num_formals * 4) - 4)));
    self.prog.inst(Inst::Move(Reg::Sp, Reg::T0));
    if is_main {
      self.prog.inst(Inst::Li(Reg::V0, 10));
      self.prog.inst(Inst::Syscall);
    } else {
      self.prog.inst(Inst::Jr(Reg::Ra));
    }
  }

  fn gen_stmt(&mut self, stmt: &Stmt, ret_label: &str) {
    match stmt {
      Stmt::Assign(assign) => {
        self.gen_assign(assign);
        self.prog.pop(Reg::T0);
      }
      Stmt::PostInc(lvalue) => {
        self.gen_exp(lvalue);
        self.gen_addr(lvalue);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Add(Reg::T0, Reg::T0, Operand::Imm(1)));
        self.prog.inst(Inst::Sw(Reg::T0, Mem::Indexed(Reg::T1, 0)));
      }
      Stmt::PostDec(lvalue) => {
        self.gen_exp(lvalue);
        self.gen_addr(lvalue);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Sub(Reg::T0, Reg::T0, Operand::Imm(1)));
        self.prog.inst(Inst::Sw(Reg::T0, Mem::Indexed(Reg::T1, 0)));
      }
      Stmt::Read(lvalue) => {
        self.gen_addr(lvalue);
        self.prog.inst(Inst::Li(Reg::V0, 5));
        self.prog.inst(Inst::Syscall);
        self.prog.pop(Reg::T0);
        if static_type(lvalue).is_bool() {
          // Any nonzero input reads as true.
          self.prog.inst(Inst::Sne(Reg::V0, Reg::V0, Reg::Zero));
        }
        self.prog.inst(Inst::Sw(Reg::V0, Mem::Indexed(Reg::T0, 0)));
      }
      Stmt::Write(exp) => {
        self.gen_exp(exp);
        self.prog.pop(Reg::A0);
        let service = if static_type(exp).is_str() { 4 } else { 1 };
        self.prog.inst(Inst::Li(Reg::V0, service));
        self.prog.inst(Inst::Syscall);
      }
      Stmt::If { cond, stmts, .. } => {
        let then_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.gen_jump(cond, &then_label, &done_label);
        self.prog.label(then_label);
        for stmt in stmts {
          self.gen_stmt(stmt, ret_label);
        }
        self.prog.label(done_label);
      }
      Stmt::IfElse { cond, then_stmts, else_stmts, .. } => {
        let then_label = self.fresh_label();
        let else_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.gen_jump(cond, &then_label, &else_label);
        self.prog.label(then_label);
        for stmt in then_stmts {
          self.gen_stmt(stmt, ret_label);
        }
        self.prog.inst(Inst::B(done_label.clone()));
        self.prog.label(else_label);
        for stmt in else_stmts {
          self.gen_stmt(stmt, ret_label);
        }
        self.prog.label(done_label);
      }
      Stmt::While { cond, stmts, .. } => {
        let start_label = self.fresh_label();
        let body_label = self.fresh_label();
        let done_label = self.fresh_label();
        self.prog.label(start_label.clone());
        self.gen_jump(cond, &body_label, &done_label);
        self.prog.label(body_label);
        for stmt in stmts {
          self.gen_stmt(stmt, ret_label);
        }
        self.prog.inst(Inst::B(start_label));
        self.prog.label(done_label);
      }
      Stmt::Call(call) => {
        self.gen_call(call);
        self.prog.pop(Reg::V0);
      }
      Stmt::Return(exp) => {
        if let Some(exp) = exp {
          self.gen_exp(exp);
          self.prog.pop(Reg::V0);
        }
        self.prog.inst(Inst::B(ret_label.to_string()));
      }
    }
  }

  /// Value mode: leave the expression's value on top of the stack.
  fn gen_exp(&mut self, exp: &Exp) {
    match exp {
      Exp::IntLit { value, .. } => {
        self.prog.inst(Inst::Li(Reg::T0, *value));
        self.prog.push(Reg::T0);
      }
      Exp::StrLit { text, .. } => {
        let label = self.string_label(text);
        self.prog.inst(Inst::La(Reg::T0, Mem::Label(label)));
        self.prog.push(Reg::T0);
      }
      Exp::True { .. } => {
        self.prog.inst(Inst::Li(Reg::T0, 1));
        self.prog.push(Reg::T0);
      }
      Exp::False { .. } => {
        self.prog.inst(Inst::Li(Reg::T0, 0));
        self.prog.push(Reg::T0);
      }
      Exp::Id(id) => {
        self.load_var(id);
        self.prog.push(Reg::T0);
      }
      Exp::Dot(_) => {
        self.gen_addr(exp);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Lw(Reg::T0, Mem::Indexed(Reg::T0, 0)));
        self.prog.push(Reg::T0);
      }
      Exp::Assign(assign) => self.gen_assign(assign),
      Exp::Call(call) => self.gen_call(call),
      Exp::Unary { op: UnaryOp::Neg, operand } => {
        self.gen_exp(operand);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Sub(Reg::T0, Reg::Zero, Operand::Reg(Reg::T0)));
        self.prog.push(Reg::T0);
      }
      Exp::Unary { op: UnaryOp::Not, operand } => {
        self.gen_exp(operand);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Xor(Reg::T0, Reg::T0, Operand::Imm(1)));
        self.prog.push(Reg::T0);
      }
      Exp::Binary { op: BinaryOp::And, lhs, rhs } => {
        // Skip the right side when the left already settled the answer;
        // its value stays on the stack as the result.
        let end_label = self.fresh_label();
        self.gen_exp(lhs);
        self.prog.peek(Reg::T0);
        self.prog.inst(Inst::Beq(Reg::T0, Reg::Zero, end_label.clone()));
        self.gen_exp(rhs);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::And(Reg::T0, Reg::T0, Reg::T1));
        self.prog.push(Reg::T0);
        self.prog.label(end_label);
      }
      Exp::Binary { op: BinaryOp::Or, lhs, rhs } => {
        let end_label = self.fresh_label();
        self.gen_exp(lhs);
        self.prog.peek(Reg::T0);
        self.prog.inst(Inst::Bne(Reg::T0, Reg::Zero, end_label.clone()));
        self.gen_exp(rhs);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        self.prog.inst(Inst::Or(Reg::T0, Reg::T0, Reg::T1));
        self.prog.push(Reg::T0);
        self.prog.label(end_label);
      }
      Exp::Binary { op, lhs, rhs } => {
        self.gen_exp(lhs);
        self.gen_exp(rhs);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        let inst = match op {
          BinaryOp::Plus => Inst::Add(Reg::T0, Reg::T0, Operand::Reg(Reg::T1)),
          BinaryOp::Minus => Inst::Sub(Reg::T0, Reg::T0, Operand::Reg(Reg::T1)),
          BinaryOp::Times => Inst::Mulo(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Divide => Inst::Div(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Eq => Inst::Seq(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Ne => Inst::Sne(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Lt => Inst::Slt(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Gt => Inst::Sgt(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Le => Inst::Sle(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::Ge => Inst::Sge(Reg::T0, Reg::T0, Reg::T1),
          BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        };
        self.prog.inst(inst);
        self.prog.push(Reg::T0);
      }
    }
  }

  /// Jump mode: branch to `true_label` or `false_label` without leaving a
  /// value behind. Only called on expressions the type checker proved
  /// boolean.
  fn gen_jump(&mut self, exp: &Exp, true_label: &str, false_label: &str) {
    match exp {
      Exp::True { .. } => self.prog.inst(Inst::B(true_label.to_string())),
      Exp::False { .. } => self.prog.inst(Inst::B(false_label.to_string())),
      Exp::Id(id) => {
        self.load_var(id);
        self
          .prog
          .inst(Inst::Beq(Reg::T0, Reg::Zero, false_label.to_string()));
        self.prog.inst(Inst::B(true_label.to_string()));
      }
      Exp::Dot(_) => {
        self.gen_exp(exp);
        self.prog.pop(Reg::T0);
        self
          .prog
          .inst(Inst::Beq(Reg::T0, Reg::Zero, false_label.to_string()));
        self.prog.inst(Inst::B(true_label.to_string()));
      }
      Exp::Unary { op: UnaryOp::Not, operand } => {
        self.gen_jump(operand, false_label, true_label);
      }
      Exp::Binary { op: BinaryOp::And, lhs, rhs } => {
        let mid_label = self.fresh_label();
        self.gen_jump(lhs, &mid_label, false_label);
        self.prog.label(mid_label);
        self.gen_jump(rhs, true_label, false_label);
      }
      Exp::Binary { op: BinaryOp::Or, lhs, rhs } => {
        let mid_label = self.fresh_label();
        self.gen_jump(lhs, true_label, &mid_label);
        self.prog.label(mid_label);
        self.gen_jump(rhs, true_label, false_label);
      }
      Exp::Binary { op, lhs, rhs }
        if op.is_equality() || op.is_relational() =>
      {
        self.gen_exp(lhs);
        self.gen_exp(rhs);
        self.prog.pop(Reg::T1);
        self.prog.pop(Reg::T0);
        let target = true_label.to_string();
        let inst = match op {
          BinaryOp::Eq => Inst::Beq(Reg::T0, Reg::T1, target),
          BinaryOp::Ne => Inst::Bne(Reg::T0, Reg::T1, target),
          BinaryOp::Lt => Inst::Blt(Reg::T0, Reg::T1, target),
          BinaryOp::Gt => Inst::Bgt(Reg::T0, Reg::T1, target),
          BinaryOp::Le => Inst::Ble(Reg::T0, Reg::T1, target),
          BinaryOp::Ge => Inst::Bge(Reg::T0, Reg::T1, target),
          _ => unreachable!(),
        };
        self.prog.inst(inst);
        self.prog.inst(Inst::B(false_label.to_string()));
      }
      Exp::Assign(assign) => {
        self.gen_exp(&assign.rhs);
        self.gen_addr(&assign.lhs);
        self.prog.pop(Reg::T0);
        self.prog.pop(Reg::T1);
        self.prog.inst(Inst::Sw(Reg::T1, Mem::Indexed(Reg::T0, 0)));
        self
          .prog
          .inst(Inst::Beq(Reg::T1, Reg::Zero, false_label.to_string()));
        self.prog.inst(Inst::B(true_label.to_string()));
      }
      Exp::Call(call) => {
        for arg in &call.args {
          self.gen_exp(arg);
        }
        self.prog.inst(Inst::Jal(callee_label(&call.callee.name)));
        self
          .prog
          .inst(Inst::Beq(Reg::V0, Reg::Zero, false_label.to_string()));
        self.prog.inst(Inst::B(true_label.to_string()));
      }
      _ => unreachable!("jump mode on a non-boolean expression"),
    }
  }

  /// Push the address an lvalue designates.
  fn gen_addr(&mut self, lvalue: &Exp) {
    let (root, field_offset) = flatten_lvalue(lvalue);
    let var = bound_var(root);
    match var.loc.get() {
      VarLoc::Global => {
        let mem = if field_offset == 0 {
          Mem::Label(global_label(&root.name))
        } else {
          Mem::LabelOffset(global_label(&root.name), field_offset)
        };
        self.prog.inst(Inst::La(Reg::T0, mem));
      }
      VarLoc::Local { offset } => {
        self
          .prog
          .inst(Inst::La(Reg::T0, Mem::Indexed(Reg::Fp, offset + field_offset)));
      }
      VarLoc::Field { .. } | VarLoc::Unresolved => {
        unreachable!("lvalue rooted at a symbol without storage")
      }
    }
    self.prog.push(Reg::T0);
  }

  /// `rhs` then the address; the stored value stays on the stack as the
  /// expression's result.
  fn gen_assign(&mut self, assign: &AssignExp) {
    self.gen_exp(&assign.rhs);
    self.gen_addr(&assign.lhs);
    self.prog.pop(Reg::T0);
    self.prog.peek(Reg::T1);
    self.prog.inst(Inst::Sw(Reg::T1, Mem::Indexed(Reg::T0, 0)));
  }

  /// Arguments are evaluated left to right, each pushing one word; the
  /// callee's epilogue pops them.
  fn gen_call(&mut self, call: &CallExp) {
    for arg in &call.args {
      self.gen_exp(arg);
    }
    self.prog.inst(Inst::Jal(callee_label(&call.callee.name)));
    self.prog.push(Reg::V0);
  }

  /// Load an identifier's value into `$t0`.
  fn load_var(&mut self, id: &Ident) {
    let var = bound_var(id);
    match var.loc.get() {
      VarLoc::Global => {
        self
          .prog
          .inst(Inst::Lw(Reg::T0, Mem::Label(global_label(&id.name))));
      }
      VarLoc::Local { offset } => {
        self.prog.inst(Inst::Lw(Reg::T0, Mem::Indexed(Reg::Fp, offset)));
      }
      VarLoc::Field { .. } | VarLoc::Unresolved => {
        unreachable!("bare identifier bound to a symbol without storage")
      }
    }
  }

  /// The label of a string literal, shared between equal values. A new
  /// value is defined in `.data` on the spot, then emission returns to
  /// `.text`.
  fn string_label(&mut self, text: &str) -> String {
    if let Some(label) = self.str_pool.get(text) {
      return label.clone();
    }
    let label = self.fresh_label();
    self.prog.directive(Directive::Data);
    self.prog.label(label.clone());
    self.prog.directive(Directive::Asciiz(text.to_string()));
    self.prog.directive(Directive::Text);
    self.str_pool.insert(text.to_string(), label.clone());
    label
  }
}

fn global_label(name: &str) -> String {
  format!("_{}", name)
}

/// `main` is called by its bare name; every other function by `_name`.
fn callee_label(name: &str) -> String {
  if name == "main" {
    name.to_string()
  } else {
    format!("_{}", name)
  }
}

/// Resolve an lvalue chain to its root identifier plus the summed field
/// offsets, all known statically.
fn flatten_lvalue(exp: &Exp) -> (&Ident, i32) {
  match exp {
    Exp::Id(id) => (id, 0),
    Exp::Dot(dot) => {
      let (root, acc) = flatten_lvalue(&dot.loc);
      let field = bound_var(&dot.field);
      match field.loc.get() {
        VarLoc::Field { offset } => (root, acc + offset),
        _ => unreachable!("struct field without a field offset"),
      }
    }
    _ => unreachable!("address of a non-lvalue expression"),
  }
}

fn bound_var(id: &Ident) -> &VarSym {
  id.sym
    .as_deref()
    .and_then(Symbol::as_var)
    .expect("identifier reached code generation unbound")
}

/// The statically known type of an expression in a clean program; used to
/// pick the print syscall and the read normalisation.
fn static_type(exp: &Exp) -> SemType {
  match exp {
    Exp::IntLit { .. } => SemType::Int,
    Exp::StrLit { .. } => SemType::Str,
    Exp::True { .. } | Exp::False { .. } => SemType::Bool,
    Exp::Id(id) => id
      .sym
      .as_ref()
      .map(|sym| sym.sem_type())
      .unwrap_or(SemType::Error),
    Exp::Dot(dot) => dot
      .field
      .sym
      .as_ref()
      .map(|sym| sym.sem_type())
      .unwrap_or(SemType::Error),
    Exp::Assign(assign) => static_type(&assign.lhs),
    Exp::Call(call) => call
      .callee
      .sym
      .as_deref()
      .and_then(Symbol::as_fn)
      .map(|f| f.ret.clone())
      .unwrap_or(SemType::Error),
    Exp::Unary { op: UnaryOp::Neg, .. } => SemType::Int,
    Exp::Unary { op: UnaryOp::Not, .. } => SemType::Bool,
    Exp::Binary { op, .. } => {
      if op.is_arithmetic() {
        SemType::Int
      } else {
        SemType::Bool
      }
    }
  }
}
