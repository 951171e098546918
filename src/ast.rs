//! The abstract syntax tree built by the parser.
//!
//! Nodes are plain tagged enums. Identifier leaves carry their source
//! position and a binding slot that name analysis fills with a shared
//! reference to a symbol; the slot starts out empty and the symbol is never
//! owned by the tree alone. Struct types are referred to by name, so the
//! tree is acyclic.

use std::rc::Rc;

use crate::source::Pos;
use crate::sym_table::Symbol;

pub struct Program {
  pub decls: Vec<Decl>,
}

pub enum Decl {
  Var(VarDecl),
  Fn(FnDecl),
  Struct(StructDecl),
}

pub struct VarDecl {
  pub ty: TypeSpec,
  pub name: Ident,
}

pub struct FnDecl {
  pub ret: TypeSpec,
  pub name: Ident,
  pub formals: Vec<FormalDecl>,
  pub body: FnBody,
  /// Total bytes of locals in the frame, filled in by name analysis.
  pub locals_size: i32,
}

pub struct FormalDecl {
  pub ty: TypeSpec,
  pub name: Ident,
}

pub struct StructDecl {
  pub name: Ident,
  pub fields: Vec<VarDecl>,
}

pub struct FnBody {
  pub decls: Vec<VarDecl>,
  pub stmts: Vec<Stmt>,
}

/// A type as written in a declaration.
pub enum TypeSpec {
  Int,
  Bool,
  Void,
  Struct(Ident),
}

impl TypeSpec {
  /// The semantic type this annotation denotes.
  pub fn sem_type(&self) -> crate::types::SemType {
    use crate::types::SemType;
    match self {
      TypeSpec::Int => SemType::Int,
      TypeSpec::Bool => SemType::Bool,
      TypeSpec::Void => SemType::Void,
      TypeSpec::Struct(id) => SemType::StructVar(id.name.clone()),
    }
  }
}

pub enum Stmt {
  Assign(AssignExp),
  PostInc(Exp),
  PostDec(Exp),
  /// `cin >> lvalue`
  Read(Exp),
  /// `cout << exp`
  Write(Exp),
  If {
    cond: Exp,
    decls: Vec<VarDecl>,
    stmts: Vec<Stmt>,
  },
  IfElse {
    cond: Exp,
    then_decls: Vec<VarDecl>,
    then_stmts: Vec<Stmt>,
    else_decls: Vec<VarDecl>,
    else_stmts: Vec<Stmt>,
  },
  While {
    cond: Exp,
    decls: Vec<VarDecl>,
    stmts: Vec<Stmt>,
  },
  Call(CallExp),
  Return(Option<Exp>),
}

pub enum Exp {
  IntLit { value: i32, pos: Pos },
  /// The text keeps its surrounding quotes and escapes exactly as scanned;
  /// the code generator emits it verbatim after `.asciiz`.
  StrLit { text: String, pos: Pos },
  True { pos: Pos },
  False { pos: Pos },
  Id(Ident),
  Dot(Box<DotAccess>),
  Assign(Box<AssignExp>),
  Call(Box<CallExp>),
  Unary { op: UnaryOp, operand: Box<Exp> },
  Binary { op: BinaryOp, lhs: Box<Exp>, rhs: Box<Exp> },
}

/// An identifier use or declaration site.
pub struct Ident {
  pub name: String,
  pub pos: Pos,
  /// Filled by name analysis; `None` afterwards means the use was reported
  /// as undeclared.
  pub sym: Option<Rc<Symbol>>,
}

impl Ident {
  pub fn new(name: String, pos: Pos) -> Ident {
    Ident { name, pos, sym: None }
  }
}

/// `loc.field`, where `loc` is an identifier or another dot-access.
pub struct DotAccess {
  pub loc: Exp,
  pub field: Ident,
  /// When `field` is itself a struct variable, the symbol of its struct
  /// declaration, so that a chained access one level up can resolve.
  pub struct_sym: Option<Rc<Symbol>>,
  /// Set when resolving this access already produced an error; stops the
  /// enclosing access from piling further errors on the same chain.
  pub bad: bool,
}

pub struct AssignExp {
  pub lhs: Exp,
  pub rhs: Exp,
}

pub struct CallExp {
  pub callee: Ident,
  pub args: Vec<Exp>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
  Plus,
  Minus,
  Times,
  Divide,
  And,
  Or,
  Eq,
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
}

impl BinaryOp {
  pub fn is_arithmetic(&self) -> bool {
    use BinaryOp::*;
    matches!(self, Plus | Minus | Times | Divide)
  }

  pub fn is_logical(&self) -> bool {
    matches!(self, BinaryOp::And | BinaryOp::Or)
  }

  pub fn is_equality(&self) -> bool {
    matches!(self, BinaryOp::Eq | BinaryOp::Ne)
  }

  pub fn is_relational(&self) -> bool {
    use BinaryOp::*;
    matches!(self, Lt | Gt | Le | Ge)
  }
}

impl Exp {
  /// The position reported for diagnostics about this expression.
  /// Composite expressions report their leftmost operand, a dot-access
  /// reports the field name, and a call reports the callee.
  pub fn pos(&self) -> Pos {
    match self {
      Exp::IntLit { pos, .. }
      | Exp::StrLit { pos, .. }
      | Exp::True { pos }
      | Exp::False { pos } => *pos,
      Exp::Id(id) => id.pos,
      Exp::Dot(dot) => dot.field.pos,
      Exp::Assign(assign) => assign.lhs.pos(),
      Exp::Call(call) => call.callee.pos,
      Exp::Unary { operand, .. } => operand.pos(),
      Exp::Binary { lhs, .. } => lhs.pos(),
    }
  }

  /// True for the expression shapes that designate a storage location.
  pub fn is_lvalue(&self) -> bool {
    matches!(self, Exp::Id(_) | Exp::Dot(_))
  }
}
