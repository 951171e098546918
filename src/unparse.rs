//! The unparser: prints a program back as canonical Mini source.
//!
//! Useful for eyeballing what the parser built; the driver writes it to the
//! optional third output file. Expressions come out fully parenthesised, so
//! the printed form makes the parse explicit.

use crate::ast::*;

pub fn unparse(program: &Program) -> String {
  let mut out = String::new();
  for decl in &program.decls {
    unparse_decl(&mut out, decl, 0);
  }
  out
}

fn indent(out: &mut String, depth: usize) {
  for _ in 0..depth {
    out.push(' ');
  }
}

fn unparse_decl(out: &mut String, decl: &Decl, depth: usize) {
  match decl {
    Decl::Var(var) => unparse_var_decl(out, var, depth),
    Decl::Fn(fun) => {
      indent(out, depth);
      unparse_type(out, &fun.ret);
      out.push(' ');
      out.push_str(&fun.name.name);
      out.push('(');
      for (i, formal) in fun.formals.iter().enumerate() {
        if i > 0 {
          out.push_str(", ");
        }
        unparse_type(out, &formal.ty);
        out.push(' ');
        out.push_str(&formal.name.name);
      }
      out.push_str(") {\n");
      for decl in &fun.body.decls {
        unparse_var_decl(out, decl, depth + 4);
      }
      for stmt in &fun.body.stmts {
        unparse_stmt(out, stmt, depth + 4);
      }
      indent(out, depth);
      out.push_str("}\n\n");
    }
    Decl::Struct(st) => {
      indent(out, depth);
      out.push_str("struct ");
      out.push_str(&st.name.name);
      out.push_str("{\n");
      for field in &st.fields {
        unparse_var_decl(out, field, depth + 4);
      }
      indent(out, depth);
      out.push_str("};\n\n");
    }
  }
}

fn unparse_var_decl(out: &mut String, var: &VarDecl, depth: usize) {
  indent(out, depth);
  unparse_type(out, &var.ty);
  out.push(' ');
  out.push_str(&var.name.name);
  out.push_str(";\n");
}

fn unparse_type(out: &mut String, ty: &TypeSpec) {
  match ty {
    TypeSpec::Int => out.push_str("int"),
    TypeSpec::Bool => out.push_str("bool"),
    TypeSpec::Void => out.push_str("void"),
    TypeSpec::Struct(id) => {
      out.push_str("struct ");
      out.push_str(&id.name);
    }
  }
}

fn unparse_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
  match stmt {
    Stmt::Assign(assign) => {
      indent(out, depth);
      // No parentheses around a top-level assignment.
      unparse_exp(out, &assign.lhs);
      out.push_str(" = ");
      unparse_exp(out, &assign.rhs);
      out.push_str(";\n");
    }
    Stmt::PostInc(exp) => {
      indent(out, depth);
      unparse_exp(out, exp);
      out.push_str("++;\n");
    }
    Stmt::PostDec(exp) => {
      indent(out, depth);
      unparse_exp(out, exp);
      out.push_str("--;\n");
    }
    Stmt::Read(exp) => {
      indent(out, depth);
      out.push_str("cin >> ");
      unparse_exp(out, exp);
      out.push_str(";\n");
    }
    Stmt::Write(exp) => {
      indent(out, depth);
      out.push_str("cout << ");
      unparse_exp(out, exp);
      out.push_str(";\n");
    }
    Stmt::If { cond, decls, stmts } => {
      indent(out, depth);
      out.push_str("if (");
      unparse_exp(out, cond);
      out.push_str(") {\n");
      for decl in decls {
        unparse_var_decl(out, decl, depth + 4);
      }
      for stmt in stmts {
        unparse_stmt(out, stmt, depth + 4);
      }
      indent(out, depth);
      out.push_str("}\n");
    }
    Stmt::IfElse { cond, then_decls, then_stmts, else_decls, else_stmts } => {
      indent(out, depth);
      out.push_str("if (");
      unparse_exp(out, cond);
      out.push_str(") {\n");
      for decl in then_decls {
        unparse_var_decl(out, decl, depth + 4);
      }
      for stmt in then_stmts {
        unparse_stmt(out, stmt, depth + 4);
      }
      indent(out, depth);
      out.push_str("}\n");
      indent(out, depth);
      out.push_str("else {\n");
      for decl in else_decls {
        unparse_var_decl(out, decl, depth + 4);
      }
      for stmt in else_stmts {
        unparse_stmt(out, stmt, depth + 4);
      }
      indent(out, depth);
      out.push_str("}\n");
    }
    Stmt::While { cond, decls, stmts } => {
      indent(out, depth);
      out.push_str("while (");
      unparse_exp(out, cond);
      out.push_str(") {\n");
      for decl in decls {
        unparse_var_decl(out, decl, depth + 4);
      }
      for stmt in stmts {
        unparse_stmt(out, stmt, depth + 4);
      }
      indent(out, depth);
      out.push_str("}\n");
    }
    Stmt::Call(call) => {
      indent(out, depth);
      unparse_call(out, call);
      out.push_str(";\n");
    }
    Stmt::Return(exp) => {
      indent(out, depth);
      out.push_str("return");
      if let Some(exp) = exp {
        out.push(' ');
        unparse_exp(out, exp);
      }
      out.push_str(";\n");
    }
  }
}

fn unparse_call(out: &mut String, call: &CallExp) {
  out.push_str(&call.callee.name);
  out.push('(');
  for (i, arg) in call.args.iter().enumerate() {
    if i > 0 {
      out.push_str(", ");
    }
    unparse_exp(out, arg);
  }
  out.push(')');
}

fn unparse_exp(out: &mut String, exp: &Exp) {
  match exp {
    Exp::IntLit { value, .. } => out.push_str(&value.to_string()),
    Exp::StrLit { text, .. } => out.push_str(text),
    Exp::True { .. } => out.push_str("true"),
    Exp::False { .. } => out.push_str("false"),
    Exp::Id(id) => out.push_str(&id.name),
    Exp::Dot(dot) => {
      unparse_exp(out, &dot.loc);
      out.push('.');
      out.push_str(&dot.field.name);
    }
    Exp::Assign(assign) => {
      out.push('(');
      unparse_exp(out, &assign.lhs);
      out.push_str(" = ");
      unparse_exp(out, &assign.rhs);
      out.push(')');
    }
    Exp::Call(call) => unparse_call(out, call),
    Exp::Unary { op, operand } => {
      out.push('(');
      out.push_str(match op {
        UnaryOp::Neg => "-",
        UnaryOp::Not => "!",
      });
      unparse_exp(out, operand);
      out.push(')');
    }
    Exp::Binary { op, lhs, rhs } => {
      out.push('(');
      unparse_exp(out, lhs);
      out.push_str(match op {
        BinaryOp::Plus => " + ",
        BinaryOp::Minus => " - ",
        BinaryOp::Times => " * ",
        BinaryOp::Divide => " / ",
        BinaryOp::And => " && ",
        BinaryOp::Or => " || ",
        BinaryOp::Eq => " == ",
        BinaryOp::Ne => " != ",
        BinaryOp::Lt => " < ",
        BinaryOp::Gt => " > ",
        BinaryOp::Le => " <= ",
        BinaryOp::Ge => " >= ",
      });
      unparse_exp(out, rhs);
      out.push(')');
    }
  }
}
