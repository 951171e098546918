use mini_compiler::diag::ErrorLog;
use mini_compiler::sym_table::VarLoc;
use mini_compiler::{ast, name_analysis, parse};

/// Run name analysis and hand back the diagnostics it produced.
fn analyze(progs: &str) -> ErrorLog {
  let mut program = parse(progs).unwrap();
  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag).unwrap();
  diag
}

fn messages(diag: &ErrorLog) -> Vec<String> {
  diag.entries().iter().map(|d| d.message.clone()).collect()
}

#[test]
fn program_without_main_is_fatal() {
  let diag = analyze("int g;\n");
  assert_eq!(diag.entries().len(), 1);
  assert_eq!(diag.entries()[0].render(), "0:0 ***ERROR*** No main function");
}

#[test]
fn duplicate_local_is_reported_at_the_second_site() {
  let diag = analyze("void main() {\nint x;\nint x;\n}\n");
  assert_eq!(messages(&diag), vec!["Multiply declared identifier"]);
  let pos = diag.entries()[0].pos;
  assert_eq!((pos.line, pos.col), (3, 5));
}

#[test]
fn undeclared_identifier_is_reported() {
  let diag = analyze("void main() {\nx = 1;\n}\n");
  assert_eq!(messages(&diag), vec!["Undeclared identifier"]);
}

#[test]
fn variables_cannot_be_void() {
  let diag = analyze("void g;\nvoid main() { }\n");
  assert_eq!(messages(&diag), vec!["Non-function declared void"]);
}

#[test]
fn unknown_struct_type_is_reported() {
  let diag = analyze("struct A x;\nvoid main() { }\n");
  assert_eq!(messages(&diag), vec!["Invalid name of struct type"]);
}

#[test]
fn struct_field_chain_resolves_cleanly() {
  let diag = analyze(
    r#"
struct A { int f; };
struct B { struct A a; };
void main() {
    struct B b;
    b.a.f = 1;
}
"#,
  );
  assert!(!diag.seen());
}

#[test]
fn dot_access_on_scalar_is_reported_once() {
  let diag = analyze(
    r#"
void main() {
    int x;
    x.f = 1;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Dot-access of non-struct type"]);
}

#[test]
fn unknown_field_is_reported() {
  let diag = analyze(
    r#"
struct A { int f; };
void main() {
    struct A a;
    a.g = 1;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Invalid struct field name"]);
}

#[test]
fn struct_fields_do_not_leak_into_the_enclosing_scope() {
  // `f` only exists inside `A`, so the bare use is undeclared.
  let diag = analyze(
    r#"
struct A { int f; };
void main() {
    f = 1;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Undeclared identifier"]);
}

#[test]
fn field_names_may_shadow_globals() {
  let diag = analyze(
    r#"
int f;
struct A { int f; };
void main() {
    struct A a;
    a.f = 2;
    f = 3;
}
"#,
  );
  assert!(!diag.seen());
}

#[test]
fn inner_scopes_allow_shadowing() {
  let diag = analyze(
    r#"
void main() {
    int x;
    if (true) {
        bool x;
        x = true;
    }
    x = 1;
}
"#,
  );
  assert!(!diag.seen());
}

#[test]
fn branch_locals_do_not_collide_across_arms() {
  let diag = analyze(
    r#"
void main() {
    if (true) {
        int y;
        y = 1;
    }
    else {
        int y;
        y = 2;
    }
}
"#,
  );
  assert!(!diag.seen());
}

#[test]
fn self_referential_struct_is_an_invalid_field_type() {
  let diag = analyze(
    r#"
struct A { struct A next; };
void main() { }
"#,
  );
  assert_eq!(messages(&diag), vec!["Invalid name of struct type"]);
}

/// Offsets follow the frame convention: formal i at -4i, locals from
/// -(4n + 8) downward, struct locals taking their full size.
#[test]
fn formals_and_locals_get_stacked_offsets() {
  let progs = r#"
struct P { int x; int y; };
int f(int a, bool b) {
    int u;
    struct P p;
    int v;
    return a;
}
void main() { }
"#;
  let mut program = parse(progs).unwrap();
  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag).unwrap();
  assert!(!diag.seen());

  let fun = program
    .decls
    .iter()
    .find_map(|d| match d {
      ast::Decl::Fn(fun) if fun.name.name == "f" => Some(fun),
      _ => None,
    })
    .unwrap();

  let loc_of = |ident: &ast::Ident| {
    ident.sym.as_ref().unwrap().as_var().unwrap().loc.get()
  };

  assert_eq!(loc_of(&fun.formals[0].name), VarLoc::Local { offset: 0 });
  assert_eq!(loc_of(&fun.formals[1].name), VarLoc::Local { offset: -4 });

  // Two formals: locals start at -16. `p` is 8 bytes, so it occupies the
  // slots at -20 and -24 with its base at the low address.
  assert_eq!(loc_of(&fun.body.decls[0].name), VarLoc::Local { offset: -16 });
  assert_eq!(loc_of(&fun.body.decls[1].name), VarLoc::Local { offset: -24 });
  assert_eq!(loc_of(&fun.body.decls[2].name), VarLoc::Local { offset: -28 });
  assert_eq!(fun.locals_size, 16);
}

#[test]
fn struct_fields_get_ascending_offsets() {
  let progs = r#"
struct A { int f; int g; };
struct B { struct A a; int t; };
void main() {
    struct B b;
    b.t = 1;
}
"#;
  let mut program = parse(progs).unwrap();
  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag).unwrap();
  assert!(!diag.seen());

  let st = program
    .decls
    .iter()
    .find_map(|d| match d {
      ast::Decl::Struct(st) if st.name.name == "B" => Some(st),
      _ => None,
    })
    .unwrap();
  let loc_of = |ident: &ast::Ident| {
    ident.sym.as_ref().unwrap().as_var().unwrap().loc.get()
  };
  assert_eq!(loc_of(&st.fields[0].name), VarLoc::Field { offset: 0 });
  assert_eq!(loc_of(&st.fields[1].name), VarLoc::Field { offset: 8 });
}

#[test]
fn every_use_binds_to_one_symbol() {
  let progs = r#"
int g;
void main() {
    g = 1;
    g = 2;
}
"#;
  let mut program = parse(progs).unwrap();
  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag).unwrap();
  assert!(!diag.seen());

  let decl_sym = program
    .decls
    .iter()
    .find_map(|d| match d {
      ast::Decl::Var(var) => var.name.sym.clone(),
      _ => None,
    })
    .unwrap();

  let fun = program
    .decls
    .iter()
    .find_map(|d| match d {
      ast::Decl::Fn(fun) => Some(fun),
      _ => None,
    })
    .unwrap();
  for stmt in &fun.body.stmts {
    let ast::Stmt::Assign(assign) = stmt else { panic!("expected assignment") };
    let ast::Exp::Id(id) = &assign.lhs else { panic!("expected identifier lhs") };
    assert!(std::rc::Rc::ptr_eq(id.sym.as_ref().unwrap(), &decl_sym));
  }
}
