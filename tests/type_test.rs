use mini_compiler::diag::ErrorLog;
use mini_compiler::{name_analysis, parse, type_check};

/// Run the front half of the pipeline and collect the type checker's
/// diagnostics. Programs here must be name-clean.
fn check(progs: &str) -> ErrorLog {
  let mut program = parse(progs).unwrap();
  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag).unwrap();
  assert!(!diag.seen(), "test program has name errors: {:?}", diag.entries());
  type_check::check(&program, &mut diag);
  diag
}

fn messages(diag: &ErrorLog) -> Vec<String> {
  diag.entries().iter().map(|d| d.message.clone()).collect()
}

#[test]
fn clean_program_produces_no_errors() {
  let diag = check(
    r#"
int add(int a, int b) {
    return a + b;
}
void main() {
    int x;
    bool b;
    x = add(1, 2) * 3;
    b = x < 10 && true;
    if (b) {
        cout << x;
    }
}
"#,
  );
  assert!(!diag.seen());
}

#[test]
fn arithmetic_on_bools_flags_each_bad_operand() {
  let diag = check(
    r#"
void main() {
    int x;
    x = true + false;
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Arithmetic operator applied to non-numeric operand",
      "Arithmetic operator applied to non-numeric operand",
    ]
  );
}

#[test]
fn logical_on_int_is_reported() {
  let diag = check(
    r#"
void main() {
    bool b;
    b = 1 && true;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Logical operator applied to non-bool operand"]);
}

#[test]
fn relational_on_bool_is_reported() {
  let diag = check(
    r#"
void main() {
    bool b;
    b = true < false;
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Relational operator applied to non-numeric operand",
      "Relational operator applied to non-numeric operand",
    ]
  );
}

#[test]
fn unary_operators_check_their_operand() {
  let diag = check(
    r#"
void main() {
    int x;
    bool b;
    x = -true;
    b = !3;
}
"#,
  );
  // The failed operators type as errors, so the enclosing assignments
  // stay quiet.
  assert_eq!(
    messages(&diag),
    vec![
      "Arithmetic operator applied to non-numeric operand",
      "Logical operator applied to non-bool operand",
    ]
  );
}

#[test]
fn errors_do_not_cascade_through_operators() {
  // Only the innermost mistake is reported; the surrounding `*` and the
  // assignment both swallow the error type.
  let diag = check(
    r#"
void main() {
    int x;
    x = (true + 1) * 2;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Arithmetic operator applied to non-numeric operand"]);
}

#[test]
fn equality_operand_rules() {
  let diag = check(
    r#"
struct A { int f; };
void v() { }
void main() {
    struct A a;
    struct A b;
    bool t;
    t = v() == v();
    t = main == v;
    t = a == b;
    t = 1 == true;
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Equality operator applied to void functions",
      "Equality operator applied to functions",
      "Equality operator applied to struct variables",
      "Type mismatch",
    ]
  );
}

#[test]
fn struct_name_comparison_is_reported() {
  let diag = check(
    r#"
struct A { int f; };
struct B { int f; };
void main() {
    bool t;
    t = A == B;
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec!["Equality operator applied to struct names", "Type mismatch"]
  );
}

#[test]
fn assignment_special_cases() {
  let diag = check(
    r#"
struct A { int f; };
void f() { }
void g() { }
void main() {
    struct A a;
    struct A b;
    f = g;
    A = A;
    a = b;
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Function assignment",
      "Struct name assignment",
      "Struct variable assignment",
    ]
  );
}

#[test]
fn assignment_type_mismatch() {
  let diag = check(
    r#"
void main() {
    int x;
    x = true;
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Type mismatch"]);
}

#[test]
fn read_and_write_reject_non_data_operands() {
  let diag = check(
    r#"
struct A { int f; };
void f() { }
void main() {
    struct A a;
    cin >> f;
    cin >> A;
    cin >> a;
    cout << f;
    cout << A;
    cout << a;
    cout << f();
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Attempt to read a function",
      "Attempt to read a struct name",
      "Attempt to read a struct variable",
      "Attempt to write a function",
      "Attempt to write a struct name",
      "Attempt to write a struct variable",
      "Attempt to write void",
    ]
  );
}

#[test]
fn conditions_must_be_bool() {
  let diag = check(
    r#"
void main() {
    if (1) {
        cout << 1;
    }
    while (2) {
        cout << 2;
    }
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Non-bool expression used as an if condition",
      "Non-bool expression used as a while condition",
    ]
  );
}

#[test]
fn call_checking() {
  let diag = check(
    r#"
int add(int a, int b) {
    return a + b;
}
void main() {
    int x;
    x = add(1);
    x = add(1, true);
    x = x();
}
"#,
  );
  assert_eq!(
    messages(&diag),
    vec![
      "Function call with wrong number of args",
      "Type of actual does not match type of formal",
      "Attempt to call a non-function",
    ]
  );
}

#[test]
fn return_with_value_in_void_function() {
  let progs = "void main() {\nreturn 1;\n}\n";
  let diag = check(progs);
  assert_eq!(diag.entries().len(), 1);
  assert_eq!(
    diag.entries()[0].render(),
    "2:8 ***ERROR*** Return with a value in a void function"
  );
}

#[test]
fn missing_return_value_is_reported_at_origin() {
  let diag = check(
    r#"
int f() {
    return;
}
void main() { }
"#,
  );
  assert_eq!(diag.entries().len(), 1);
  assert_eq!(diag.entries()[0].render(), "0:0 ***ERROR*** Missing return value");
}

#[test]
fn bad_return_value() {
  let diag = check(
    r#"
int f() {
    return true;
}
void main() { }
"#,
  );
  assert_eq!(messages(&diag), vec!["Bad return value"]);
}

#[test]
fn string_literals_type_as_strings() {
  let diag = check(
    r#"
void main() {
    int x;
    cout << "ok";
    x = "bad";
}
"#,
  );
  assert_eq!(messages(&diag), vec!["Type mismatch"]);
}
