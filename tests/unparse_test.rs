use mini_compiler::{parse, unparse};

#[test]
fn round_trips_through_its_own_output() {
  let progs = r#"
int g;
struct P { int x; int y; };
int add(int a, int b) {
    return a + b;
}
void main() {
    struct P p;
    p.x = add(g, 2) * 3;
    if (p.x < 10) {
        cout << "small";
    }
    else {
        cout << p.x;
    }
    while (p.x > 0) {
        p.x--;
    }
}
"#;
  let first = unparse::unparse(&parse(progs).unwrap());
  // The printed form is itself valid Mini and prints identically.
  let second = unparse::unparse(&parse(&first).unwrap());
  assert_eq!(first, second);
}

#[test]
fn expressions_come_out_fully_parenthesised() {
  let progs = "void main() {\nint x;\nx = 1 + 2 * 3;\n}\n";
  let out = unparse::unparse(&parse(progs).unwrap());
  assert!(out.contains("x = (1 + (2 * 3));"));
}
