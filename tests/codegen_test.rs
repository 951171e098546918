use std::collections::HashSet;

fn compile(progs: &str) -> String {
  mini_compiler::compile(progs).unwrap()
}

fn count(haystack: &str, needle: &str) -> usize {
  haystack.matches(needle).count()
}

#[test]
fn hello_world_prints_and_exits() {
  let asm = compile(
    r#"
void main() {
    cout << "hi";
}
"#,
  );
  assert!(asm.contains(".asciiz \"hi\""));
  assert!(asm.contains("li $v0, 4"));
  assert!(asm.contains("syscall"));
  // Exit syscall at the end of main.
  assert!(asm.contains("li $v0, 10"));
}

#[test]
fn main_gets_both_entry_labels() {
  let asm = compile("void main() { }\n");
  assert!(asm.contains("main:\n__start:\n"));
  // No `jr $ra` in main; it exits through syscall 10.
  assert!(!asm.contains("jr $ra"));
}

#[test]
fn globals_live_in_data_with_underscore_labels() {
  let asm = compile(
    r#"
int g;
void main() {
    g = 2;
}
"#,
  );
  assert!(asm.contains("_g:"));
  assert!(asm.contains(".space 4"));
  assert!(asm.contains("la $t0, _g"));
  assert!(asm.contains("sw $t1, 0($t0)"));
}

#[test]
fn global_struct_reserves_its_full_size() {
  let asm = compile(
    r#"
struct P { int x; int y; };
struct P p;
void main() {
    p.y = 1;
}
"#,
  );
  assert!(asm.contains(".space 8"));
  assert!(asm.contains("la $t0, _p+4"));
}

#[test]
fn nested_field_store_uses_the_summed_offset() {
  let asm = compile(
    r#"
struct A { int f; int g; };
struct B { struct A a; int t; };
void main() {
    struct B b;
    b.a.g = 1;
}
"#,
  );
  // `b` is 12 bytes based at -16($fp); field path a(+0).g(+4).
  assert!(asm.contains("la $t0, -12($fp)"));
  assert!(asm.contains("sw $t1, 0($t0)"));
}

#[test]
fn or_short_circuits_before_the_right_operand() {
  let asm = compile(
    r#"
void main() {
    bool b;
    b = true;
    if (b || (1 / 0 == 0)) {
        cout << 1;
    }
}
"#,
  );
  // The condition loads `b` and branches before the division is ever
  // reached.
  let branch = asm.find("beq $t0, $zero, _L").unwrap();
  let take = asm.find("\tb _L").unwrap();
  let div = asm.find("div $t0").unwrap();
  assert!(branch < div);
  assert!(take < div);
}

#[test]
fn equal_string_literals_share_one_asciiz() {
  let asm = compile(
    r#"
void main() {
    cout << "hi";
    cout << "hi";
    cout << "yo";
}
"#,
  );
  assert_eq!(count(&asm, ".asciiz \"hi\""), 1);
  assert_eq!(count(&asm, ".asciiz \"yo\""), 1);
  assert_eq!(count(&asm, "li $v0, 4"), 3);
}

#[test]
fn control_flow_labels_are_unique() {
  let asm = compile(
    r#"
void main() {
    int i;
    i = 0;
    while (i < 3) {
        if (i == 1) {
            cout << i;
        }
        else {
            cout << 0;
        }
        i++;
    }
    if (true) {
        cout << 9;
    }
}
"#,
  );
  let mut seen = HashSet::new();
  for line in asm.lines() {
    if let Some(label) = line.strip_suffix(':') {
      assert!(seen.insert(label.to_string()), "label {} defined twice", label);
    }
  }
}

#[test]
fn function_frames_follow_the_calling_convention() {
  let asm = compile(
    r#"
int add(int a, int b) {
    return a + b;
}
void main() {
    int r;
    r = add(1, 2);
}
"#,
  );
  assert!(asm.contains("_add:"));
  // Two formals: fp lands 16 bytes above sp after the pushes.
  assert!(asm.contains("addu $fp, $sp, 16"));
  // Formal loads at 0 and -4 from fp.
  assert!(asm.contains("lw $t0, 0($fp)"));
  assert!(asm.contains("lw $t0, -4($fp)"));
  // Epilogue restores ra from below the formals and returns.
  assert!(asm.contains("lw $ra, -8($fp)"));
  assert!(asm.contains("jr $ra"));
  assert!(asm.contains("jal _add"));
  // main reserves its one local.
  assert!(asm.contains("sub $sp, $sp, 4"));
}

#[test]
fn recursive_main_is_called_by_its_bare_name() {
  let asm = compile(
    r#"
void main() {
    main();
}
"#,
  );
  assert_eq!(count(&asm, "jal main"), 1);
}

#[test]
fn reading_a_bool_normalises_the_input() {
  let asm = compile(
    r#"
void main() {
    bool flag;
    cin >> flag;
}
"#,
  );
  assert!(asm.contains("li $v0, 5"));
  assert!(asm.contains("sne $v0, $v0, $zero"));
  assert!(asm.contains("sw $v0, 0($t0)"));
}

#[test]
fn reading_an_int_stores_the_raw_value() {
  let asm = compile(
    r#"
void main() {
    int x;
    cin >> x;
}
"#,
  );
  assert!(asm.contains("li $v0, 5"));
  assert!(!asm.contains("sne $v0"));
}

#[test]
fn while_loops_branch_back_to_their_test() {
  let asm = compile(
    r#"
void main() {
    int i;
    i = 0;
    while (i < 10) {
        i++;
    }
}
"#,
  );
  // Jump-mode relational condition and the post-increment body.
  assert!(asm.contains("blt $t0, $t1, _L"));
  assert!(asm.contains("add $t0, $t0, 1"));
  // One branch re-enters the loop, one jumps out of the condition.
  assert!(count(&asm, "\tb _L") >= 2);
}

#[test]
fn post_decrement_subtracts_one_in_place() {
  let asm = compile(
    r#"
void main() {
    int i;
    i = 5;
    i--;
}
"#,
  );
  assert!(asm.contains("sub $t0, $t0, 1"));
  assert!(asm.contains("sw $t0, 0($t1)"));
}

#[test]
fn and_in_value_mode_keeps_the_left_result_on_bailout() {
  let asm = compile(
    r#"
void main() {
    bool a;
    bool b;
    a = false;
    b = a && true;
}
"#,
  );
  // Value-mode && peeks the left operand and skips the right side.
  assert!(asm.contains("beq $t0, $zero, _L"));
  assert!(asm.contains("and $t0, $t0, $t1"));
}
