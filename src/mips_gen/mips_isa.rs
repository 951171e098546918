//! The slice of the MIPS/SPIM instruction set the generator emits, plus the
//! assembly-program buffer it emits into. Everything renders to text; SPIM
//! expands the pseudo-instructions.

use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reg {
  Zero,
  V0,
  A0,
  T0,
  T1,
  Sp,
  Fp,
  Ra,
}

impl Display for Reg {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Reg::Zero => "$zero",
      Reg::V0 => "$v0",
      Reg::A0 => "$a0",
      Reg::T0 => "$t0",
      Reg::T1 => "$t1",
      Reg::Sp => "$sp",
      Reg::Fp => "$fp",
      Reg::Ra => "$ra",
    };
    write!(f, "{}", name)
  }
}

/// A memory operand for `lw`/`sw`/`la`.
#[derive(Clone, Debug)]
pub enum Mem {
  /// `offset($reg)`
  Indexed(Reg, i32),
  /// A bare label such as `_g`.
  Label(String),
  /// `label+offset`, for a field inside a global struct.
  LabelOffset(String, i32),
}

impl Display for Mem {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Mem::Indexed(reg, offset) => write!(f, "{}({})", offset, reg),
      Mem::Label(label) => write!(f, "{}", label),
      Mem::LabelOffset(label, offset) => write!(f, "{}+{}", label, offset),
    }
  }
}

/// The last operand of the three-operand ALU forms; SPIM accepts either a
/// register or an immediate there.
#[derive(Clone, Copy, Debug)]
pub enum Operand {
  Reg(Reg),
  Imm(i32),
}

impl Display for Operand {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Operand::Reg(reg) => write!(f, "{}", reg),
      Operand::Imm(imm) => write!(f, "{}", imm),
    }
  }
}

pub enum Inst {
  Li(Reg, i32),
  La(Reg, Mem),
  Lw(Reg, Mem),
  Sw(Reg, Mem),
  Add(Reg, Reg, Operand),
  Addu(Reg, Reg, Operand),
  Sub(Reg, Reg, Operand),
  Mulo(Reg, Reg, Reg),
  Div(Reg, Reg, Reg),
  And(Reg, Reg, Reg),
  Or(Reg, Reg, Reg),
  Xor(Reg, Reg, Operand),
  Seq(Reg, Reg, Reg),
  Sne(Reg, Reg, Reg),
  Slt(Reg, Reg, Reg),
  Sle(Reg, Reg, Reg),
  Sgt(Reg, Reg, Reg),
  Sge(Reg, Reg, Reg),
  Beq(Reg, Reg, String),
  Bne(Reg, Reg, String),
  Blt(Reg, Reg, String),
  Ble(Reg, Reg, String),
  Bgt(Reg, Reg, String),
  Bge(Reg, Reg, String),
  B(String),
  Jal(String),
  Jr(Reg),
  Move(Reg, Reg),
  Syscall,
}

impl Display for Inst {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Inst::Li(r, imm) => write!(f, "li {}, {}", r, imm),
      Inst::La(r, mem) => write!(f, "la {}, {}", r, mem),
      Inst::Lw(r, mem) => write!(f, "lw {}, {}", r, mem),
      Inst::Sw(r, mem) => write!(f, "sw {}, {}", r, mem),
      Inst::Add(d, s, o) => write!(f, "add {}, {}, {}", d, s, o),
      Inst::Addu(d, s, o) => write!(f, "addu {}, {}, {}", d, s, o),
      Inst::Sub(d, s, o) => write!(f, "sub {}, {}, {}", d, s, o),
      Inst::Mulo(d, s, t) => write!(f, "mulo {}, {}, {}", d, s, t),
      Inst::Div(d, s, t) => write!(f, "div {}, {}, {}", d, s, t),
      Inst::And(d, s, t) => write!(f, "and {}, {}, {}", d, s, t),
      Inst::Or(d, s, t) => write!(f, "or {}, {}, {}", d, s, t),
      Inst::Xor(d, s, o) => write!(f, "xor {}, {}, {}", d, s, o),
      Inst::Seq(d, s, t) => write!(f, "seq {}, {}, {}", d, s, t),
      Inst::Sne(d, s, t) => write!(f, "sne {}, {}, {}", d, s, t),
      Inst::Slt(d, s, t) => write!(f, "slt {}, {}, {}", d, s, t),
      Inst::Sle(d, s, t) => write!(f, "sle {}, {}, {}", d, s, t),
      Inst::Sgt(d, s, t) => write!(f, "sgt {}, {}, {}", d, s, t),
      Inst::Sge(d, s, t) => write!(f, "sge {}, {}, {}", d, s, t),
      Inst::Beq(s, t, label) => write!(f, "beq {}, {}, {}", s, t, label),
      Inst::Bne(s, t, label) => write!(f, "bne {}, {}, {}", s, t, label),
      Inst::Blt(s, t, label) => write!(f, "blt {}, {}, {}", s, t, label),
      Inst::Ble(s, t, label) => write!(f, "ble {}, {}, {}", s, t, label),
      Inst::Bgt(s, t, label) => write!(f, "bgt {}, {}, {}", s, t, label),
      Inst::Bge(s, t, label) => write!(f, "bge {}, {}, {}", s, t, label),
      Inst::B(label) => write!(f, "b {}", label),
      Inst::Jal(label) => write!(f, "jal {}", label),
      Inst::Jr(r) => write!(f, "jr {}", r),
      Inst::Move(d, s) => write!(f, "move {}, {}", d, s),
      Inst::Syscall => write!(f, "syscall"),
    }
  }
}

pub enum Directive {
  Data,
  Text,
  Align(u32),
  Space(i32),
  /// The operand keeps the quotes and escapes from the source literal.
  Asciiz(String),
}

impl Display for Directive {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Directive::Data => write!(f, ".data"),
      Directive::Text => write!(f, ".text"),
      Directive::Align(n) => write!(f, ".align {}", n),
      Directive::Space(n) => write!(f, ".space {}", n),
      Directive::Asciiz(text) => write!(f, ".asciiz {}", text),
    }
  }
}

pub enum AsmLine {
  Directive(Directive),
  Label(String),
  Inst(Inst),
  Comment(String),
}

/// An assembly program under construction, appended to line by line and
/// dumped to text at the end.
pub struct AsmProg {
  lines: Vec<AsmLine>,
}

impl AsmProg {
  pub fn new() -> AsmProg {
    AsmProg { lines: Vec::new() }
  }

  pub fn directive(&mut self, directive: Directive) {
    self.lines.push(AsmLine::Directive(directive));
  }

  pub fn label(&mut self, label: impl Into<String>) {
    self.lines.push(AsmLine::Label(label.into()));
  }

  pub fn inst(&mut self, inst: Inst) {
    self.lines.push(AsmLine::Inst(inst));
  }

  pub fn more_insts(&mut self, insts: impl IntoIterator<Item = Inst>) {
    self.lines.extend(insts.into_iter().map(AsmLine::Inst));
  }

  pub fn comment(&mut self, text: impl Into<String>) {
    self.lines.push(AsmLine::Comment(text.into()));
  }

  /// Push a register onto the runtime stack. `$sp` always points at the
  /// next free slot, so the store happens before the decrement.
  pub fn push(&mut self, reg: Reg) {
    self.more_insts([
      Inst::Sw(reg, Mem::Indexed(Reg::Sp, 0)),
      Inst::Sub(Reg::Sp, Reg::Sp, Operand::Imm(4)),
    ]);
  }

  /// Pop the top of the runtime stack into a register.
  pub fn pop(&mut self, reg: Reg) {
    self.more_insts([
      Inst::Lw(reg, Mem::Indexed(Reg::Sp, 4)),
      Inst::Addu(Reg::Sp, Reg::Sp, Operand::Imm(4)),
    ]);
  }

  /// Load the word on top of the stack without popping it.
  pub fn peek(&mut self, reg: Reg) {
    self.inst(Inst::Lw(reg, Mem::Indexed(Reg::Sp, 4)));
  }

  pub fn lines(&self) -> &[AsmLine] {
    &self.lines
  }

  /// Render the whole program as SPIM-ready text.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    for line in &self.lines {
      match line {
        AsmLine::Directive(d) => out.push_str(&format!("\t{}\n", d)),
        AsmLine::Label(l) => out.push_str(&format!("{}:\n", l)),
        AsmLine::Inst(i) => out.push_str(&format!("\t{}\n", i)),
        AsmLine::Comment(c) => out.push_str(&format!("\t\t# {}\n", c)),
      }
    }
    out
  }
}
