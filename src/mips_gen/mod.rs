pub mod gen;
pub mod mips_isa;

pub use gen::gen_program;
pub use mips_isa::AsmProg;
