use std::fs;
use std::process::ExitCode;

use clap::Parser;

use mini_compiler::diag::ErrorLog;
use mini_compiler::error::{CompileError, CompileResult};
use mini_compiler::{mips_gen, name_analysis, parse, type_check, unparse};

/// Compile a Mini source file to SPIM-flavoured MIPS assembly.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
  /// Mini source file.
  input: String,

  /// Assembly output file.
  asm_out: String,

  /// Optional unparse output file.
  unparse_out: Option<String>,
}

fn main() -> ExitCode {
  let args = Cli::parse();
  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("{}", err);
      // The historical failure exit status.
      ExitCode::from(255)
    }
  }
}

fn run(args: &Cli) -> CompileResult<()> {
  let source_text = fs::read_to_string(&args.input).map_err(|source| {
    CompileError::ReadInput { path: args.input.clone(), source }
  })?;

  let mut program = parse(&source_text)?;

  let mut diag = ErrorLog::new();
  name_analysis::analyze(&mut program, &mut diag)?;
  if diag.seen() {
    return Err(CompileError::PhaseFailed { phase: "name analysis" });
  }

  type_check::check(&program, &mut diag);
  if diag.seen() {
    return Err(CompileError::PhaseFailed { phase: "type checking" });
  }

  if let Some(path) = &args.unparse_out {
    fs::write(path, unparse::unparse(&program)).map_err(|source| {
      CompileError::WriteOutput { path: path.clone(), source }
    })?;
  }

  let asm = mips_gen::gen_program(&program).dump();
  fs::write(&args.asm_out, asm).map_err(|source| {
    CompileError::WriteOutput { path: args.asm_out.clone(), source }
  })?;
  Ok(())
}
