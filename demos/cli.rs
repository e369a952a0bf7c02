//! Thin driver over [`pyrite::compile`]: reads a file, prints diagnostics or
//! the instruction listing, and exits with the status from §6's policy.
//! This binary is an "external collaborator" demonstrating the public
//! entry point; it is not part of the compiler core.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pyrite::{compile, CompileOptions};

#[derive(Debug, Parser)]
#[clap(name = "pyrite", version)]
struct App {
  /// Source file to compile.
  path: PathBuf,

  /// Print the emitted three-address instructions instead of just a summary.
  #[clap(long)]
  emit_ir: bool,
}

fn main() -> ExitCode {
  let app = App::parse();

  let source = match std::fs::read_to_string(&app.path) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("could not read {}: {err}", app.path.display());
      return ExitCode::from(5);
    }
  };

  let result = compile(&source, CompileOptions { debug: false, emit_ir: true });

  for diagnostic in &result.diagnostics {
    eprintln!("{diagnostic}");
  }

  if result.success {
    if app.emit_ir {
      if let Some(ir) = result.render_ir() {
        println!("{ir}");
      }
    } else {
      println!("ok");
    }
  }

  ExitCode::from(result.exit_code())
}
