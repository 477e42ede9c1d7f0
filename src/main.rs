// File: src/main.rs
//
// Main entry point for the Quill programming language interpreter.
// Handles command-line argument parsing, drives the lex → parse → run
// pipeline, and exits with the interpreter's code.

use clap::{Parser as ClapParser, Subcommand};
use quill::interpreter::Interpreter;
use quill::{lexer, parser};
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser)]
#[command(
    name = "quill",
    about = "Quill: a small imperative scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Quill script file
    Run {
        /// Path to the .ql file
        file: PathBuf,

        /// Print token counts and phase traces
        #[arg(long)]
        debug: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { file, debug } => {
            process::exit(run_file(&file, debug));
        }
    }
}

fn run_file(file: &PathBuf, debug: bool) -> i32 {
    let code = match fs::read_to_string(file) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: cannot read '{}': {}", file.display(), err);
            return 1;
        }
    };

    if debug {
        eprintln!("[debug] read {} bytes from {}", code.len(), file.display());
    }

    let tokens = match lexer::tokenize(&code) {
        Ok(tokens) => tokens,
        Err(err) => {
            eprintln!("{}", err);
            // Best-effort second pass: blank out offending characters and
            // keep going so later errors still surface.
            let (recovered, more_errors) = lexer::tokenize_with_recovery(&code);
            for err in more_errors.iter().skip(1) {
                eprintln!("{}", err);
            }
            if recovered.is_empty() {
                return 1;
            }
            eprintln!("Continuing after lexical recovery");
            recovered
        }
    };

    if debug {
        eprintln!("[debug] lexer produced {} tokens", tokens.len());
    }

    let mut parser = parser::Parser::new(tokens);
    let (program, errors) = parser.parse();
    for err in &errors {
        eprintln!("{}", err);
    }
    if program.functions.is_empty() && !errors.is_empty() {
        return 1;
    }

    if debug {
        eprintln!(
            "[debug] parsed {} imports, {} globals, {} functions",
            program.imports.len(),
            program.globals.len(),
            program.functions.len()
        );
    }

    let mut interpreter = Interpreter::new();
    interpreter.run(&program)
}
