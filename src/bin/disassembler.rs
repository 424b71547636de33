//! Intcode disassembler CLI.
//!
//! Reads an intcode program file and prints a linear-sweep disassembly.
//!
//! # Usage
//! ```text
//! disassembler <program> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program`: File holding a comma-separated intcode program
//!
//! # Options
//! - `-o, --output <file>`: Write the listing to a file instead of stdout
//!
//! # Examples
//! ```text
//! disassembler program.txt
//! disassembler program.txt -o program.lst
//! ```

use intcode::utils::log;
use intcode::virtual_machine::disasm::disassemble;
use intcode::virtual_machine::program::Program;
use intcode::{error, info, warn};
use std::env;
use std::fs;
use std::path::Path;
use std::process;

fn main() {
    if let Err(e) = log::init_from_env() {
        warn!("Ignoring {}: {}", log::LEVEL_ENV, e);
    }

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let input_path = &args[1];
    let mut output_path: Option<String> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--output" | "-o") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                output_path = Some(args[i].clone());
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let program = Program::from_file(input_path).unwrap_or_else(|e| {
        error!("{e}");
        process::exit(1);
    });

    let listing = disassemble(&program);
    let instructions = listing.instructions().count();
    let text = listing.to_string();

    match output_path {
        None => print!("{text}"),
        Some(path) => {
            if let Some(parent) = Path::new(&path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                error!("Output directory does not exist: {}", parent.display());
                process::exit(1);
            }
            if let Err(e) = fs::write(&path, text) {
                error!("Failed to write output file: {}", e);
                process::exit(1);
            }
            info!("Disassembled {} -> {}", input_path, path);
        }
    }

    info!(
        "{} cells, {} instructions, {} data cells",
        program.len(),
        instructions,
        listing.lines().len() - instructions
    );
}

const USAGE: &str = "\
Intcode Disassembler

USAGE:
    {program} <program> [OPTIONS]

ARGS:
    <program>    File holding a comma-separated intcode program

OPTIONS:
    -o, --output <file>    Write the listing to a file instead of stdout
    -h, --help             Print this help message

EXAMPLES:
    {program} program.txt
    {program} program.txt -o program.lst
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}
