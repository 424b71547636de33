//! Intcode program runner.
//!
//! Loads an intcode program from a file and runs it, feeding input from the
//! command line and, whenever the program waits for more, from stdin.
//!
//! # Usage
//! ```text
//! intcode <program> [OPTIONS]
//! ```
//!
//! # Arguments
//! - `program`: File holding a comma-separated intcode program
//!
//! # Options
//! - `-i, --input <values>`: Comma-separated values queued before the first run
//! - `-p, --patch <addr=value>`: Overwrite a memory cell before running (repeatable)
//! - `-a, --ascii`: Treat stdin lines and output values as ASCII text
//! - `-s, --stats`: Print the execution profile after the program halts
//!
//! # Logging
//! `INTCODE_LOG` sets the minimum log level (`debug`, `info`, `warn`, `error`);
//! `INTCODE_LOG_TIMESTAMP=0` hides timestamps.

use intcode::utils::log;
use intcode::virtual_machine::program::Program;
use intcode::virtual_machine::vm::VM;
use intcode::{error, info, warn};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::env;
use std::io::{self, BufRead, Write};
use std::process;

const ASCII_NEWLINE: u8 = b'\n';

fn main() {
    if let Err(e) = log::init_from_env() {
        warn!("Ignoring {}: {}", log::LEVEL_ENV, e);
    }

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let program_path = &args[1];
    let mut inputs: Vec<BigInt> = Vec::new();
    let mut patches: Vec<(usize, BigInt)> = Vec::new();
    let mut ascii = false;
    let mut stats = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            k @ ("--input" | "-i") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                let values = parse_values(&args[i]).unwrap_or_else(|e| {
                    error!("Invalid input values: {e}");
                    process::exit(1);
                });
                inputs.extend(values);
                i += 1;
            }
            k @ ("--patch" | "-p") => {
                i += 1;
                if i >= args.len() {
                    error!("{k} requires an argument");
                    process::exit(1);
                }
                let patch = parse_patch(&args[i]).unwrap_or_else(|e| {
                    error!("Invalid patch '{}': {e}", args[i]);
                    process::exit(1);
                });
                patches.push(patch);
                i += 1;
            }
            "--ascii" | "-a" => {
                ascii = true;
                i += 1;
            }
            "--stats" | "-s" => {
                stats = true;
                i += 1;
            }
            other => {
                error!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let program = Program::from_file(program_path).unwrap_or_else(|e| {
        error!("{e}");
        process::exit(1);
    });
    info!("Loaded {} ({} cells)", program_path, program.len());

    let mut vm = VM::new(program);
    for (address, value) in patches {
        vm.write(address, value);
    }
    vm.send_inputs(inputs);
    vm.set_output_fn(move |value: &BigInt| print_value(value, ascii));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        if let Err(e) = vm.run() {
            error!("Execution failed: {e}");
            process::exit(1);
        }
        if vm.is_halted() {
            break;
        }

        let _ = io::stdout().flush();
        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                error!("Failed to read stdin: {e}");
                process::exit(1);
            }
            None => {
                error!("Program is waiting for input at ip {} but stdin is closed", vm.ip());
                process::exit(1);
            }
        };

        if ascii {
            vm.send_inputs(line.bytes().chain([ASCII_NEWLINE]));
            continue;
        }
        match parse_values(&line) {
            Ok(values) => vm.send_inputs(values),
            Err(e) => warn!("Ignoring input line: {e}"),
        }
    }
    let _ = io::stdout().flush();

    if stats {
        print_profile(&vm);
    }
}

/// Prints one output value, as a character in ASCII mode when it is one.
fn print_value(value: &BigInt, ascii: bool) {
    match value.to_u8().filter(|b| ascii && b.is_ascii()) {
        Some(b) => print!("{}", b as char),
        None => println!("{value}"),
    }
}

/// Parses integers separated by commas and/or whitespace.
fn parse_values(text: &str) -> Result<Vec<BigInt>, String> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<BigInt>()
                .map_err(|_| format!("'{token}' is not an integer"))
        })
        .collect()
}

/// Parses an `ADDR=VALUE` memory patch.
fn parse_patch(text: &str) -> Result<(usize, BigInt), String> {
    let (address, value) = text
        .split_once('=')
        .ok_or_else(|| "expected ADDR=VALUE".to_string())?;
    let address = address
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a valid address", address.trim()))?;
    let value = value
        .trim()
        .parse::<BigInt>()
        .map_err(|_| format!("'{}' is not an integer", value.trim()))?;
    Ok((address, value))
}

fn print_profile(vm: &VM) {
    let profile = vm.profile();
    let total_u = profile.total();
    let total = total_u as f64;

    let cat_w = 2 + profile
        .iter()
        .map(|(c, _)| c.as_str().chars().count())
        .max()
        .unwrap_or(0)
        .max("total".chars().count());

    let amt_w = profile
        .iter()
        .map(|(_, n)| format_with_commas(n).chars().count())
        .max()
        .unwrap_or(0)
        .max(format_with_commas(total_u).chars().count());

    let dash_w = cat_w + 1 + amt_w + 2 + "( 100.0%)".len();

    println!("Execution Profile:");
    println!("{}", "-".repeat(dash_w));

    for (category, count) in profile.iter() {
        if count == 0 {
            continue;
        }

        let percent = if total > 0.0 {
            (count as f64 / total) * 100.0
        } else {
            0.0
        };

        println!(
            "{:<cat_w$} {:>amt_w$} ({:>5.1}%)",
            category.as_str(),
            format_with_commas(count),
            percent,
            cat_w = cat_w,
            amt_w = amt_w,
        );
    }

    println!("{}", "-".repeat(dash_w));
    println!(
        "{:<cat_w$} {:>amt_w$} ({:>5.1}%)",
        "total",
        format_with_commas(total_u),
        100.0,
        cat_w = cat_w,
        amt_w = amt_w,
    );

    info!(
        "Suspended for input {} times; memory extent {}",
        format_with_commas(profile.suspensions()),
        format_with_commas(vm.memory_extent() as u64)
    );
}

fn format_with_commas(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i).is_multiple_of(3) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

const USAGE: &str = "\
Intcode Runner

USAGE:
    {program} <program> [OPTIONS]

ARGS:
    <program>    File holding a comma-separated intcode program

OPTIONS:
    -i, --input <values>       Comma-separated values queued before running
    -p, --patch <addr=value>   Overwrite a memory cell before running (repeatable)
    -a, --ascii                Read stdin and print output as ASCII text
    -s, --stats                Print the execution profile after halting
    -h, --help                 Print this help message

ENVIRONMENT:
    INTCODE_LOG              Minimum log level: debug, info, warn, error
    INTCODE_LOG_TIMESTAMP    Set to 0 to hide log timestamps

EXAMPLES:
    # Run with one queued input value
    {program} diagnostics.txt -i 5

    # Seed two cells before running
    {program} gravity.txt -p 1=12 -p 2=2

    # Interactive text adventure
    {program} droid.txt --ascii
";

fn print_usage(program: &str) {
    info!("{}", USAGE.replace("{program}", program));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_values_accepts_commas_and_spaces() {
        let values = parse_values(" 1, -2 3,,4 ").unwrap();
        assert_eq!(values, [1, -2, 3, 4].map(BigInt::from).to_vec());
        assert!(parse_values("").unwrap().is_empty());
        assert!(parse_values("1,x").is_err());
    }

    #[test]
    fn parse_patch_valid() {
        assert_eq!(parse_patch("1=12").unwrap(), (1, BigInt::from(12)));
        assert_eq!(parse_patch(" 7 = -3 ").unwrap(), (7, BigInt::from(-3)));
    }

    #[test]
    fn parse_patch_invalid() {
        assert!(parse_patch("12").is_err());
        assert!(parse_patch("-1=5").is_err());
        assert!(parse_patch("3=five").is_err());
    }

    #[test]
    fn format_with_commas_groups_thousands() {
        assert_eq!(format_with_commas(0), "0");
        assert_eq!(format_with_commas(999), "999");
        assert_eq!(format_with_commas(1000), "1,000");
        assert_eq!(format_with_commas(1234567), "1,234,567");
    }
}
