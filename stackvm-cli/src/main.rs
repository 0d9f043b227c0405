//! stackvm CLI: assemble, verify, inspect and execute code arrays.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Input/decode/assembly error
//! - 2: Verification failure
//! - 3: Runtime fault

mod commands;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "assemble" => commands::assemble(&args[2..]),
        "verify" => commands::verify(&args[2..]),
        "run" => commands::run(&args[2..]),
        "disassemble" => commands::disassemble(&args[2..]),
        "hash" => commands::hash(&args[2..]),
        "--help" | "-h" | "help" => {
            print_usage();
            process::exit(0);
        }
        other => {
            eprintln!("error: unknown command '{other}'");
            eprintln!();
            print_usage();
            process::exit(1);
        }
    };

    if let Err(code) = result {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: stackvm <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  assemble <input.svm> [-o output.svmb]     Assemble text to binary");
    eprintln!("  verify <input> [--start N] [--globals N]  Verify a program");
    eprintln!("  run <input> [options]                     Execute a program");
    eprintln!("  disassemble <input.svmb>                  Disassemble binary to text");
    eprintln!("  hash <input>                              Print the program fingerprint");
    eprintln!();
    eprintln!("Run options:");
    eprintln!("  --start N      Start address (default: .entry, or 0)");
    eprintln!("  --globals N    Global store size (default: .globals, or 0)");
    eprintln!("  --stack N      Operand stack capacity (default 1024)");
    eprintln!("  --trace        Trace every instruction and dump globals");
    eprintln!("  --unchecked    Verify, then run the threaded loop without checks");
    eprintln!("  --time         Report elapsed time on stderr");
    eprintln!();
    eprintln!("Inputs ending in .svm are assembled first; anything else is read");
    eprintln!("as a binary of little-endian 32-bit words.");
}
