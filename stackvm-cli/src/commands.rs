//! CLI command implementations.

use std::fs;
use std::io;
use std::time::Instant;

use stackvm_assembler::Assembly;
use stackvm_common::Program;
use stackvm_vm::{VmConfig, DEFAULT_GLOBAL_COUNT, DEFAULT_STACK_CAPACITY};

/// Assemble a .svm text file to a .svmb binary.
pub fn assemble(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: stackvm assemble <input.svm> [-o output.svmb]";
    let options = Options::parse(args, &["-o"], USAGE)?;
    let input = &options.input;

    let output = match &options.output {
        Some(output) => output.clone(),
        None => match input.strip_suffix(".svm") {
            Some(stem) => format!("{stem}.svmb"),
            None => format!("{input}.svmb"),
        },
    };

    let assembly = assemble_file(input)?;
    let bytes = assembly.program.encode();

    fs::write(&output, &bytes).map_err(|e| {
        eprintln!("error: cannot write '{output}': {e}");
        1
    })?;

    eprintln!(
        "assembled {} words ({} bytes) -> {output}",
        assembly.program.len(),
        bytes.len()
    );
    // The binary format carries code only.
    if assembly.entry != 0 || assembly.globals != DEFAULT_GLOBAL_COUNT {
        eprintln!(
            "note: run the binary with --start {} --globals {}",
            assembly.entry, assembly.globals
        );
    }
    Ok(())
}

/// Verify a program against its entry point and global store size.
pub fn verify(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: stackvm verify <input> [--start N] [--globals N]";
    let options = Options::parse(args, &["--start", "--globals"], USAGE)?;
    let loaded = load(&options)?;

    match stackvm_verifier::verify(&loaded.program, loaded.entry, loaded.globals) {
        Ok(info) => {
            println!(
                "OK: {} ({} words, {} instructions)",
                options.input,
                loaded.program.len(),
                info.boundaries.len()
            );
            Ok(())
        }
        Err(errors) => {
            report_verify_errors(&errors);
            Err(2)
        }
    }
}

/// Execute a program.
pub fn run(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: stackvm run <input> [--start N] [--globals N] [--stack N] \
                         [--trace] [--unchecked] [--time]";
    let options = Options::parse(
        args,
        &[
            "--start",
            "--globals",
            "--stack",
            "--trace",
            "--unchecked",
            "--time",
        ],
        USAGE,
    )?;
    let loaded = load(&options)?;

    let config = VmConfig::default()
        .with_stack_capacity(options.stack.unwrap_or(DEFAULT_STACK_CAPACITY))
        .with_checked(!options.unchecked)
        .with_trace(options.trace);

    // The threaded loop trusts its input.
    if options.unchecked {
        let info = stackvm_verifier::verify(&loaded.program, loaded.entry, loaded.globals)
            .map_err(|errors| {
                report_verify_errors(&errors);
                2
            })?;
        if let Err(e) = info.check_capacity(config.stack_capacity) {
            eprintln!("error: {e}");
            return Err(2);
        }
        if info.max_stack_depth.is_none() {
            eprintln!("note: recursive calls are not depth-checked; overflowing the stack aborts");
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let started = Instant::now();
    let result = stackvm_vm::execute_with(
        &loaded.program.code,
        loaded.entry,
        loaded.globals,
        &config,
        &mut out,
    );
    let elapsed = started.elapsed();

    if options.time {
        eprintln!("duration = {} ms", elapsed.as_millis());
    }

    match result {
        Ok(_) => Ok(()),
        Err(fault) => {
            eprintln!("runtime fault: {fault}");
            Err(3)
        }
    }
}

/// Disassemble a .svmb binary to text.
pub fn disassemble(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: stackvm disassemble <input.svmb>";
    let options = Options::parse(args, &[], USAGE)?;
    let program = read_binary(&options.input)?;
    print!("{}", stackvm_assembler::disassemble(&program));
    Ok(())
}

/// Print the blake3 fingerprint of a program's binary encoding.
pub fn hash(args: &[String]) -> Result<(), i32> {
    const USAGE: &str = "Usage: stackvm hash <input>";
    let options = Options::parse(args, &[], USAGE)?;
    let loaded = load(&options)?;
    println!(
        "{}  {}",
        stackvm_verifier::fingerprint_hex(&loaded.program),
        options.input
    );
    Ok(())
}

// --- Helpers ---

/// Input file plus the flags a command accepts.
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    input: String,
    output: Option<String>,
    start: Option<usize>,
    globals: Option<usize>,
    stack: Option<usize>,
    trace: bool,
    unchecked: bool,
    time: bool,
}

impl Options {
    /// Parse `<input> [flags]`, accepting only the flags in `allowed`.
    fn parse(args: &[String], allowed: &[&str], usage: &str) -> Result<Self, i32> {
        let mut options = Options::default();
        let mut input = None;
        let mut rest = args.iter();

        while let Some(arg) = rest.next() {
            let flag = arg.as_str();
            if !flag.starts_with('-') || flag == "-" {
                if input.replace(arg.clone()).is_some() {
                    eprintln!("error: unexpected argument '{arg}'");
                    eprintln!("{usage}");
                    return Err(1);
                }
                continue;
            }
            if !allowed.contains(&flag) {
                eprintln!("error: unknown option '{flag}'");
                eprintln!("{usage}");
                return Err(1);
            }
            match flag {
                "--trace" => options.trace = true,
                "--unchecked" => options.unchecked = true,
                "--time" => options.time = true,
                "-o" => options.output = Some(value(flag, rest.next())?.to_string()),
                "--start" => options.start = Some(number(flag, rest.next())?),
                "--globals" => options.globals = Some(number(flag, rest.next())?),
                "--stack" => options.stack = Some(number(flag, rest.next())?),
                _ => {
                    eprintln!("error: unknown option '{flag}'");
                    return Err(1);
                }
            }
        }

        match input {
            Some(input) => {
                options.input = input;
                Ok(options)
            }
            None => {
                eprintln!("error: missing input file");
                eprintln!("{usage}");
                Err(1)
            }
        }
    }
}

fn value<'a>(flag: &str, raw: Option<&'a String>) -> Result<&'a str, i32> {
    raw.map(String::as_str).ok_or_else(|| {
        eprintln!("error: {flag} requires a value");
        1
    })
}

fn number(flag: &str, raw: Option<&String>) -> Result<usize, i32> {
    let raw = value(flag, raw)?;
    raw.parse().map_err(|_| {
        eprintln!("error: invalid value for {flag}: '{raw}'");
        1
    })
}

/// A program with the entry point and global store size to use.
struct Loaded {
    program: Program,
    entry: usize,
    globals: usize,
}

/// Load text or binary input and apply `--start`/`--globals` overrides.
fn load(options: &Options) -> Result<Loaded, i32> {
    let assembly = if options.input.ends_with(".svm") {
        assemble_file(&options.input)?
    } else {
        Assembly {
            program: read_binary(&options.input)?,
            entry: 0,
            globals: DEFAULT_GLOBAL_COUNT,
        }
    };

    Ok(Loaded {
        program: assembly.program,
        entry: options.start.unwrap_or(assembly.entry),
        globals: options.globals.unwrap_or(assembly.globals),
    })
}

/// Read and assemble a .svm text file.
fn assemble_file(path: &str) -> Result<Assembly, i32> {
    let text = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    stackvm_assembler::assemble(&text).map_err(|e| {
        eprintln!("error: {path}: {e}");
        1
    })
}

/// Read and decode a .svmb binary file.
fn read_binary(path: &str) -> Result<Program, i32> {
    let bytes = fs::read(path).map_err(|e| {
        eprintln!("error: cannot read '{path}': {e}");
        1
    })?;

    Program::decode(&bytes).map_err(|e| {
        eprintln!("error: invalid binary: {e}");
        1
    })
}

fn report_verify_errors(errors: &[stackvm_verifier::VerifyError]) {
    for e in errors {
        eprintln!("error: {e}");
    }
}
