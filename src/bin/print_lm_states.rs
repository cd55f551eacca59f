// Dumps every record of an lm-state file in human-readable form.
// Run with: cargo run --bin print-lm-states -- <int|float|general> <file>
use lm_state_core::persistence::StateReader;
use lm_state_core::{
    FloatLmState, GeneralLmState, IntLmState, LmStateCodec, LmStateResult, Verifier,
};
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::process::ExitCode;

fn print_all<S, R, W>(source: R, out: &mut W) -> LmStateResult<usize>
where
    S: LmStateCodec + Display,
    R: Read,
    W: Write,
{
    let mut n = 0;
    for state in StateReader::<R, S>::new(source, Verifier::always()) {
        write!(out, "{}", state?)?;
        n += 1;
    }
    Ok(n)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <int|float|general> <file>", args[0]);
        return ExitCode::from(2);
    }

    let file = match File::open(&args[2]) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            eprintln!("[ERROR] Could not open '{}': {}", args[2], e);
            return ExitCode::FAILURE;
        }
    };
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = match args[1].as_str() {
        "int" => print_all::<IntLmState, _, _>(file, &mut out),
        "float" => print_all::<FloatLmState, _, _>(file, &mut out),
        "general" => print_all::<GeneralLmState, _, _>(file, &mut out),
        other => {
            eprintln!("[ERROR] Unknown state kind '{}'", other);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(n) => {
            tracing::info!("Printed {} records from {}", n, args[2]);
            ExitCode::SUCCESS
        }
        Err(e) => {
            if e.is_corruption() {
                eprintln!("[FATAL] {} is corrupt: {}", args[2], e);
            } else {
                eprintln!("[ERROR] {}", e);
            }
            ExitCode::FAILURE
        }
    }
}
