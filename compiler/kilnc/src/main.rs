//! Kiln CLI
//!
//! Constructs and runs Kiln scripts.

mod commands;

use std::sync::Once;

use commands::{check_file, run_file, RunOptions};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Enable with `RUST_LOG=kiln_hooks=debug` or `RUST_LOG=kiln_eval=trace`.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];

    match command.as_str() {
        "run" | "check" => {
            let options = match RunOptions::parse(&args[2..]) {
                Ok(options) => options,
                Err(message) => {
                    eprintln!("error: {message}");
                    eprintln!("Usage: kiln {command} <file.kn> [--injection=<mode>]");
                    std::process::exit(1);
                }
            };
            if command == "run" {
                run_file(&options);
            } else {
                check_file(&options);
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "version" | "--version" | "-v" => {
            println!("Kiln {}", env!("CARGO_PKG_VERSION"));
        }
        _ => {
            // If it looks like a script, run it
            if std::path::Path::new(command)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("kn"))
            {
                match RunOptions::parse(&args[1..]) {
                    Ok(options) => run_file(&options),
                    Err(message) => {
                        eprintln!("error: {message}");
                        std::process::exit(1);
                    }
                }
            } else {
                eprintln!("Unknown command: {command}");
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }
}

fn print_usage() {
    println!("Kiln");
    println!();
    println!("Usage: kiln <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file.kn>        Construct and run a Kiln script");
    println!("  check <file.kn>      Construct a script without running it");
    println!("  help                 Show this help message");
    println!("  version              Show version information");
    println!();
    println!("Options:");
    println!("  --injection=<mode>   How deferred blocks are spliced into the");
    println!("                       script: precise (default) or line");
    println!();
    println!("Environment:");
    println!("  KILN_INJECTION       Default for --injection");
    println!("  RUST_LOG             Tracing filter, e.g. kiln_hooks=debug");
    println!();
    println!("Examples:");
    println!("  kiln run main.kn");
    println!("  kiln run main.kn --injection=line");
    println!("  kiln check lib.kn");
}
