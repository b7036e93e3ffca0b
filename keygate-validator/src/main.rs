//! Key Gate Validator - Offline access-key checker
//!
//! Companion program to the gate widget: prompts for an access key and checks
//! its format plus the deterministic digest acceptance property. Three attempts
//! are allowed before the program exits non-zero; typing `exit` quits early.
//!
//! The gate generates keys with no embedded timestamp, so this program cannot
//! verify expiration; it only checks that a key looks like one the gate produced.

use anyhow::Result;
use clap::Parser;
use keygate_core::validate::validate_key;
use std::io::Write;
use tracing::debug;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "keygate-validator")]
#[command(about = "Validates access keys produced by the key gate", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Validate a single key non-interactively and exit
    #[arg(short, long)]
    key: Option<String>,
}

fn print_header() {
    println!("=================================================");
    println!("                 KEY GATE VALIDATOR              ");
    println!("=================================================");
}

fn print_granted() {
    println!();
    println!("Access granted!");
    println!("This content is only available with a valid key.");
    println!("Your access expires 24 hours after the key was generated.");
}

fn read_key() -> Option<String> {
    print!("Please enter your access key: ");
    std::io::stdout().flush().ok()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).ok()?;
    if line.is_empty() {
        return None; // EOF
    }
    Some(line.trim().to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::WARN);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if let Some(key) = &args.key {
        return match validate_key(key) {
            Ok(()) => {
                println!("Key validated successfully");
                Ok(())
            }
            Err(e) => {
                println!("{}", e);
                std::process::exit(1);
            }
        };
    }

    print_header();
    println!("This program is protected by a key generated through the gate.");
    println!();

    let mut attempts = MAX_ATTEMPTS;

    while attempts > 0 {
        println!("Attempts remaining: {}", attempts);

        let Some(key) = read_key() else {
            break;
        };

        if key.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        match validate_key(&key) {
            Ok(()) => {
                debug!("Key accepted");
                print_granted();
                return Ok(());
            }
            Err(e) => {
                println!("Validating key... failed: {}", e);
                attempts -= 1;
                if attempts > 0 {
                    println!("Type 'exit' to quit or try again.");
                    println!();
                }
            }
        }
    }

    println!("You have exceeded the maximum number of attempts.");
    println!("Please generate a new key through the gate and try again.");
    std::process::exit(1);
}
