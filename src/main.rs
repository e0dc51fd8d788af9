//! Command-Language Shell Terminal
//!
//! An interactive terminal client for a command-language shell. Input is
//! parsed on every keystroke against a compiled grammar, driving live syntax
//! highlighting and grammar-predicted autocomplete.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! costerm --namespace SAMPLES
//! ```

use std::sync::Arc;

use tracing::Level;

use costerm::cli::CliInterface;
use costerm::error::Result;
use costerm::grammar::lang;
use costerm::repl::{LocalEchoSession, Repl, StaticProvider};

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// This function orchestrates the application startup:
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Handle subcommands or start the interactive session
fn run() -> Result<()> {
    // Parse command-line arguments and load configuration
    let cli = CliInterface::new()?;

    // Initialize logging based on verbosity
    initialize_logging(&cli);

    // Handle subcommands (version, completion, config)
    if cli.handle_subcommand()? {
        return Ok(());
    }

    // Print banner if not in quiet mode
    cli.print_banner();

    run_interactive_mode(&cli)
}

/// Run the interactive session
fn run_interactive_mode(cli: &CliInterface) -> Result<()> {
    let grammar = Arc::new(lang::grammar()?);
    let provider = Arc::new(StaticProvider::with_defaults());
    let session = Box::new(LocalEchoSession::new(cli.config().session.namespace.clone()));

    let mut repl = Repl::new(
        cli.config(),
        grammar.clone(),
        lang::START_RULE,
        provider,
        session,
    )?;
    repl.run(&grammar, lang::START_RULE)?;

    println!("Goodbye!");
    Ok(())
}

/// Initialize logging system based on verbosity level
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
