//! Shared driver for the `fic` and `hic` binaries
//!
//! Both read their whole input from stdin and write C to stdout. Logging
//! goes to stderr and is controlled by `RUST_LOG` (default `fic=warn`).

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::{Pipeline, compile};
use std::io::{self, Read, Write};
use tracing::debug;

/// Install the stderr subscriber used by both binaries
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "fic=warn".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Compile stdin to stdout; nothing is written unless compilation succeeds
pub fn run(pipeline: Pipeline) -> Result<(), CompileError> {
    fi_core::check_word_width()?;

    let mut source = Vec::new();
    io::stdin().lock().read_to_end(&mut source)?;
    debug!(bytes = source.len(), ?pipeline, "read stdin");

    let compiled = compile(pipeline, &source, &CompilerConfig::default())?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(compiled.code.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Entry point body shared by the binaries
pub fn main_for(pipeline: Pipeline) {
    init_logging();
    if let Err(e) = run(pipeline) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
