// Copyright (c) 2025 John Wilger
// SPDX-License-Identifier: MIT

//! Command-line interface: a single positional path argument, the full
//! checking pipeline, diagnostics to stderr (spec §6).

use std::env;
use std::fs;

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during CLI parsing or execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed command line arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Failed to read the input file.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// The parsed command line: just the path to the `.allium` file to check.
#[derive(Debug, Clone)]
pub struct Cli {
    pub path: String,
}

impl Cli {
    /// Parse command line arguments into a CLI structure.
    pub fn from_args() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        if args.len() != 2 {
            return Err(Error::InvalidArguments(
                "Usage: allium-check <path>".to_string(),
            ));
        }
        Ok(Cli { path: args[1].clone() })
    }

    /// Read the input file, run the checker, and print every diagnostic
    /// to stderr. Returns the process exit code: `0` if no diagnostics
    /// were found, `1` otherwise.
    pub fn run(self) -> Result<i32> {
        let source = fs::read_to_string(&self.path)?;
        let diagnostics = crate::check(&self.path, &source);

        for diagnostic in &diagnostics {
            eprintln!("{diagnostic}");
        }

        Ok(if diagnostics.is_empty() { 0 } else { 1 })
    }
}
