// Copyright (c) 2025 John Wilger
// SPDX-License-Identifier: MIT

//! Allium Check - a static semantic checker for the Allium specification
//! language.
//!
//! Reads a single `.allium` file named on the command line, runs the full
//! checking pipeline, and prints any diagnostics to stderr.

use allium_check::cli::{Cli, Error};
use std::process;

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn run() -> Result<i32, Error> {
    let cli = Cli::from_args()?;
    cli.run()
}
