// Copyright (c) 2025 John Wilger
// SPDX-License-Identifier: MIT

//! Allium Check - a static semantic checker for the Allium specification
//! language.
//!
//! Given the contents of a single `.allium` source file, [`check`] runs the
//! full pipeline (lex, parse, build the symbol table, then run the
//! reference and enum checkers) and returns every diagnostic found. A
//! syntax error short-circuits the pipeline: the returned list contains
//! exactly that one diagnostic and no semantic checks run.

#![deny(rustdoc::broken_intra_doc_links)]

/// The version of Allium Check.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command-line interface.
pub mod cli;

/// Semantic passes that walk the parsed tree: reference resolution and
/// enum-value validation.
pub mod checks;

/// Shared, cross-cutting utilities: diagnostics and edit distance.
pub mod infrastructure;

/// Lexical analysis.
pub mod lexer;

/// Recursive-descent parsing.
pub mod parser;

/// Abstract syntax tree produced by the parser.
pub mod ast;

/// Symbol table construction.
pub mod symbols;

use ast::AlliumFile;
use infrastructure::diagnostics::Diagnostic;

/// Runs the full pipeline over `source` and returns every diagnostic
/// found. `filename` is used only to populate the `file` field of each
/// diagnostic; it is never opened or interpreted.
pub fn check(filename: &str, source: &str) -> Vec<Diagnostic> {
    let file: AlliumFile = match parser::parse(filename, source) {
        Ok(file) => file,
        Err(diagnostic) => return vec![diagnostic],
    };

    let table = symbols::SymbolTable::build(&file);

    let mut diagnostics = checks::reference::check(filename, &file, &table);
    diagnostics.extend(checks::enums::check(filename, &file, &table));
    diagnostics
}
