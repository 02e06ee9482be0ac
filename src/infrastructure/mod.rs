// Copyright (c) 2025 John Wilger
// SPDX-License-Identifier: MIT

//! Cross-cutting utilities shared by the parser and both checkers: the
//! [`Diagnostic`](diagnostics::Diagnostic) type and wire-format rendering,
//! and the edit-distance suggestion search.

pub mod diagnostics;
pub mod editdistance;
