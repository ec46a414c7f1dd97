//! Lintel core library.
//!
//! This crate exposes programmatic APIs for checking a source tree
//! against a license/copyright metadata convention: every file declares
//! its copyright holders and an SPDX license expression, every used
//! license has a text in the licenses directory, and every text there
//! is used.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `expression`: SPDX license-expression parser/validator.
//! - `licenses`: Immutable known/deprecated identifier tables.
//! - `comment`: Filename/extension dispatch to comment syntax descriptors.
//! - `header`: Header synthesis, merging, and sidecar writing.
//! - `extract`: Per-file copyright/license tag extraction.
//! - `coverage`: External coverage declarations by path pattern.
//! - `scan`: Tree walking and aggregation into a project index.
//! - `report`: Cross-referenced compliance report.
//! - `output`: Human/JSON report printers and the bill-of-materials.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod comment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod expression;
pub mod extract;
pub mod header;
pub mod licenses;
pub mod models;
pub mod output;
pub mod report;
pub mod scan;
pub mod utils;
