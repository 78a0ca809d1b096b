//! # chart-cli: Chart Command-Line Interface
//!
//! Runs the compliance engine over files on disk, for checking datasets
//! and templates before they are uploaded to the service.
//!
//! ## Subcommands
//!
//! - `check`: Check a dataset against template files
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to `chart-compliance`; no evaluation logic here.

pub mod check;
