//! Command-line front end for the narrator engine.
//!
//! `narrator split` and `narrator windows` inspect how a script will be cut
//! and timed; `narrator play` runs a full session and prints its events.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Used by the binary only
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

// Re-export primary types for convenient access
pub use commands::{Commands, SplitMode};
pub use error::CliError;
pub use parser::Cli;
