//! Terminal front end for the dictation exam engine.
//!
//! `main.rs` is the composition root; handlers receive a [`CliContext`]
//! built by [`bootstrap`] and never construct infrastructure themselves.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary only.
use dotenvy as _;

pub mod bootstrap;
pub mod commands;
pub mod controls;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap, init_logging};
pub use commands::Commands;
pub use controls::Control;
pub use error::CliError;
pub use parser::Cli;
