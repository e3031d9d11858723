//! Shared CLI presentation utilities.
//!
//! Format-only: no domain transforms here.

pub mod events;
pub mod tables;

pub use events::describe_event;
pub use tables::{
    difficulty_label, format_elapsed, format_optional, print_separator, truncate_string,
};
