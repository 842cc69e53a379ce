//! embedfs CLI library.
//!
//! Exposes the command implementations and output helpers behind the
//! `embedfs` binary so they can be tested directly.

pub mod cli;
pub mod commands;
pub mod formatters;
