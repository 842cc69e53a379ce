//! Command implementations for the embedfs CLI.
//!
//! Each command module parses nothing itself: it receives already-parsed
//! arguments, runs the operation, and prints output in the requested format.

pub mod assets;
pub mod cat;
pub mod embed;
pub mod scan;
