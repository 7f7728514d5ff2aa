//! Command-line front end for stagectl.
//!
//! The binary in `main.rs` only parses arguments and prints failures; the
//! commands, configuration loading and the output envelope live here so
//! they can be tested without spawning a process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod styles;
