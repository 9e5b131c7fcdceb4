//! CLI module for gluecodec - command-line interface and subcommands.
//!
//! Provides value checking and encoding helpers plus the stdio server.

pub mod commands;

pub use commands::Cli;
