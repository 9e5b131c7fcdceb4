//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - check: decode a value's text form
//! - encode-value: canonical text form of a JSON value
//! - serve: run a responder over stdin/stdout

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// gluecodec - textual remote-object RPC codec and catalog server
#[derive(Parser, Debug)]
#[command(name = "gluecodec")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a value text form and print it as JSON
    Check {
        /// Value text, e.g. '(7 (2 -5) (4 "x"))'
        text: String,
    },

    /// Read a value from JSON and print its canonical text form
    EncodeValue {
        /// Value as JSON, e.g. '{"type":"int","value":3}'
        json: String,
    },

    /// Serve the glue protocol on stdin/stdout with length-prefixed frames
    Serve {
        /// Catalog YAML describing the served object space
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["gluecodec"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["gluecodec", "-v", "check", "(0)"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli =
            Cli::try_parse_from(["gluecodec", "-c", "/path/to/gluecodec.yml", "check", "(0)"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/gluecodec.yml")));
    }

    #[test]
    fn test_check() {
        let cli = Cli::try_parse_from(["gluecodec", "check", "(2 -5)"]).unwrap();
        match cli.command {
            Commands::Check { text } => assert_eq!(text, "(2 -5)"),
            _ => panic!("Expected check command"),
        }
    }

    #[test]
    fn test_encode_value() {
        let cli = Cli::try_parse_from(["gluecodec", "encode-value", r#"{"type":"none"}"#]).unwrap();
        assert!(matches!(cli.command, Commands::EncodeValue { .. }));
    }

    #[test]
    fn test_serve_with_catalog() {
        let cli = Cli::try_parse_from(["gluecodec", "serve", "--catalog", "objects.yml"]).unwrap();
        match cli.command {
            Commands::Serve { catalog } => {
                assert_eq!(catalog, Some(PathBuf::from("objects.yml")));
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_serve_without_catalog() {
        let cli = Cli::try_parse_from(["gluecodec", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { catalog: None }));
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["gluecodec", "serve", "-c", "alt.yml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("alt.yml")));
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}
