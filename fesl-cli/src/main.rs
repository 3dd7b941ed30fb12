//! fesl - Command-line tool for FESL messages
//!
//! Decodes captured message streams and builds messages by hand.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fesl_protocol::{CodecConfig, MessageType};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fesl")]
#[command(about = "Inspect and build FESL session-protocol messages")]
#[command(version)]
struct Cli {
    /// Path to a YAML codec config
    #[arg(long, global = true, env = "FESL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode every message in a capture
    Decode {
        /// Input file (reads stdin if omitted)
        file: Option<PathBuf>,

        /// Treat the input as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,

        /// Print one JSON object per message
        #[arg(long)]
        json: bool,
    },

    /// Build a message from key=value pairs
    Build {
        /// 4-character command code
        #[arg(short, long)]
        cmd: String,

        /// Message type
        #[arg(short = 'T', long = "type", default_value = "single-client")]
        msg_type: MessageType,

        /// Message id (24 bits)
        #[arg(short, long, default_value = "0")]
        id: u32,

        /// Pairs in wire order, as KEY=VALUE
        pairs: Vec<String>,

        /// Write raw bytes to this file instead of printing hex
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Defaults or --config file, then FESL_* env overrides, then validation
    let config = CodecConfig::load_from(cli.config.as_deref())?;
    if let Some(path) = &cli.config {
        tracing::debug!("Loaded config from {}", path.display());
    }

    match commands::execute(&config, cli.command) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::try_parse_from([
            "fesl",
            "build",
            "--cmd",
            "acct",
            "--type",
            "multi-server",
            "--id",
            "7",
            "TXN=NuLogin",
            "user=test",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                cmd,
                msg_type,
                id,
                pairs,
                out,
            } => {
                assert_eq!(cmd, "acct");
                assert_eq!(msg_type, MessageType::MultiServer);
                assert_eq!(id, 7);
                assert_eq!(pairs, vec!["TXN=NuLogin", "user=test"]);
                assert!(out.is_none());
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_parse_build_rejects_unknown_type() {
        let result = Cli::try_parse_from(["fesl", "build", "-c", "acct", "-T", "broadcast"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_decode() {
        let cli = Cli::try_parse_from(["fesl", "decode", "capture.bin", "--json"]).unwrap();
        match cli.command {
            Commands::Decode { file, hex, json } => {
                assert_eq!(file, Some(PathBuf::from("capture.bin")));
                assert!(!hex);
                assert!(json);
            }
            _ => panic!("expected decode"),
        }
    }
}
