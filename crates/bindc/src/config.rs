//! Command line configuration for `bindc`.
//!
//! Global options may also be supplied through environment variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BINDC_SCHEMA` | | Class declaration file (JSON) |
//! | `BINDC_LOG_LEVEL` | warn | Log level |
//! | `BINDC_TYPE_HINTS` | true | Write `xsi:type` when runtime and static class differ |
//! | `BINDC_STRICT_REQUIRED` | false | Reject documents missing required fields |
//! | `BINDC_MAX_DEPTH` | 64 | Maximum object nesting depth |

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use helios_bind::CodecOptions;

/// Encode and decode XML documents against a registry of class declarations.
#[derive(Debug, Clone, Parser)]
#[command(name = "bindc")]
#[command(about = "Registry-driven XML binding codec")]
pub struct CliConfig {
    /// Class declaration file (JSON).
    #[arg(long, global = true, env = "BINDC_SCHEMA")]
    pub schema: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, env = "BINDC_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Write `xsi:type` hints when a runtime class differs from its static class.
    #[arg(
        long,
        global = true,
        env = "BINDC_TYPE_HINTS",
        default_value = "true",
        action = ArgAction::Set
    )]
    pub type_hints: bool,

    /// Fail when a required field is missing from a decoded document.
    #[arg(
        long,
        global = true,
        env = "BINDC_STRICT_REQUIRED",
        default_value = "false",
        action = ArgAction::Set
    )]
    pub strict_required: bool,

    /// Maximum object nesting depth.
    #[arg(long, global = true, env = "BINDC_MAX_DEPTH", default_value = "64")]
    pub max_depth: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Validate the schema and list its classes with their subtypes.
    Check,
    /// Decode an XML document into its JSON object view.
    Decode(DecodeArgs),
    /// Encode a JSON object view as an XML document.
    Encode(EncodeArgs),
    /// Decode, encode and decode again; report whether both objects agree.
    Roundtrip(DecodeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct DecodeArgs {
    /// Static class of the root element.
    #[arg(long)]
    pub class: String,

    /// Input file (stdin if omitted).
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct EncodeArgs {
    /// Static class of the root element.
    #[arg(long)]
    pub class: String,

    /// Root element name.
    #[arg(long)]
    pub element: String,

    /// Input file (stdin if omitted).
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Indent the written document.
    #[arg(long)]
    pub pretty: bool,
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl CliConfig {
    /// Codec options selected on the command line.
    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            emit_type_hints: self.type_hints,
            strict_required: self.strict_required,
            max_depth: self.max_depth,
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.schema.is_none() {
            errors.push("A schema file is required (--schema or BINDC_SCHEMA)".to_string());
        }

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!("Unknown log level: {}", self.log_level));
        }

        match &self.command {
            Command::Decode(args) | Command::Roundtrip(args) if args.class.is_empty() => {
                errors.push("Class name cannot be empty".to_string());
            }
            Command::Encode(args) => {
                if args.class.is_empty() {
                    errors.push("Class name cannot be empty".to_string());
                }
                if args.element.is_empty() {
                    errors.push("Root element name cannot be empty".to_string());
                }
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
