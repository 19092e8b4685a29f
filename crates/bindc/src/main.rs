//! bindc
//!
//! Command line front end for the helios-bind codec: validates class
//! declaration files and converts documents between XML and the JSON object
//! view.

mod commands;
mod config;

use std::io::Write;

use clap::Parser;
use helios_bind::Codec;
use tracing::info;

use crate::config::{CliConfig, Command};

/// Initializes the tracing subscriber for logging.
fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_bind={level},bindc={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    let Some(schema) = config.schema.as_deref() else {
        anyhow::bail!("A schema file is required");
    };
    let registry = commands::load_registry(schema)?;
    let codec = Codec::new(&registry).with_options(config.codec_options());
    info!(options = ?codec.options(), "Codec ready");

    let output = match &config.command {
        Command::Check => commands::check(&registry)?,
        Command::Decode(args) => {
            let xml = commands::read_input(args.input.as_deref())?;
            commands::decode(&codec, &args.class, &xml)?
        }
        Command::Encode(args) => {
            let json = commands::read_input(args.input.as_deref())?;
            commands::encode(&codec, &args.class, &args.element, &json, args.pretty)?
        }
        Command::Roundtrip(args) => {
            let xml = commands::read_input(args.input.as_deref())?;
            commands::roundtrip(&codec, &args.class, &xml)?
        }
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}
