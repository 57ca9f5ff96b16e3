//! Clink
//!
//! Builds gateway credentials and connection requests, and decodes frames.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clink::commands::{self, BlobFormat, FrameOptions};
use clink::config::{default_config_path, Config};

/// Clink - gateway credential and frame tool.
#[derive(Parser, Debug)]
#[command(name = "clink")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Framing flags shared by the encoding commands.
#[derive(Args, Debug, Clone)]
pub struct FrameArgs {
    /// Wrap the output in a frame of this type
    #[arg(long, value_name = "TYPE")]
    pub frame_type: Option<u16>,

    /// Add the build sub-header to the frame
    #[arg(long)]
    pub build: bool,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Encrypt a credential against a gateway key blob
    Credential {
        /// Key blob file
        #[arg(long, value_name = "FILE")]
        key_blob: PathBuf,

        /// Encoding of the key blob file
        #[arg(long, value_enum, default_value = "raw")]
        format: BlobFormat,

        /// Authentication mechanism tag (defaults to the configured value)
        #[arg(long)]
        auth_mechanism: Option<u32>,

        /// Use the fixed debug seed (reproducible output, never for real gateways)
        #[arg(long)]
        fixed_seed: bool,

        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Encode the connection request payload for a desktop
    ConnectPayload {
        /// Connection info JSON file
        #[arg(long, value_name = "FILE")]
        connect_info: PathBuf,

        /// Device code (defaults to the configured value)
        #[arg(long)]
        device_code: Option<String>,

        #[command(flatten)]
        frame: FrameArgs,
    },

    /// Print the proxy connect message for a desktop
    ConnectMessage {
        /// Connection info JSON file
        #[arg(long, value_name = "FILE")]
        connect_info: PathBuf,

        /// TLS server name (defaults to the desktop host)
        #[arg(long)]
        servername: Option<String>,
    },

    /// Decode frames from hex
    Decode {
        /// Hex-encoded bytes
        #[arg(conflicts_with = "input", required_unless_present = "input")]
        hex: Option<String>,

        /// File holding hex-encoded bytes
        #[arg(long, short, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Decode as a stream, keeping incomplete frames buffered
        #[arg(long)]
        stream: bool,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the config file instead (fails if the file exists)
        #[arg(long)]
        init: bool,
    },
}

impl FrameArgs {
    fn options(&self, config: &Config) -> Option<FrameOptions> {
        self.frame_type.map(|frame_type| FrameOptions {
            frame_type,
            build_message: self.build || config.framing.build_message,
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(config_path) => Config::load(config_path)?,
        None => Config::load_default()?,
    };

    // Apply environment variable overrides
    config.apply_env_overrides();

    // Validate configuration
    config.validate()?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.client.log_level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(config_path) = &cli.config {
        tracing::debug!("Using config file: {:?}", config_path);
    }

    let output = match cli.command {
        Commands::Credential {
            key_blob,
            format,
            auth_mechanism,
            fixed_seed,
            frame,
        } => {
            let blob = commands::read_key_blob(&key_blob, format)?;
            commands::credential(
                &blob,
                auth_mechanism.unwrap_or(config.client.auth_mechanism),
                fixed_seed,
                frame.options(&config),
            )?
        }
        Commands::ConnectPayload {
            connect_info,
            device_code,
            frame,
        } => {
            let info = commands::read_connect_info(&connect_info)?;
            let device_code = device_code.unwrap_or_else(|| config.client.device_code.clone());
            commands::connect_payload(&info, &device_code, frame.options(&config))?
        }
        Commands::ConnectMessage {
            connect_info,
            servername,
        } => {
            let info = commands::read_connect_info(&connect_info)?;
            commands::connect_message(&info, servername.as_deref())?
        }
        Commands::Decode { hex, input, stream } => {
            let text = match (hex, input) {
                (Some(hex), _) => hex,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read input file: {}", path.display()))?,
                (None, None) => anyhow::bail!("Either HEX or --input is required"),
            };
            let bytes = commands::parse_hex(&text)?;
            commands::decode(&bytes, stream, config.framing.max_frame_size)?
        }
        Commands::Config { init: false } => commands::show_config(&config)?,
        Commands::Config { init: true } => {
            let path = cli.config.unwrap_or_else(default_config_path);
            commands::init_config(&config, &path)?
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}
