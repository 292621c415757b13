//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::defaults;

/// wa-cloud: WhatsApp Business Cloud API client
///
/// Sends messages and manages media through the Graph API, and checks
/// webhook delivery signatures.
#[derive(Debug, Default, Parser)]
#[command(name = "wa-cloud")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Business phone number id
    #[arg(long = "phone-number-id", global = true)]
    pub phone_number_id: Option<String>,

    /// Graph API access token
    #[arg(long = "access-token", global = true)]
    pub access_token: Option<String>,

    /// Graph API base URL
    #[arg(long = "base-url", global = true)]
    pub base_url: Option<String>,

    /// Graph API version, e.g. v23.0
    #[arg(long = "api-version", global = true)]
    pub api_version: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<f64>,

    /// Retries after the first attempt
    #[arg(long = "max-retries", global = true)]
    pub max_retries: Option<u32>,

    /// Client-side requests-per-second ceiling
    #[arg(long = "rate-limit", global = true)]
    pub rate_limit: Option<u32>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for wa-cloud
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },

    /// Send a text message
    SendText {
        /// Recipient phone number
        #[arg(long)]
        to: String,
        /// Message text
        #[arg(long)]
        body: String,
        /// Render a preview for the first URL in the body
        #[arg(long = "preview-url")]
        preview_url: bool,
    },

    /// Upload a media file and print its id
    Upload {
        /// File to upload
        #[arg(long)]
        file: PathBuf,
        /// MIME type; guessed from the file name when omitted
        #[arg(long)]
        mime: Option<String>,
    },

    /// Download a media object to a file
    Download {
        /// Media id
        #[arg(long = "media-id")]
        media_id: String,
        /// Destination path
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Check a webhook delivery signature
    VerifySignature {
        /// File holding the raw request body
        #[arg(long = "body-file")]
        body_file: PathBuf,
        /// Value of the X-Hub-Signature-256 header
        #[arg(long)]
        signature: String,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
