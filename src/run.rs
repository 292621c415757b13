//! Command execution.
//!
//! Each subcommand maps to one facade call. Results go to stdout so they can
//! be piped; progress and failures go through `tracing`.

use std::path::{Path, PathBuf};

use thiserror::Error;

use wa_cloud::client::{ClientError, WhatsAppClient};
use wa_cloud::config::{Command, ConfigError, ValidatedConfig, write_default_config};
use wa_cloud::time::Sleeper;
use wa_cloud::transport::HttpClient;
use wa_cloud::webhook::{WebhookError, WebhookVerifier};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// A facade call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Writing the config template failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Signature check failed.
    #[error("Webhook signature rejected: {0}")]
    Signature(#[from] WebhookError),

    /// Failed to read an input file.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// Path of the input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Executes one command against the validated configuration.
///
/// Without a command, only reports that the configuration is usable.
///
/// # Errors
///
/// Returns the first failure of the command; see [`RunError`].
pub async fn execute(command: Option<Command>, config: &ValidatedConfig) -> Result<(), RunError> {
    let Some(command) = command else {
        tracing::info!("Configuration is valid: {config}");
        return Ok(());
    };

    match command {
        Command::Init { output } => {
            write_default_config(&output)?;
            println!("Configuration template written to: {}", output.display());
            Ok(())
        }
        Command::SendText {
            to,
            body,
            preview_url,
        } => send_text(&WhatsAppClient::from_config(config)?, &to, &body, preview_url).await,
        Command::Upload { file, mime } => {
            upload(&WhatsAppClient::from_config(config)?, &file, mime.as_deref()).await
        }
        Command::Download { media_id, output } => {
            download(&WhatsAppClient::from_config(config)?, &media_id, &output).await
        }
        Command::VerifySignature {
            body_file,
            signature,
        } => verify_signature(&config.webhook_verifier(), &body_file, &signature).await,
    }
}

/// Sends a text message and prints its message id.
async fn send_text<H: HttpClient, S: Sleeper>(
    client: &WhatsAppClient<H, S>,
    to: &str,
    body: &str,
    preview_url: bool,
) -> Result<(), RunError> {
    let response = client.send_text(to, body, preview_url).await?;
    let id = response.message_id().unwrap_or_default();

    tracing::info!("Message {id} accepted for {to}");
    println!("{id}");
    Ok(())
}

/// Uploads a file and prints the new media id.
async fn upload<H: HttpClient, S: Sleeper>(
    client: &WhatsAppClient<H, S>,
    file: &Path,
    mime: Option<&str>,
) -> Result<(), RunError> {
    let id = client.upload_file(file, mime).await?;

    println!("{id}");
    Ok(())
}

/// Downloads a media object and prints where it was saved.
async fn download<H: HttpClient, S: Sleeper>(
    client: &WhatsAppClient<H, S>,
    media_id: &str,
    output: &Path,
) -> Result<(), RunError> {
    let path = client.download_to_file(media_id, output).await?;

    println!("{}", path.display());
    Ok(())
}

/// Checks a signature header value against a stored request body.
async fn verify_signature(
    verifier: &WebhookVerifier,
    body_file: &Path,
    signature: &str,
) -> Result<(), RunError> {
    let body = tokio::fs::read(body_file)
        .await
        .map_err(|source| RunError::Read {
            path: body_file.to_path_buf(),
            source,
        })?;

    verifier.verify_delivery(&body, Some(signature))?;
    tracing::info!("Signature matches {} ({} bytes)", body_file.display(), body.len());
    println!("valid");
    Ok(())
}
