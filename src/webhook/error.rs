//! Error types for inbound webhook handling.

use thiserror::Error;

/// Reasons an inbound delivery is rejected.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The delivery carried no `X-Hub-Signature-256` header.
    #[error("Missing X-Hub-Signature-256 header")]
    MissingSignature,

    /// The signature did not match the body.
    #[error("Webhook signature does not match the request body")]
    InvalidSignature,

    /// The body was authentic but is not a valid webhook payload.
    #[error("Invalid webhook payload: {0}")]
    Payload(#[from] serde_json::Error),
}
