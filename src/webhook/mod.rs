//! Inbound webhook handling.
//!
//! This module provides:
//! - The `hub.*` subscription handshake ([`handle_verification`], [`VerificationRequest`])
//! - Delivery signature checks ([`verify_signature`], [`compute_signature`])
//! - Typed delivery payloads ([`WebhookPayload`], [`WebhookEvent`])
//! - A verifier holding the endpoint credentials ([`WebhookVerifier`])

mod error;
mod payload;
mod verify;


pub use error::WebhookError;
pub use payload::{
    Change, ChangeValue, Contact, Entry, IncomingMessage, InteractiveContent, LocationContent,
    MediaContent, MessageContent, MessageContext, MessageStatus, Metadata, Profile,
    ReactionContent, ReplyOption, StatusKind, TextContent, WebhookEvent, WebhookPayload,
};
pub use verify::{
    SIGNATURE_HEADER, SUBSCRIBE_MODE, VerificationRequest, WebhookVerifier, compute_signature,
    handle_verification, verify_signature,
};
