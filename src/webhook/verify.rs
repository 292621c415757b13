//! Webhook subscription handshake and delivery signatures.
//!
//! Meta signs every delivery with HMAC-SHA256 over the raw request body,
//! keyed by the app secret, and sends it as `X-Hub-Signature-256:
//! sha256=<hex>`. The signature must be checked against the exact bytes
//! received, before any JSON parsing.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{WebhookError, WebhookEvent, WebhookPayload};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// The only `hub.mode` accepted by the handshake.
pub const SUBSCRIBE_MODE: &str = "subscribe";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Answers the subscription handshake.
///
/// Returns the challenge verbatim when `mode` is `subscribe` and `token`
/// matches `expected_token`, otherwise `None`. An empty `expected_token`
/// never matches.
///
/// # Example
///
/// ```
/// use wa_cloud::webhook::handle_verification;
///
/// let answer = handle_verification("subscribe", "s3cret", "1158201444", "s3cret");
/// assert_eq!(answer.as_deref(), Some("1158201444"));
///
/// assert!(handle_verification("subscribe", "guess", "1158201444", "s3cret").is_none());
/// ```
#[must_use]
pub fn handle_verification(
    mode: &str,
    token: &str,
    challenge: &str,
    expected_token: &str,
) -> Option<String> {
    if mode != SUBSCRIBE_MODE || expected_token.is_empty() {
        return None;
    }

    let matches: bool = token.as_bytes().ct_eq(expected_token.as_bytes()).into();
    if matches {
        Some(challenge.to_string())
    } else {
        tracing::warn!("Webhook verification rejected: verify token mismatch");
        None
    }
}

/// Checks a delivery signature against the raw body.
///
/// `provided_signature` may be `sha256=<hex>` or bare hex, in either case.
/// Returns `false` for an empty secret, malformed hex, a wrong length or a
/// mismatch. The comparison runs in constant time.
#[must_use]
pub fn verify_signature(raw_body: &[u8], provided_signature: &str, shared_secret: &str) -> bool {
    if shared_secret.is_empty() {
        tracing::warn!("Webhook signature check skipped: app secret is empty");
        return false;
    }

    let signature = provided_signature.trim();
    let signature_hex = signature.strip_prefix(SIGNATURE_PREFIX).unwrap_or(signature);

    let provided = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Webhook signature is not valid hex: {e}");
            return false;
        }
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(shared_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    let computed = mac.finalize().into_bytes();

    let is_valid: bool = computed.as_slice().ct_eq(&provided).into();
    if !is_valid {
        tracing::warn!("Webhook signature verification failed: signatures do not match");
    }
    is_valid
}

/// Computes the `X-Hub-Signature-256` value for a body.
///
/// Useful for signing fixtures and for relaying deliveries.
#[must_use]
pub fn compute_signature(raw_body: &[u8], shared_secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(shared_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(raw_body);
    format!("{SIGNATURE_PREFIX}{}", hex::encode(mac.finalize().into_bytes()))
}

/// The `hub.*` parameters of a handshake request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationRequest {
    /// `hub.mode`
    pub mode: String,
    /// `hub.verify_token`
    pub verify_token: String,
    /// `hub.challenge`
    pub challenge: String,
}

impl VerificationRequest {
    /// Parses the handshake parameters from a URL query string.
    ///
    /// A leading `?` is ignored. Missing parameters are left empty, which
    /// fails verification.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut request = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "hub.mode" => request.mode = value.into_owned(),
                "hub.verify_token" => request.verify_token = value.into_owned(),
                "hub.challenge" => request.challenge = value.into_owned(),
                _ => {}
            }
        }

        request
    }
}

/// Webhook endpoint credentials bundled with the checks that use them.
///
/// Stateless between deliveries; cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct WebhookVerifier {
    app_secret: String,
    verify_token: String,
}

impl WebhookVerifier {
    /// Creates a verifier from the app secret and the handshake verify token.
    #[must_use]
    pub fn new(app_secret: impl Into<String>, verify_token: impl Into<String>) -> Self {
        Self {
            app_secret: app_secret.into(),
            verify_token: verify_token.into(),
        }
    }

    /// Answers a subscription handshake; see [`handle_verification`].
    #[must_use]
    pub fn verify_subscription(&self, request: &VerificationRequest) -> Option<String> {
        handle_verification(
            &request.mode,
            &request.verify_token,
            &request.challenge,
            &self.verify_token,
        )
    }

    /// Checks the signature header of a delivery.
    ///
    /// # Errors
    ///
    /// [`WebhookError::MissingSignature`] if `signature` is `None`, and
    /// [`WebhookError::InvalidSignature`] if it does not match.
    pub fn verify_delivery(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), WebhookError> {
        let signature = signature.ok_or(WebhookError::MissingSignature)?;
        if verify_signature(raw_body, signature, &self.app_secret) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Verifies a delivery and decodes it.
    ///
    /// # Errors
    ///
    /// Signature errors as in [`Self::verify_delivery`], then
    /// [`WebhookError::Payload`] if the body is not a webhook payload.
    pub fn parse_delivery(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verify_delivery(raw_body, signature)?;
        let payload: WebhookPayload = serde_json::from_slice(raw_body)?;
        let event = WebhookEvent::from_payload(payload);
        tracing::debug!(
            "Webhook delivery: {} message(s), {} status(es), {} error(s)",
            event.messages.len(),
            event.statuses.len(),
            event.errors.len()
        );
        Ok(event)
    }
}

impl fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("app_secret", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .finish()
    }
}
