//! The client facade type and its construction.

use crate::config::ValidatedConfig;
use crate::time::TokioSleeper;
use crate::transport::{ReqwestClient, Transport};

use super::ClientError;

/// High-level client for one business phone number.
///
/// Wraps a [`Transport`] and scopes message and media calls to
/// `phone_number_id`. Arguments are validated locally before anything goes
/// on the wire.
///
/// # Example
///
/// ```no_run
/// use wa_cloud::client::WhatsAppClient;
/// use wa_cloud::config::ValidatedConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ValidatedConfig::from_env()?;
/// let client = WhatsAppClient::from_config(&config)?;
/// let sent = client.send_text("+1 555 123 4567", "Hello!", false).await?;
/// println!("sent {:?}", sent.message_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WhatsAppClient<H, S = TokioSleeper> {
    pub(super) transport: Transport<H, S>,
    pub(super) phone_number_id: String,
}

impl WhatsAppClient<ReqwestClient> {
    /// Builds a production client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the HTTP client cannot be built and
    /// [`ClientError::Transport`] if the credentials are unusable.
    pub fn from_config(config: &ValidatedConfig) -> Result<Self, ClientError> {
        let http = ReqwestClient::with_options(&config.client_options())?;
        let transport = Transport::new(
            http,
            config.base_url.clone(),
            config.api_version.clone(),
            &config.access_token,
        )?
        .with_retry_policy(config.retry_policy())
        .with_rate_limiter(config.rate_limiter());

        Self::new(transport, config.phone_number_id.clone())
    }
}

impl<H, S> WhatsAppClient<H, S> {
    /// Wraps an existing transport.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if `phone_number_id` is blank.
    pub fn new(
        transport: Transport<H, S>,
        phone_number_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let phone_number_id = phone_number_id.into();
        if phone_number_id.trim().is_empty() {
            return Err(ClientError::validation(
                "phone_number_id",
                "must not be empty",
            ));
        }

        Ok(Self {
            transport,
            phone_number_id,
        })
    }

    /// Returns the underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &Transport<H, S> {
        &self.transport
    }

    /// Returns the business phone number id.
    #[must_use]
    pub fn phone_number_id(&self) -> &str {
        &self.phone_number_id
    }

    pub(super) fn endpoint(&self, edge: &str) -> String {
        format!("{}/{edge}", self.phone_number_id)
    }
}
