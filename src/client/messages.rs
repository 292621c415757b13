//! Outbound messages.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::time::Sleeper;
use crate::transport::{HttpClient, JsonMap, RequestDescriptor};

use super::{ClientError, WhatsAppClient, validate};

const MESSAGING_PRODUCT: &str = "whatsapp";

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A public URL the platform fetches.
    Link(String),
    /// An id returned by [`WhatsAppClient::upload`].
    MediaId(String),
}

impl ImageSource {
    /// Treats strings starting with `http` as links and anything else as a
    /// media id.
    ///
    /// ```
    /// use wa_cloud::client::ImageSource;
    ///
    /// assert!(matches!(ImageSource::parse("https://x.test/a.png"), ImageSource::Link(_)));
    /// assert!(matches!(ImageSource::parse("1234567890"), ImageSource::MediaId(_)));
    /// ```
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.starts_with("http") {
            Self::Link(value.to_string())
        } else {
            Self::MediaId(value.to_string())
        }
    }

    fn to_json(&self, caption: Option<&str>) -> Value {
        let mut image = match self {
            Self::Link(link) => json!({ "link": link }),
            Self::MediaId(id) => json!({ "id": id }),
        };
        if let Some(caption) = caption {
            image["caption"] = Value::from(caption);
        }
        image
    }
}

/// A pin on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl Location {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
            address: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Acknowledgement of a sent message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub messaging_product: Option<String>,
    #[serde(default)]
    pub contacts: Vec<MessageContact>,
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

impl MessageResponse {
    /// Returns the id of the first accepted message.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }
}

/// Recipient as resolved by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageContact {
    /// The number as sent.
    pub input: String,
    /// The resolved WhatsApp id.
    pub wa_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SentMessage {
    pub id: String,
    #[serde(default)]
    pub message_status: Option<String>,
}

impl<H: HttpClient, S: Sleeper> WhatsAppClient<H, S> {
    /// Sends a text message.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a bad number or a blank or overlong
    /// body; otherwise whatever the transport reports.
    pub async fn send_text(
        &self,
        to: &str,
        body: &str,
        preview_url: bool,
    ) -> Result<MessageResponse, ClientError> {
        let to = validate::normalize_phone_number(to)?;
        validate::text_body(body)?;

        let response = self
            .post_message(json!({
                "messaging_product": MESSAGING_PRODUCT,
                "recipient_type": "individual",
                "to": to,
                "type": "text",
                "text": { "preview_url": preview_url, "body": body },
            }))
            .await?;
        tracing::debug!("Sent text message to {to}");
        decode_message_response(response)
    }

    /// Sends an image by link or media id.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a bad number, an empty source or an
    /// overlong caption; otherwise whatever the transport reports.
    pub async fn send_image(
        &self,
        to: &str,
        image: &ImageSource,
        caption: Option<&str>,
    ) -> Result<MessageResponse, ClientError> {
        let to = validate::normalize_phone_number(to)?;
        validate::caption(caption)?;
        match image {
            ImageSource::Link(link) => validate::identifier("image link", link)?,
            ImageSource::MediaId(id) => validate::identifier("media id", id)?,
        }

        let response = self
            .post_message(json!({
                "messaging_product": MESSAGING_PRODUCT,
                "recipient_type": "individual",
                "to": to,
                "type": "image",
                "image": image.to_json(caption),
            }))
            .await?;
        tracing::debug!("Sent image message to {to}");
        decode_message_response(response)
    }

    /// Sends a location pin.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a bad number or out-of-range
    /// coordinates; otherwise whatever the transport reports.
    pub async fn send_location(
        &self,
        to: &str,
        location: &Location,
    ) -> Result<MessageResponse, ClientError> {
        let to = validate::normalize_phone_number(to)?;
        validate::coordinates(location.latitude, location.longitude)?;

        let mut body = json!({
            "latitude": location.latitude,
            "longitude": location.longitude,
        });
        if let Some(ref name) = location.name {
            body["name"] = Value::from(name.as_str());
        }
        if let Some(ref address) = location.address {
            body["address"] = Value::from(address.as_str());
        }

        let response = self
            .post_message(json!({
                "messaging_product": MESSAGING_PRODUCT,
                "recipient_type": "individual",
                "to": to,
                "type": "location",
                "location": body,
            }))
            .await?;
        tracing::debug!("Sent location message to {to}");
        decode_message_response(response)
    }

    /// Marks an inbound message as read.
    ///
    /// Returns the `success` flag reported by the API.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank id; otherwise whatever the
    /// transport reports.
    pub async fn mark_as_read(&self, message_id: &str) -> Result<bool, ClientError> {
        validate::identifier("message id", message_id)?;

        let response = self
            .post_message(json!({
                "messaging_product": MESSAGING_PRODUCT,
                "status": "read",
                "message_id": message_id,
            }))
            .await?;
        Ok(success_flag(&response))
    }

    async fn post_message(&self, body: Value) -> Result<JsonMap, ClientError> {
        let descriptor = RequestDescriptor::post(self.endpoint("messages")).with_json(body);
        Ok(self.transport.send(&descriptor).await?)
    }
}

fn decode_message_response(map: JsonMap) -> Result<MessageResponse, ClientError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ClientError::UnexpectedResponse(format!("message response: {e}")))
}

pub(super) fn success_flag(map: &JsonMap) -> bool {
    map.get("success").and_then(Value::as_bool).unwrap_or(false)
}
