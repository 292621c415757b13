//! Typed inbound webhook payloads.
//!
//! Deliveries look like
//! `{"object": "...", "entry": [{"id", "changes": [{"field", "value": {...}}]}]}`.
//! Unknown fields are ignored and unknown message types decode to
//! [`MessageContent::Unknown`], so new vendor features never break parsing.

use serde::Deserialize;
use serde_json::Value;

/// A raw webhook delivery.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebhookPayload {
    /// Always `whatsapp_business_account` for WhatsApp deliveries.
    pub object: String,
    /// One entry per business account.
    pub entry: Vec<Entry>,
}

/// A business account entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Entry {
    /// Business account id.
    pub id: String,
    /// Changes reported for this account.
    #[serde(default)]
    pub changes: Vec<Change>,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Change {
    /// Subscribed field, usually `messages`.
    pub field: String,
    /// Change data.
    pub value: ChangeValue,
}

/// Data carried by a change.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChangeValue {
    /// Always `whatsapp`.
    pub messaging_product: String,
    /// The receiving business number.
    pub metadata: Metadata,
    /// Sender profiles for the messages in this change.
    #[serde(default)]
    pub contacts: Vec<Contact>,
    /// Inbound messages.
    #[serde(default)]
    pub messages: Vec<IncomingMessage>,
    /// Delivery status updates for outbound messages.
    #[serde(default)]
    pub statuses: Vec<MessageStatus>,
    /// Errors reported by the platform.
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// The business phone number that received the change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    /// Human readable number.
    pub display_phone_number: String,
    /// Phone number id used in API paths.
    pub phone_number_id: String,
}

/// Sender profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contact {
    /// WhatsApp id (phone number) of the sender.
    pub wa_id: String,
    /// Profile data.
    #[serde(default)]
    pub profile: Profile,
}

/// Public profile of a sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// An inbound message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct IncomingMessage {
    /// Message id (`wamid...`).
    pub id: String,
    /// Sender's WhatsApp id.
    pub from: String,
    /// Unix timestamp as sent by the platform.
    pub timestamp: String,
    /// Reply or forward context.
    pub context: Option<MessageContext>,
    /// Type-specific content.
    pub content: MessageContent,
}

impl IncomingMessage {
    /// Returns the `type` string of the message.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.content.kind()
    }

    /// Returns true if the message replies to another message.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.context.is_some()
    }

    /// Returns the text body for text messages.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(text) => Some(&text.body),
            _ => None,
        }
    }
}

/// Context of a reply or forwarded message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MessageContext {
    /// Sender of the original message.
    #[serde(default)]
    pub from: Option<String>,
    /// Id of the original message.
    #[serde(default)]
    pub id: Option<String>,
    /// Set when the message was forwarded.
    #[serde(default)]
    pub forwarded: Option<bool>,
    /// Set when the message was forwarded many times.
    #[serde(default)]
    pub frequently_forwarded: Option<bool>,
}

/// Content of an inbound message, keyed by its `type`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(TextContent),
    Image(MediaContent),
    Video(MediaContent),
    Audio(MediaContent),
    Document(MediaContent),
    Sticker(MediaContent),
    Location(LocationContent),
    Contacts(Vec<Value>),
    Interactive(InteractiveContent),
    Reaction(ReactionContent),
    /// A type this crate does not model.
    Unknown {
        /// The `type` string.
        kind: String,
        /// The object stored under that key, if any.
        raw: Option<Value>,
    },
}

impl MessageContent {
    /// Returns the `type` string this content was decoded from.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::Document(_) => "document",
            Self::Sticker(_) => "sticker",
            Self::Location(_) => "location",
            Self::Contacts(_) => "contacts",
            Self::Interactive(_) => "interactive",
            Self::Reaction(_) => "reaction",
            Self::Unknown { kind, .. } => kind,
        }
    }

    /// Returns the media attachment, if this is a media message.
    #[must_use]
    pub const fn media(&self) -> Option<&MediaContent> {
        match self {
            Self::Image(m) | Self::Video(m) | Self::Audio(m) | Self::Document(m) | Self::Sticker(m) => {
                Some(m)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TextContent {
    pub body: String,
}

/// A media attachment; download it with the media id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaContent {
    pub id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    /// Documents only.
    #[serde(default)]
    pub filename: Option<String>,
    /// Audio only: set for voice notes.
    #[serde(default)]
    pub voice: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationContent {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A button or list reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractiveContent {
    /// `button_reply` or `list_reply`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub button_reply: Option<ReplyOption>,
    #[serde(default)]
    pub list_reply: Option<ReplyOption>,
}

impl InteractiveContent {
    /// Returns whichever reply is present.
    #[must_use]
    pub const fn reply(&self) -> Option<&ReplyOption> {
        match (&self.button_reply, &self.list_reply) {
            (Some(reply), _) | (None, Some(reply)) => Some(reply),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReplyOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReactionContent {
    /// Message the reaction applies to.
    pub message_id: String,
    /// Absent when a reaction is removed.
    #[serde(default)]
    pub emoji: Option<String>,
}

/// Wire shape of a message before its content is split out by `type`.
#[derive(Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    timestamp: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    context: Option<MessageContext>,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

impl TryFrom<RawMessage> for IncomingMessage {
    type Error = String;

    fn try_from(mut raw: RawMessage) -> Result<Self, Self::Error> {
        let body = raw.rest.remove(&raw.kind);
        let content = decode_content(&raw.kind, body)
            .map_err(|e| format!("invalid '{}' message {}: {e}", raw.kind, raw.id))?;

        Ok(Self {
            id: raw.id,
            from: raw.from,
            timestamp: raw.timestamp,
            context: raw.context,
            content,
        })
    }
}

fn decode_content(kind: &str, body: Option<Value>) -> Result<MessageContent, String> {
    fn field<T: serde::de::DeserializeOwned>(kind: &str, body: Option<Value>) -> Result<T, String> {
        let value = body.ok_or_else(|| format!("missing '{kind}' object"))?;
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    Ok(match kind {
        "text" => MessageContent::Text(field(kind, body)?),
        "image" => MessageContent::Image(field(kind, body)?),
        "video" => MessageContent::Video(field(kind, body)?),
        "audio" => MessageContent::Audio(field(kind, body)?),
        "document" => MessageContent::Document(field(kind, body)?),
        "sticker" => MessageContent::Sticker(field(kind, body)?),
        "location" => MessageContent::Location(field(kind, body)?),
        "contacts" => MessageContent::Contacts(field(kind, body)?),
        "interactive" => MessageContent::Interactive(field(kind, body)?),
        "reaction" => MessageContent::Reaction(field(kind, body)?),
        _ => MessageContent::Unknown {
            kind: kind.to_string(),
            raw: body,
        },
    })
}

/// Delivery status of an outbound message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageStatus {
    /// Id of the outbound message.
    pub id: String,
    pub status: StatusKind,
    pub timestamp: String,
    pub recipient_id: String,
    #[serde(default)]
    pub conversation: Option<Value>,
    #[serde(default)]
    pub pricing: Option<Value>,
    /// Present on `failed` statuses.
    #[serde(default)]
    pub errors: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Sent,
    Delivered,
    Read,
    Failed,
    Deleted,
    #[serde(other)]
    Unknown,
}

/// A delivery flattened across entries and changes.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    /// The payload as received.
    pub payload: WebhookPayload,
    /// All inbound messages, in delivery order.
    pub messages: Vec<IncomingMessage>,
    /// All status updates, in delivery order.
    pub statuses: Vec<MessageStatus>,
    /// All platform errors, in delivery order.
    pub errors: Vec<Value>,
}

impl WebhookEvent {
    /// Flattens a payload.
    #[must_use]
    pub fn from_payload(payload: WebhookPayload) -> Self {
        let values = || {
            payload
                .entry
                .iter()
                .flat_map(|entry| &entry.changes)
                .map(|change| &change.value)
        };

        let messages = values().flat_map(|v| v.messages.iter().cloned()).collect();
        let statuses = values().flat_map(|v| v.statuses.iter().cloned()).collect();
        let errors = values().flat_map(|v| v.errors.iter().cloned()).collect();

        Self {
            payload,
            messages,
            statuses,
            errors,
        }
    }

    #[must_use]
    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    #[must_use]
    pub fn has_statuses(&self) -> bool {
        !self.statuses.is_empty()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
