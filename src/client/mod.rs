//! Messaging and media operations for one business phone number.
//!
//! [`WhatsAppClient`] validates arguments locally, builds the Graph API
//! request bodies and hands them to the [`Transport`](crate::transport::Transport).

mod error;
mod media;
mod messages;
mod validate;
mod whatsapp;


pub use error::ClientError;
pub use media::{
    MAX_AUDIO_BYTES, MAX_DOCUMENT_BYTES, MAX_IMAGE_BYTES, MAX_STICKER_BYTES, MAX_VIDEO_BYTES,
    MediaInfo, expand_tilde, max_upload_size,
};
pub use messages::{ImageSource, Location, MessageContact, MessageResponse, SentMessage};
pub use validate::{
    MAX_CAPTION_LENGTH, MAX_PHONE_DIGITS, MAX_TEXT_LENGTH, MIN_PHONE_DIGITS,
    normalize_phone_number,
};
pub use whatsapp::WhatsAppClient;
