//! Media upload, lookup, download and deletion.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::time::Sleeper;
use crate::transport::{FilePart, HttpClient, MultipartForm, RequestDescriptor};

use super::messages::success_flag;
use super::{ClientError, WhatsAppClient, validate};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;

/// Size limit for images.
pub const MAX_IMAGE_BYTES: u64 = 5 * MIB;
/// Size limit for videos.
pub const MAX_VIDEO_BYTES: u64 = 16 * MIB;
/// Size limit for audio.
pub const MAX_AUDIO_BYTES: u64 = 16 * MIB;
/// Size limit for stickers (`image/webp`).
pub const MAX_STICKER_BYTES: u64 = 512 * KIB;
/// Size limit for documents and any other type.
pub const MAX_DOCUMENT_BYTES: u64 = 100 * MIB;

/// Returns the upload size limit for a MIME type.
#[must_use]
pub fn max_upload_size(mime_type: &str) -> u64 {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "image/webp" {
        MAX_STICKER_BYTES
    } else if essence.starts_with("image/") {
        MAX_IMAGE_BYTES
    } else if essence.starts_with("video/") {
        MAX_VIDEO_BYTES
    } else if essence.starts_with("audio/") {
        MAX_AUDIO_BYTES
    } else {
        MAX_DOCUMENT_BYTES
    }
}

/// Metadata of an uploaded media object.
///
/// `url` is short-lived and must be fetched with the same bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl<H: HttpClient, S: Sleeper> WhatsAppClient<H, S> {
    /// Uploads bytes and returns the new media id.
    ///
    /// The MIME type is `mime_type` when given, otherwise guessed from
    /// `filename`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] if no MIME type can be determined or the
    /// content exceeds the limit for its type; otherwise whatever the
    /// transport reports.
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        mime_type: Option<&str>,
        filename: Option<&str>,
    ) -> Result<String, ClientError> {
        let mime = mime_type
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| filename.and_then(|name| mime_guess::from_path(name).first_raw()))
            .map(ToString::to_string)
            .ok_or_else(|| {
                ClientError::validation(
                    "mime_type",
                    format!(
                        "could not determine MIME type for '{}'",
                        filename.unwrap_or("<unnamed>")
                    ),
                )
            })?;
        let part = FilePart::new(bytes)
            .with_filename(filename.unwrap_or("file"))
            .with_mime_type(mime.clone());

        let size = part.bytes.len() as u64;
        let limit = max_upload_size(&mime);
        if size > limit {
            return Err(ClientError::validation(
                "file",
                format!("file size {size} bytes exceeds limit of {limit} bytes for {mime}"),
            ));
        }

        let form = MultipartForm::new()
            .text("messaging_product", "whatsapp")
            .text("type", mime.clone())
            .file("file", part);
        let response = self
            .transport
            .send_multipart(&RequestDescriptor::post(self.endpoint("media")), &form)
            .await?;

        let id = response
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::UnexpectedResponse("upload response has no id".to_string()))?;
        tracing::info!("Uploaded {size} bytes of {mime} as media {id}");
        Ok(id.to_string())
    }

    /// Reads a file and uploads it under its file name.
    ///
    /// # Errors
    ///
    /// [`ClientError::Io`] if the file cannot be read, then as
    /// [`Self::upload`].
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
    ) -> Result<String, ClientError> {
        let path = expand_tilde(path.as_ref());
        let bytes = tokio::fs::read(&path).await.map_err(|source| ClientError::Io {
            path: path.clone(),
            source,
        })?;
        let filename = path.file_name().and_then(|n| n.to_str());

        self.upload(bytes, mime_type, filename).await
    }

    /// Looks up the download URL and metadata of a media object.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank id,
    /// [`ClientError::UnexpectedResponse`] if the answer lacks a URL;
    /// otherwise whatever the transport reports.
    pub async fn get_url(&self, media_id: &str) -> Result<MediaInfo, ClientError> {
        validate::identifier("media id", media_id)?;

        let response = self
            .transport
            .send(&RequestDescriptor::get(media_id.trim()))
            .await?;
        serde_json::from_value(Value::Object(response))
            .map_err(|e| ClientError::UnexpectedResponse(format!("media info: {e}")))
    }

    /// Downloads the content of a media object.
    ///
    /// # Errors
    ///
    /// As [`Self::get_url`], plus transport failures of the download.
    pub async fn download(&self, media_id: &str) -> Result<Vec<u8>, ClientError> {
        let info = self.get_url(media_id).await?;
        let bytes = self.transport.fetch_binary(&info.url).await?;
        tracing::debug!("Downloaded {} bytes of media {media_id}", bytes.len());
        Ok(bytes)
    }

    /// Downloads a media object into a file and returns its path.
    ///
    /// A leading `~` is expanded and missing parent directories are created.
    ///
    /// # Errors
    ///
    /// As [`Self::download`], plus [`ClientError::Io`] if the file cannot be
    /// written.
    pub async fn download_to_file(
        &self,
        media_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, ClientError> {
        let bytes = self.download(media_id).await?;
        let path = expand_tilde(path.as_ref());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ClientError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!("Saved media {media_id} to {}", path.display());
        Ok(path)
    }

    /// Deletes a media object and returns the `success` flag.
    ///
    /// # Errors
    ///
    /// [`ClientError::Validation`] for a blank id; otherwise whatever the
    /// transport reports.
    pub async fn delete(&self, media_id: &str) -> Result<bool, ClientError> {
        validate::identifier("media id", media_id)?;

        let response = self
            .transport
            .send(&RequestDescriptor::delete(media_id.trim()))
            .await?;
        Ok(success_flag(&response))
    }
}

/// Expands a leading `~` to the home directory.
///
/// Paths without one, or when no home directory is known, are returned
/// unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
