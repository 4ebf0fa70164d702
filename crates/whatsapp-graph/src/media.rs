//! Media resolution, upload, download, and deletion.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use whatsapp_core::ids::{MediaId, PhoneId};

use crate::client::GraphClient;
use crate::error::GraphError;

/// Any of the shapes a caller may hand in for an outbound media attachment.
///
/// [`MediaRef::Id`] and [`MediaRef::Url`] pass straight through to the send
/// payload; everything else is uploaded first and substituted with the
/// resulting [`MediaId`].
pub enum MediaRef {
    /// A previously uploaded media handle.
    Id(MediaId),
    /// An HTTPS URL the provider fetches directly.
    Url(String),
    /// A local file path; MIME type is guessed from the extension unless overridden.
    Path(PathBuf),
    /// Raw bytes; MIME type must be supplied since there's no extension to guess from.
    Bytes {
        /// File content.
        data: Vec<u8>,
        /// Explicit MIME type.
        mime_type: String,
        /// Suggested file name, sent to the provider for document uploads.
        filename: Option<String>,
    },
}

/// Whether a resolved reference is a handle (`id`) or a link (`link`) on the wire.
pub(crate) enum Resolved {
    Id(MediaId),
    Link(String),
}

#[derive(Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Deserialize)]
struct MediaUrlResponse {
    url: String,
    mime_type: Option<String>,
    sha256: Option<String>,
    file_size: Option<u64>,
}

/// Metadata returned by [`resolve_url`] before the caller downloads the bytes.
#[derive(Debug, Clone)]
pub struct MediaUrlInfo {
    /// Signed URL, valid for roughly 5 minutes.
    pub url: String,
    /// MIME type, when the provider reports one.
    pub mime_type: Option<String>,
    /// Hex SHA-256 of the media, when the provider reports one.
    pub sha256: Option<String>,
    /// File size in bytes, when the provider reports one.
    pub file_size: Option<u64>,
}

/// Resolve a [`MediaRef`] to something sendable, uploading local content
/// (path/bytes) to `/<phone_id>/media` first.
pub(crate) async fn resolve(
    client: &GraphClient,
    phone_id: &PhoneId,
    media: MediaRef,
) -> Result<Resolved, GraphError> {
    match media {
        MediaRef::Id(id) => Ok(Resolved::Id(id)),
        MediaRef::Url(url) => Ok(Resolved::Link(url)),
        MediaRef::Path(path) => {
            let mime_type = guess_mime(&path)
                .ok_or_else(|| GraphError::MediaResolution(format!("cannot determine MIME type for {path:?}")))?;
            let bytes = tokio::fs::read(&path).await?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(ToString::to_string);
            let id = upload(client, phone_id, bytes, &mime_type, filename.as_deref()).await?;
            Ok(Resolved::Id(id))
        }
        MediaRef::Bytes { data, mime_type, filename } => {
            let id = upload(client, phone_id, data, &mime_type, filename.as_deref()).await?;
            Ok(Resolved::Id(id))
        }
    }
}

fn guess_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path).first().map(|m| m.essence_str().to_string())
}

/// Upload raw bytes to `/<phone_id>/media`, returning the resulting handle.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] or [`GraphError::Transport`] on failure.
pub async fn upload(
    client: &GraphClient,
    phone_id: &PhoneId,
    data: Vec<u8>,
    mime_type: &str,
    filename: Option<&str>,
) -> Result<MediaId, GraphError> {
    let part = reqwest::multipart::Part::bytes(data)
        .file_name(filename.unwrap_or("upload.bin").to_string())
        .mime_str(mime_type)
        .map_err(|e| GraphError::MediaResolution(e.to_string()))?;

    let form = reqwest::multipart::Form::new()
        .text("messaging_product", "whatsapp")
        .part("file", part);

    let path = GraphClient::path_for(phone_id.as_str(), "media");
    let response: UploadResponse = client.post_multipart(&path, form).await?;
    Ok(MediaId::new(response.id))
}

/// Resolve a media ID to a signed download URL (valid ~5 minutes).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the media ID is unknown or expired.
pub async fn resolve_url(client: &GraphClient, media_id: &MediaId) -> Result<MediaUrlInfo, GraphError> {
    let path = GraphClient::path_for(media_id.as_str(), "");
    let response: MediaUrlResponse = client.get(&path).await?;
    Ok(MediaUrlInfo {
        url: response.url,
        mime_type: response.mime_type,
        sha256: response.sha256,
        file_size: response.file_size,
    })
}

/// Download the raw bytes behind a signed media URL obtained from [`resolve_url`].
///
/// # Errors
///
/// Returns [`GraphError::Transport`] on a network failure.
pub async fn download(client: &GraphClient, info: &MediaUrlInfo) -> Result<Vec<u8>, GraphError> {
    client.get_bytes(&info.url).await
}

#[derive(Deserialize)]
struct DeleteResponse {
    #[allow(dead_code)]
    success: bool,
}

/// Delete a previously uploaded media handle.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the handle is unknown.
pub async fn delete(client: &GraphClient, media_id: &MediaId) -> Result<(), GraphError> {
    let path = GraphClient::path_for(media_id.as_str(), "");
    let _: DeleteResponse = client.delete(&path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_mime_from_extension() {
        assert_eq!(guess_mime(Path::new("photo.jpg")).as_deref(), Some("image/jpeg"));
        assert_eq!(guess_mime(Path::new("no_extension")), None);
    }
}
