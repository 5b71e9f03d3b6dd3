//! S3 object storage integration.
//!
//! Uploads in-memory image buffers under the `images/` key prefix, builds
//! public URLs from the configured base, and ingests external image links
//! on a best-effort basis (ingestion failures are logged and swallowed,
//! never raised to the caller).

use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{BehaviorVersion, Region},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AwsS3Settings;

/// In-memory binary blob with a declared MIME type.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub buffer: Bytes,
    pub mimetype: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("no known extension for MIME type {0}")]
    UnknownMimeType(String),

    #[error("S3 upload failed: {0}")]
    Upload(String),
}

/// S3 client wrapper for image uploads and public URL resolution.
pub struct S3StorageService {
    client: Client,
    settings: AwsS3Settings,
}

impl S3StorageService {
    pub fn new(settings: &AwsS3Settings) -> Self {
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&settings.access_key_id, &settings.secret_access_key)
        {
            builder = builder.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "backbone-api",
            ));
        }

        // S3-compatible stores need an explicit endpoint and path-style keys
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(bucket = %settings.bucket_name, region = %settings.region, "S3 storage initialized");

        Self {
            client: Client::from_conf(builder.build()),
            settings: settings.clone(),
        }
    }

    /// Upload an image buffer. Returns the storage key, not a URL.
    pub async fn upload_image(
        &self,
        file: &UploadedFile,
        folder: Option<&str>,
    ) -> Result<String, StorageError> {
        let extension = extension_for_mime(&file.mimetype)
            .ok_or_else(|| StorageError::UnknownMimeType(file.mimetype.clone()))?;
        let key = image_key(extension, folder);

        debug!(key = %key, size = file.buffer.len(), "Uploading image");

        self.client
            .put_object()
            .bucket(&self.settings.bucket_name)
            .key(&key)
            .content_type(&file.mimetype)
            .body(ByteStream::from(file.buffer.clone()))
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        info!(key = %key, "Image uploaded");
        Ok(key)
    }

    /// Build a public URL for a stored key. `None` stays `None`; absolute
    /// http(s) URLs are returned unchanged; doubled slashes are collapsed.
    pub fn get_public_url(&self, path: Option<&str>) -> Option<String> {
        build_public_url(&self.settings.public_url, path)
    }

    /// Fetch an external image URL and re-upload it to storage. Best-effort:
    /// any failure returns `None` without raising.
    pub async fn image_link_to_s3(&self, source: &str, folder: Option<&str>) -> Option<String> {
        let response = match reqwest::get(source).await {
            Ok(response) => response,
            Err(e) => {
                warn!(source = %source, error = %e, "Image link fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(source = %source, status = %response.status(), "Image link fetch returned non-success");
            return None;
        }

        let mimetype = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(source = %source, error = %e, "Image link body read failed");
                return None;
            }
        };

        // Stage through a temp file and re-read, keeping the download and
        // the upload as two separate failure domains.
        let staged = match stage_to_tempfile(&bytes).await {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!(source = %source, error = %e, "Image staging failed");
                return None;
            }
        };

        let file = UploadedFile {
            buffer: staged,
            mimetype,
        };
        let folder = folder.unwrap_or(&self.settings.link_image_folder);

        match self.upload_image(&file, Some(folder)).await {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(source = %source, error = %e, "Image link upload failed");
                None
            }
        }
    }
}

async fn stage_to_tempfile(bytes: &[u8]) -> std::io::Result<Bytes> {
    let tmp = tempfile::NamedTempFile::new()?;
    tokio::fs::write(tmp.path(), bytes).await?;
    let buffer = tokio::fs::read(tmp.path()).await?;
    Ok(Bytes::from(buffer))
}

/// Collision-resistant object key: `images/<folder?>/<uuid>.<ext>`.
fn image_key(extension: &str, folder: Option<&str>) -> String {
    let name = format!("{}.{}", Uuid::new_v4(), extension);
    match folder {
        Some(folder) => format!("images/{folder}/{name}"),
        None => format!("images/{name}"),
    }
}

/// Preferred file extension for a MIME type. Common image types are pinned
/// to their conventional extension; everything else defers to mime_guess.
fn extension_for_mime(mimetype: &str) -> Option<&'static str> {
    match mimetype {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|extensions| extensions.first())
            .copied(),
    }
}

static ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://").unwrap()
});
static DOUBLE_SLASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^:])/{2,}").unwrap()
});

fn build_public_url(base: &str, path: Option<&str>) -> Option<String> {
    let path = path?;
    if ABSOLUTE_URL.is_match(path) {
        return Some(path.to_string());
    }
    let url = format!("{base}/{path}");
    Some(DOUBLE_SLASH.replace_all(&url, "$1/").into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AwsS3Settings {
        AwsS3Settings {
            access_key_id: None,
            secret_access_key: None,
            bucket_name: "test-bucket".to_string(),
            public_url: "http://base".to_string(),
            endpoint: None,
            region: "eu-central-1".to_string(),
            link_image_folder: "links".to_string(),
        }
    }

    #[test]
    fn test_public_url_none_stays_none() {
        assert_eq!(build_public_url("http://base", None), None);
    }

    #[test]
    fn test_public_url_absolute_unchanged() {
        assert_eq!(
            build_public_url("http://base", Some("http://x.com/a")),
            Some("http://x.com/a".to_string())
        );
        assert_eq!(
            build_public_url("http://base", Some("HTTPS://x.com/a")),
            Some("HTTPS://x.com/a".to_string())
        );
    }

    #[test]
    fn test_public_url_prefixes_and_collapses_slashes() {
        assert_eq!(
            build_public_url("http://base", Some("a//b")),
            Some("http://base/a/b".to_string())
        );
        assert_eq!(
            build_public_url("http://base/", Some("/a/b")),
            Some("http://base/a/b".to_string())
        );
        // The scheme's own double slash survives
        assert_eq!(
            build_public_url("http://base", Some("a/b")),
            Some("http://base/a/b".to_string())
        );
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_mime("image/png"), Some("png"));
        assert_eq!(extension_for_mime("not-a-mime"), None);
    }

    #[test]
    fn test_image_key_shape() {
        let key = image_key("png", Some("avatars"));
        assert!(key.starts_with("images/avatars/"));
        assert!(key.ends_with(".png"));

        let key = image_key("jpg", None);
        assert!(key.starts_with("images/"));
        assert_eq!(key.matches('/').count(), 1);
    }

    #[tokio::test]
    async fn test_image_link_to_s3_unreachable_source_is_soft_failure() {
        let service = S3StorageService::new(&settings());
        // Nothing listens on port 1; the fetch fails fast and is swallowed
        let result = service
            .image_link_to_s3("http://127.0.0.1:1/image.png", None)
            .await;
        assert_eq!(result, None);
    }
}
