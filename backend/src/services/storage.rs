//! Profile picture storage
//!
//! `LocalFileStorage` keeps files on disk and serves them under
//! `/uploads`; `HttpImageStorage` talks to an image CDN upload API.

use crate::config::StorageConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Accepted image content types and the extension stored for each
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
];

/// File extension for an accepted image content type
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    IMAGE_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type))
        .map(|(_, ext)| *ext)
}

/// File handed to a storage backend
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Backend identifier without extension, e.g. `<user id>-<random>`
    pub public_id: String,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

/// Where a stored file ended up
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub id: String,
    pub url: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(&self, upload: StoredUpload) -> Result<StoredFile>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Build the backend named by `storage.provider`
pub fn storage_from_config(config: &StorageConfig) -> Result<Arc<dyn FileStorage>> {
    match config.provider.as_str() {
        "local" => Ok(Arc::new(LocalFileStorage::new(
            &config.local_dir,
            &config.public_base_url,
        ))),
        "http" => Ok(Arc::new(HttpImageStorage::new(config)?)),
        other => anyhow::bail!("Unknown storage provider: {}", other),
    }
}

/// Files on local disk
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            anyhow::bail!("Invalid stored file id: {}", id);
        }
        Ok(self.root.join(id))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, upload: StoredUpload) -> Result<StoredFile> {
        let ext = image_extension(&upload.content_type).unwrap_or("bin");
        let id = format!("{}.{}", upload.public_id, ext);
        let path = self.path_for(&id)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        tokio::fs::write(&path, &upload.bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(path = %path.display(), bytes = upload.bytes.len(), "stored file locally");

        Ok(StoredFile {
            url: format!("{}/{}", self.public_base_url, id),
            id,
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self.path_for(id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }
}

/// Image CDN with an unsigned-preset upload endpoint
pub struct HttpImageStorage {
    client: reqwest::Client,
    upload_url: String,
    destroy_url: String,
    upload_preset: String,
    api_key: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

impl HttpImageStorage {
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build storage HTTP client")?;

        Ok(Self {
            client,
            upload_url: config.upload_url.clone(),
            destroy_url: config.destroy_url.clone(),
            upload_preset: config.upload_preset.clone(),
            api_key: config.api_key.clone(),
            folder: config.folder.trim_matches('/').to_string(),
        })
    }

    fn qualified_id(&self, public_id: &str) -> String {
        if self.folder.is_empty() {
            public_id.to_string()
        } else {
            format!("{}/{}", self.folder, public_id)
        }
    }
}

#[async_trait]
impl FileStorage for HttpImageStorage {
    async fn upload(&self, upload: StoredUpload) -> Result<StoredFile> {
        let part = reqwest::multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .context("Invalid content type")?;

        let mut form = reqwest::multipart::Form::new()
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", self.qualified_id(&upload.public_id))
            .part("file", part);
        if !self.api_key.is_empty() {
            form = form.text("api_key", self.api_key.clone());
        }

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .context("Image upload request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Image upload returned {}: {}", status, body);
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .context("Unexpected image upload response")?;

        info!(public_id = %uploaded.public_id, "uploaded image");

        Ok(StoredFile {
            id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut body = serde_json::json!({ "public_id": id });
        if !self.api_key.is_empty() {
            body["api_key"] = serde_json::Value::String(self.api_key.clone());
        }

        let response = self
            .client
            .post(&self.destroy_url)
            .json(&body)
            .send()
            .await
            .context("Image delete request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Image delete returned {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn png_upload(public_id: &str) -> StoredUpload {
        StoredUpload {
            public_id: public_id.to_string(),
            bytes: vec![0x89, b'P', b'N', b'G'],
            file_name: "me.png".to_string(),
            content_type: "image/png".to_string(),
        }
    }

    fn http_config(server: &MockServer) -> StorageConfig {
        StorageConfig {
            provider: "http".to_string(),
            upload_url: format!("{}/upload", server.uri()),
            destroy_url: format!("{}/destroy", server.uri()),
            upload_preset: "profile".to_string(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("IMAGE/PNG"), Some("png"));
        assert_eq!(image_extension("application/pdf"), None);
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let root = std::env::temp_dir().join(format!("fittrack-storage-{}", Uuid::new_v4()));
        let storage = LocalFileStorage::new(&root, "http://localhost:8080/uploads/");

        let stored = storage.upload(png_upload("user-1")).await.unwrap();
        assert_eq!(stored.id, "user-1.png");
        assert_eq!(stored.url, "http://localhost:8080/uploads/user-1.png");
        assert_eq!(tokio::fs::read(root.join("user-1.png")).await.unwrap().len(), 4);

        storage.delete(&stored.id).await.unwrap();
        assert!(!root.join("user-1.png").exists());
        // deleting twice is fine
        storage.delete(&stored.id).await.unwrap();

        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn test_local_storage_rejects_traversal() {
        let storage = LocalFileStorage::new(std::env::temp_dir(), "http://x");
        assert!(storage.delete("../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn test_http_storage_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "fittrack/profile-pictures/user-1",
                "secure_url": "https://cdn.test/fittrack/profile-pictures/user-1.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let storage = HttpImageStorage::new(&http_config(&server)).unwrap();
        let stored = storage.upload(png_upload("user-1")).await.unwrap();

        assert_eq!(stored.id, "fittrack/profile-pictures/user-1");
        assert_eq!(stored.url, "https://cdn.test/fittrack/profile-pictures/user-1.png");

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8_lossy(&requests[0].body);
        assert!(body.contains("name=\"upload_preset\""));
        assert!(body.contains("fittrack/profile-pictures/user-1"));
    }

    #[tokio::test]
    async fn test_http_storage_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/destroy"))
            .and(body_partial_json(serde_json::json!({ "public_id": "pic-1" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let storage = HttpImageStorage::new(&http_config(&server)).unwrap();
        storage.delete("pic-1").await.unwrap();
    }

    #[tokio::test]
    async fn test_http_storage_upload_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let storage = HttpImageStorage::new(&http_config(&server)).unwrap();
        assert!(storage.upload(png_upload("user-1")).await.is_err());
    }
}
