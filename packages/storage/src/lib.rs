#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Object storage gateway for uploaded media (report attachments,
//! featured images).
//!
//! The storage service is an external collaborator; its whole contract is
//! "upload bytes, get back a public URL" ([`ObjectStorage`]). The
//! [`S3Storage`] adapter targets any S3-compatible endpoint. Keys are
//! content-addressed (`{folder}/{md5}/{filename}`), so re-uploading the
//! same attachment is detected via `HeadObject` and skipped.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `MEDIA_ENDPOINT` | Yes | S3-compatible endpoint URL |
//! | `MEDIA_BUCKET` | Yes | Bucket receiving uploads |
//! | `MEDIA_PUBLIC_URL` | Yes | Public base URL prefixed onto object keys |
//! | `MEDIA_ACCESS_KEY_ID` | Yes | Access key |
//! | `MEDIA_SECRET_ACCESS_KEY` | Yes | Secret key |

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::{Credentials, StalledStreamProtectionConfig};

/// Errors from object storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// S3 `PutObject` failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `HeadObject` failed.
    #[error("Failed to head s3://{bucket}/{key}: {source}")]
    Head {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Upload-only contract with the external object storage service.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `data` under the given folder and returns its public URL.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the upload fails.
    async fn upload(
        &self,
        data: Vec<u8>,
        folder: &str,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// [`ObjectStorage`] adapter for an S3-compatible bucket.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3Storage {
    /// Creates an adapter from the `MEDIA_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::MissingEnv`] if any required variable is
    /// unset.
    pub fn from_env() -> Result<Self, StorageError> {
        let endpoint = require_env("MEDIA_ENDPOINT")?;
        let bucket = require_env("MEDIA_BUCKET")?;
        let public_base_url = require_env("MEDIA_PUBLIC_URL")?;
        let access_key = require_env("MEDIA_ACCESS_KEY_ID")?;
        let secret_key = require_env("MEDIA_SECRET_ACCESS_KEY")?;

        let creds = Credentials::new(&access_key, &secret_key, None, None, "media-env");

        let config = aws_sdk_s3::Config::builder()
            .endpoint_url(&endpoint)
            .region(Region::new("auto"))
            .credentials_provider(creds)
            .force_path_style(true)
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled())
            .build();

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(config),
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }

    /// Whether an object with this key already exists.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.as_service_error();
                if service_err
                    .is_some_and(aws_sdk_s3::operation::head_object::HeadObjectError::is_not_found)
                {
                    return Ok(false);
                }
                Err(StorageError::Head {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn upload(
        &self,
        data: Vec<u8>,
        folder: &str,
        filename: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(&data, folder, filename);

        // Content-addressed keys: an existing object has identical bytes.
        if self.exists(&key).await? {
            log::info!("upload of {key} skipped (already stored)");
            return Ok(self.public_url(&key));
        }

        let size = data.len();
        let body = aws_sdk_s3::primitives::ByteStream::from(data);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: self.bucket.clone(),
                key: key.clone(),
                source: Box::new(e),
            })?;

        log::info!("uploaded {key} ({size} bytes)");
        Ok(self.public_url(&key))
    }
}

/// [`ObjectStorage`] holding uploads in process memory, for tests and
/// deployments without configured media storage.
///
/// Methods panic only if the interior lock is poisoned.
#[derive(Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().expect("storage lock poisoned").len()
    }

    /// Whether nothing has been uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        folder: &str,
        filename: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(&data, folder, filename);
        self.objects
            .write()
            .expect("storage lock poisoned")
            .insert(key.clone(), data);
        Ok(format!("memory://{key}"))
    }
}

/// Content-addressed object key: `{folder}/{md5 hex}/{filename}`.
fn object_key(data: &[u8], folder: &str, filename: &str) -> String {
    let digest = md5::compute(data);
    format!("{folder}/{digest:x}/{filename}")
}

fn require_env(name: &str) -> Result<String, StorageError> {
    std::env::var(name).map_err(|_| StorageError::MissingEnv {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_content_addressed() {
        let a = object_key(b"same bytes", "report-attachments", "photo.jpg");
        let b = object_key(b"same bytes", "report-attachments", "photo.jpg");
        let c = object_key(b"other bytes", "report-attachments", "photo.jpg");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("report-attachments/"));
        assert!(a.ends_with("/photo.jpg"));
    }

    #[tokio::test]
    async fn memory_storage_returns_stable_urls() {
        let storage = MemoryStorage::new();
        let url_one = storage
            .upload(b"img".to_vec(), "report-attachments", "a.jpg", "image/jpeg")
            .await
            .unwrap();
        let url_two = storage
            .upload(b"img".to_vec(), "report-attachments", "a.jpg", "image/jpeg")
            .await
            .unwrap();
        assert_eq!(url_one, url_two);
        assert_eq!(storage.len(), 1);
        assert!(url_one.starts_with("memory://report-attachments/"));
    }
}
