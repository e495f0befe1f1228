use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::models::upload::ObjectRef;

/// Read access to the upload bucket (and the detection job output written into it).
pub struct S3Storage {
    region: Region,
    credentials: Credentials,
}

impl S3Storage {
    /// Create a client for the given AWS region using the default credential
    /// chain (environment, profile, instance/task role).
    pub fn new(region: &str) -> Result<Self, StorageError> {
        let region: Region = region
            .parse()
            .map_err(|e| StorageError::Config(format!("invalid region {region}: {e}")))?;

        let credentials =
            Credentials::default().map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            region,
            credentials,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StorageError> {
        Bucket::new(name, self.region.clone(), self.credentials.clone()).map_err(StorageError::S3)
    }

    /// Download an object's bytes.
    pub async fn download(&self, object: &ObjectRef) -> Result<Vec<u8>, StorageError> {
        let bucket = self.bucket(&object.bucket)?;
        let response = bucket.get_object(&object.key).await.map_err(StorageError::S3)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Status {
                key: object.key.clone(),
                status,
            });
        }

        Ok(response.to_vec())
    }

    /// List every key under a prefix.
    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StorageError> {
        let bucket = self.bucket(bucket)?;
        let pages = bucket
            .list(prefix.to_string(), None)
            .await
            .map_err(StorageError::S3)?;

        Ok(pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|object| object.key)
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 returned status {status} for {key}")]
    Status { key: String, status: u16 },

    #[error("Storage configuration error: {0}")]
    Config(String),
}
