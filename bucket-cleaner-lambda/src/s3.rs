use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use aws_types::SdkConfig;
use log::{debug, info};

use crate::errors::Error;

/// Most keys a single DeleteObjects call accepts.
pub const MAX_DELETE_BATCH: usize = 1000;

#[async_trait]
pub trait BucketEmptier: Send + Sync {
    /// Removes everything stored in `bucket` and returns how many keys were deleted.
    async fn empty_bucket(&self, bucket: &str) -> Result<usize, Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub key: String,
    pub version_id: Option<String>,
}

impl ObjectKey {
    pub fn current(key: &str) -> Self {
        ObjectKey {
            key: key.to_string(),
            version_id: None,
        }
    }

    pub fn versioned(key: &str, version_id: &str) -> Self {
        ObjectKey {
            key: key.to_string(),
            version_id: Some(version_id.to_string()),
        }
    }
}

pub fn delete_batches(keys: &[ObjectKey]) -> impl Iterator<Item = &[ObjectKey]> {
    keys.chunks(MAX_DELETE_BATCH)
}

#[derive(Debug, Clone)]
pub struct S3BucketEmptier {
    client: Client,
}

impl S3BucketEmptier {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        S3BucketEmptier {
            client: Client::new(sdk_config),
        }
    }

    async fn delete_versions(&self, bucket: &str) -> Result<usize, Error> {
        let mut deleted = 0;
        let mut key_marker = None;
        let mut version_id_marker = None;
        loop {
            let page = self
                .client
                .list_object_versions()
                .bucket(bucket)
                .set_key_marker(key_marker.take())
                .set_version_id_marker(version_id_marker.take())
                .send()
                .await
                .map_err(|err| s3_error(bucket, err))?;

            let versions = page
                .versions()
                .iter()
                .filter_map(|version| Some((version.key()?, version.version_id()?)));
            let markers = page
                .delete_markers()
                .iter()
                .filter_map(|marker| Some((marker.key()?, marker.version_id()?)));
            let keys: Vec<ObjectKey> = versions
                .chain(markers)
                .map(|(key, version_id)| ObjectKey::versioned(key, version_id))
                .collect();
            deleted += self.delete_keys(bucket, &keys).await?;

            if !page.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = page.next_key_marker().map(String::from);
            version_id_marker = page.next_version_id_marker().map(String::from);
        }
        Ok(deleted)
    }

    async fn delete_current_objects(&self, bucket: &str) -> Result<usize, Error> {
        let mut deleted = 0;
        let mut continuation_token = None;
        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|err| s3_error(bucket, err))?;

            let keys: Vec<ObjectKey> = page
                .contents()
                .iter()
                .filter_map(|object| object.key())
                .map(ObjectKey::current)
                .collect();
            deleted += self.delete_keys(bucket, &keys).await?;

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string())
                }
                _ => break,
            }
        }
        Ok(deleted)
    }

    async fn delete_keys(&self, bucket: &str, keys: &[ObjectKey]) -> Result<usize, Error> {
        let mut deleted = 0;
        for batch in delete_batches(keys) {
            let objects = batch
                .iter()
                .map(|object| {
                    ObjectIdentifier::builder()
                        .key(&object.key)
                        .set_version_id(object.version_id.clone())
                        .build()
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| s3_error(bucket, err))?;
            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|err| s3_error(bucket, err))?;

            let output = self
                .client
                .delete_objects()
                .bucket(bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| s3_error(bucket, err))?;

            let errors = output.errors();
            if let Some(first) = errors.first() {
                return Err(Error::PartialDelete {
                    bucket: bucket.to_string(),
                    failed: errors.len(),
                    first: format!(
                        "{} ({})",
                        first.key().unwrap_or_default(),
                        first.message().or(first.code()).unwrap_or("unknown error")
                    ),
                });
            }
            debug!("Deleted {} keys from {}", batch.len(), bucket);
            deleted += batch.len();
        }
        Ok(deleted)
    }
}

#[async_trait]
impl BucketEmptier for S3BucketEmptier {
    async fn empty_bucket(&self, bucket: &str) -> Result<usize, Error> {
        let versions = self.delete_versions(bucket).await?;
        let objects = self.delete_current_objects(bucket).await?;
        info!(
            "Removed {} object versions and {} remaining objects from {}",
            versions, objects, bucket
        );
        Ok(versions + objects)
    }
}

fn s3_error<E: std::error::Error>(bucket: &str, err: E) -> Error {
    Error::S3 {
        bucket: bucket.to_string(),
        reason: DisplayErrorContext(err).to_string(),
    }
}
