use async_trait::async_trait;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::SdkConfig;
use log::{debug, error, info};

use cfn_risk_scanner::pipeline::job::{ArtifactCredentials, S3Location};
use cfn_risk_scanner::{ArtifactStore, Error, Result};

const ARTIFACT_CREDENTIALS_PROVIDER: &str = "CodePipelineArtifactCredentials";

/// Pipeline artifacts and scan reports in S3.
#[derive(Clone, Debug)]
pub struct S3ArtifactStore {
    sdk_config: SdkConfig,
    client: Client,
}

impl S3ArtifactStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        S3ArtifactStore {
            sdk_config: sdk_config.clone(),
            client: Client::new(sdk_config),
        }
    }

    /// Artifact reads use the per-job credentials from the pipeline when it supplied them.
    fn artifact_client(&self, credentials: Option<&ArtifactCredentials>) -> Client {
        match credentials {
            Some(credentials) => {
                let provider = Credentials::new(
                    credentials.access_key_id.clone(),
                    credentials.secret_access_key.clone(),
                    Some(credentials.session_token.clone()),
                    None,
                    ARTIFACT_CREDENTIALS_PROVIDER,
                );
                let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
                    .credentials_provider(provider)
                    .build();
                Client::from_conf(config)
            }
            None => self.client.clone(),
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn download(
        &self,
        location: &S3Location,
        credentials: Option<&ArtifactCredentials>,
    ) -> Result<Vec<u8>> {
        info!("Retrieving {}", location);
        let output = self
            .artifact_client(credentials)
            .get_object()
            .bucket(&location.bucket_name)
            .key(&location.object_key)
            .send()
            .await
            .map_err(|err| {
                Error::ArtifactUnavailable(format!("{}: {}", location, DisplayErrorContext(&err)))
            })?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| Error::ArtifactUnavailable(format!("{}: {}", location, err)))?;
        let bytes = body.into_bytes().to_vec();
        debug!("Downloaded {} bytes from {}", bytes.len(), location);
        Ok(bytes)
    }

    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|err| {
                error!(
                    "failed to upload file '{}' to S3 with error: {}",
                    key,
                    DisplayErrorContext(&err)
                );
                Error::ArtifactUnavailable(format!("s3://{}/{}", bucket, key))
            })?;
        Ok(())
    }
}
