use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::rules::errors::Error;
use crate::rules::Result;

/// Lambda invoke payload of a CodePipeline custom action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodePipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: Job,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    pub data: JobData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    pub action_configuration: ActionConfiguration,
    #[serde(default)]
    pub input_artifacts: Vec<Artifact>,
    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,
    #[serde(default)]
    pub artifact_credentials: Option<ArtifactCredentials>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionConfiguration {
    pub configuration: ActionConfigurationValues,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionConfigurationValues {
    #[serde(rename = "FunctionName", default)]
    pub function_name: Option<String>,
    #[serde(rename = "UserParameters", default)]
    pub user_parameters: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub name: String,
    #[serde(default)]
    pub revision: Option<String>,
    pub location: ArtifactLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    #[serde(rename = "type", default)]
    pub location_type: Option<String>,
    pub s3_location: S3Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    pub bucket_name: String,
    pub object_key: String,
}

impl std::fmt::Display for S3Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket_name, self.object_key)
    }
}

/// Temporary credentials CodePipeline hands the action for reading its artifacts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl Debug for ArtifactCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"**redacted**")
            .field("session_token", &"**redacted**")
            .finish()
    }
}

impl Job {
    pub fn user_parameters(&self) -> Option<&str> {
        self.data
            .action_configuration
            .configuration
            .user_parameters
            .as_deref()
    }

    pub fn find_input_artifact(&self, name: &str) -> Result<&Artifact> {
        self.data
            .input_artifacts
            .iter()
            .find(|artifact| artifact.name == name)
            .ok_or_else(|| Error::ArtifactNotFound(name.to_string()))
    }
}

/// State carried between invocations of a job the scanner asked to continue later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    pub previous_job_id: String,
}

impl ContinuationToken {
    pub fn encode(&self) -> String {
        serde_json::json!({ "previous_job_id": self.previous_job_id }).to_string()
    }

    /// Tokens this scanner did not issue decode to `None`.
    pub fn decode(token: &str) -> Option<ContinuationToken> {
        serde_json::from_str(token).ok()
    }
}
