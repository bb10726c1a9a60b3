#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use cfn_risk_scanner::pipeline::job::{ArtifactCredentials, S3Location};
use cfn_risk_scanner::rules::defaults::default_items;
use cfn_risk_scanner::utils::retry::RetryPolicy;
use cfn_risk_scanner::{
    ArtifactStore, AttributeValue, CodePipelineEvent, Item, JobReporter, KeyValueStore, Result,
    ScannerConfig,
};

pub const JOB_ID: &str = "11111111-abcd-1111-abcd-111111abcdef";
pub const RULES_TABLE: &str = "pipeline-RulesTable-A1B2C3";

/// Rules table already holding the default rules.
pub struct SeededRuleTable {
    items: Vec<Item>,
}

impl Default for SeededRuleTable {
    fn default() -> Self {
        SeededRuleTable {
            items: default_items(),
        }
    }
}

#[async_trait]
impl KeyValueStore for SeededRuleTable {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(vec!["pipeline-Sessions".to_string(), RULES_TABLE.to_string()])
    }

    async fn scan(&self, _table: &str) -> Result<Vec<Item>> {
        Ok(self.items.clone())
    }

    async fn get_item(&self, _table: &str, key_attribute: &str, key: &str) -> Result<Option<Item>> {
        let wanted = AttributeValue::S(key.to_string());
        Ok(self
            .items
            .iter()
            .find(|item| item.get(key_attribute) == Some(&wanted))
            .cloned())
    }

    async fn put_item_if_absent(&self, _table: &str, _key_attribute: &str, _item: Item) -> Result<bool> {
        Ok(false)
    }
}

/// Serves one zipped template and accepts every report upload.
pub struct ZippedTemplate {
    archive: Vec<u8>,
    pub uploads: Mutex<Vec<(String, String)>>,
}

impl ZippedTemplate {
    pub fn new(file: &str, template: &str) -> Self {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file(file.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(template.as_bytes()).unwrap();
        ZippedTemplate {
            archive: writer.finish().unwrap().into_inner(),
            uploads: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl ArtifactStore for ZippedTemplate {
    async fn download(
        &self,
        _location: &S3Location,
        _credentials: Option<&ArtifactCredentials>,
    ) -> Result<Vec<u8>> {
        Ok(self.archive.clone())
    }

    async fn upload(&self, bucket: &str, key: &str, _body: Vec<u8>) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// Records every job status callback as `<kind>:<job id>`.
#[derive(Default)]
pub struct CallbackLog {
    pub calls: Mutex<Vec<String>>,
}

impl CallbackLog {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobReporter for CallbackLog {
    async fn put_job_success(&self, job_id: &str, _message: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("success:{job_id}"));
        Ok(())
    }

    async fn continue_job_later(&self, job_id: &str, _token: &str, _message: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("continue:{job_id}"));
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, _message: &str) -> Result<()> {
        self.calls.lock().unwrap().push(format!("failure:{job_id}"));
        Ok(())
    }
}

pub fn quick_config() -> ScannerConfig {
    ScannerConfig {
        bootstrap_settle_ms: 0,
        retry: RetryPolicy::never(),
        ..ScannerConfig::default()
    }
}

/// A CodePipeline invoke payload asking to scan `template.json` from `SourceOutput`.
pub fn pipeline_event(user_parameters: &str) -> CodePipelineEvent {
    serde_json::from_value(serde_json::json!({
        "CodePipeline.job": {
            "id": JOB_ID,
            "accountId": "111111111111",
            "data": {
                "actionConfiguration": {
                    "configuration": {
                        "FunctionName": "cfn-risk-scanner",
                        "UserParameters": user_parameters
                    }
                },
                "inputArtifacts": [
                    {
                        "name": "SourceOutput",
                        "revision": "3f2a9c",
                        "location": {
                            "type": "S3",
                            "s3Location": {
                                "bucketName": "codepipeline-us-east-1-artifacts",
                                "objectKey": "app-pipeline/SourceOutp/x1Y2z3"
                            }
                        }
                    }
                ],
                "outputArtifacts": [],
                "artifactCredentials": {
                    "accessKeyId": "ASIAEXAMPLE",
                    "secretAccessKey": "secret",
                    "sessionToken": "token"
                }
            }
        }
    }))
    .unwrap()
}
