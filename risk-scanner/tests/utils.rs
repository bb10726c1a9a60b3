// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use cfn_risk_scanner::pipeline::job::{ArtifactCredentials, S3Location};
use cfn_risk_scanner::utils::retry::RetryPolicy;
use cfn_risk_scanner::{
    ArtifactStore, AttributeValue, Error, Item, Job, JobReporter, KeyValueStore, Result,
    ScannerConfig,
};

pub const RULES_TABLE: &str = "pipeline-RulesTable-A1B2C3";
pub const ARTIFACT_BUCKET: &str = "codepipeline-us-east-1-artifacts";
pub const ARTIFACT_KEY: &str = "app-pipeline/SourceOutp/x1Y2z3";
pub const REPORT_BUCKET: &str = "scan-reports";

pub fn quick_config() -> ScannerConfig {
    ScannerConfig {
        bootstrap_settle_ms: 1,
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 1,
        },
        ..ScannerConfig::default()
    }
}

#[derive(Default)]
pub struct MemoryRuleStore {
    pub tables: Vec<String>,
    pub items: Mutex<Vec<Item>>,
    pub unavailable: bool,
    pub scans: AtomicUsize,
}

impl MemoryRuleStore {
    pub fn empty() -> Self {
        MemoryRuleStore {
            tables: vec![RULES_TABLE.to_string()],
            ..Default::default()
        }
    }

    pub fn with_items(items: Vec<Item>) -> Self {
        let store = MemoryRuleStore::empty();
        *store.items.lock().unwrap() = items;
        store
    }

    pub fn unavailable() -> Self {
        MemoryRuleStore {
            unavailable: true,
            ..MemoryRuleStore::empty()
        }
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            return Err(Error::StoreUnavailable("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryRuleStore {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.check()?;
        Ok(self.tables.clone())
    }

    async fn scan(&self, _table: &str) -> Result<Vec<Item>> {
        self.check()?;
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().unwrap().clone())
    }

    async fn get_item(&self, _table: &str, key_attribute: &str, key: &str) -> Result<Option<Item>> {
        self.check()?;
        let wanted = AttributeValue::S(key.to_string());
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.get(key_attribute) == Some(&wanted))
            .cloned())
    }

    async fn put_item_if_absent(&self, _table: &str, key_attribute: &str, item: Item) -> Result<bool> {
        self.check()?;
        let mut items = self.items.lock().unwrap();
        if items
            .iter()
            .any(|existing| existing.get(key_attribute) == item.get(key_attribute))
        {
            return Ok(false);
        }
        items.push(item);
        Ok(true)
    }
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    pub objects: HashMap<(String, String), Vec<u8>>,
    pub failing_downloads: AtomicUsize,
    pub downloads: AtomicUsize,
    pub reject_uploads: bool,
    pub uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MemoryArtifactStore {
    pub fn with_template(file: &str, template: &str) -> Self {
        let mut store = MemoryArtifactStore::default();
        store.objects.insert(
            (ARTIFACT_BUCKET.to_string(), ARTIFACT_KEY.to_string()),
            zipped(&[(file, template)]),
        );
        store
    }

    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn uploaded_report(&self) -> Option<serde_json::Value> {
        self.uploads
            .lock()
            .unwrap()
            .last()
            .map(|(_, _, body)| serde_json::from_slice(body).unwrap())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn download(
        &self,
        location: &S3Location,
        credentials: Option<&ArtifactCredentials>,
    ) -> Result<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        assert!(credentials.is_some(), "artifact credentials were not passed through");
        if self.failing_downloads.load(Ordering::SeqCst) > 0 {
            self.failing_downloads.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::ArtifactUnavailable(format!("{location}: SlowDown")));
        }
        self.objects
            .get(&(location.bucket_name.clone(), location.object_key.clone()))
            .cloned()
            .ok_or_else(|| Error::ArtifactUnavailable(format!("{location}: NoSuchKey")))
    }

    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        if self.reject_uploads {
            return Err(Error::ArtifactUnavailable(format!("s3://{bucket}/{key}: AccessDenied")));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), body));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCall {
    Success { job_id: String, message: String },
    Continue { job_id: String, token: String },
    Failure { job_id: String, message: String },
}

#[derive(Default)]
pub struct RecordingReporter {
    pub calls: Mutex<Vec<ReportCall>>,
    pub broken: bool,
}

impl RecordingReporter {
    pub fn calls(&self) -> Vec<ReportCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ReportCall) -> Result<()> {
        if self.broken {
            return Err(Error::ReportingError("JobNotFoundException".to_string()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl JobReporter for RecordingReporter {
    async fn put_job_success(&self, job_id: &str, message: &str) -> Result<()> {
        self.record(ReportCall::Success {
            job_id: job_id.to_string(),
            message: message.to_string(),
        })
    }

    async fn continue_job_later(&self, job_id: &str, token: &str, _message: &str) -> Result<()> {
        self.record(ReportCall::Continue {
            job_id: job_id.to_string(),
            token: token.to_string(),
        })
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()> {
        self.record(ReportCall::Failure {
            job_id: job_id.to_string(),
            message: message.to_string(),
        })
    }
}

pub fn zipped(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn job(user_parameters: &str, continuation_token: Option<&str>) -> Job {
    let mut data = json!({
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
                    "s3Location": { "bucketName": ARTIFACT_BUCKET, "objectKey": ARTIFACT_KEY }
                }
            }
        ],
        "outputArtifacts": [],
        "artifactCredentials": {
            "accessKeyId": "ASIAEXAMPLE",
            "secretAccessKey": "secret",
            "sessionToken": "token"
        }
    });
    if let Some(token) = continuation_token {
        data["continuationToken"] = json!(token);
    }
    serde_json::from_value(json!({
        "id": "11111111-abcd-1111-abcd-111111abcdef",
        "accountId": "111111111111",
        "data": data
    }))
    .unwrap()
}

pub const VALID_PARAMETERS: &str =
    r#"{"input": "SourceOutput", "file": "template.json", "output": "scan-reports"}"#;
