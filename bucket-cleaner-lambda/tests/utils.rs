use std::sync::Mutex;

use async_trait::async_trait;

use bucket_cleaner_lambda::{BucketEmptier, CfnResponse, Error, ResponseSender};

#[derive(Default)]
pub struct RecordingEmptier {
    pub emptied: Mutex<Vec<String>>,
    pub failure: Option<String>,
}

impl RecordingEmptier {
    pub fn failing(reason: &str) -> Self {
        RecordingEmptier {
            failure: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn emptied(&self) -> Vec<String> {
        self.emptied.lock().unwrap().clone()
    }
}

#[async_trait]
impl BucketEmptier for RecordingEmptier {
    async fn empty_bucket(&self, bucket: &str) -> Result<usize, Error> {
        if let Some(reason) = &self.failure {
            return Err(Error::S3 {
                bucket: bucket.to_string(),
                reason: reason.clone(),
            });
        }
        self.emptied.lock().unwrap().push(bucket.to_string());
        Ok(3)
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    pub sent: Mutex<Vec<(String, CfnResponse)>>,
    pub unreachable: bool,
}

impl RecordingResponder {
    pub fn sent(&self) -> Vec<(String, CfnResponse)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseSender for RecordingResponder {
    async fn send(&self, response_url: &str, response: &CfnResponse) -> Result<(), Error> {
        self.sent
            .lock()
            .unwrap()
            .push((response_url.to_string(), response.clone()));
        if self.unreachable {
            return Err(Error::ResponseFailed("connection refused".to_string()));
        }
        Ok(())
    }
}

pub const RESPONSE_URL: &str = "https://cloudformation-custom-resource-response.s3.amazonaws.com/signed";

pub fn request(request_type: &str, bucket: Option<&str>) -> String {
    let properties = match bucket {
        Some(bucket) => serde_json::json!({ "ServiceToken": "arn:aws:lambda:cleaner", "s3bucket": bucket }),
        None => serde_json::json!({ "ServiceToken": "arn:aws:lambda:cleaner" }),
    };
    serde_json::json!({
        "RequestType": request_type,
        "ResponseURL": RESPONSE_URL,
        "StackId": "arn:aws:cloudformation:us-east-1:123456789012:stack/pipeline/guid",
        "RequestId": "request-1",
        "LogicalResourceId": "EmptyArtifactBucket",
        "ResourceProperties": properties
    })
    .to_string()
}
