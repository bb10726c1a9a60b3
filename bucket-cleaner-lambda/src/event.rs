use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceProperties {
    #[serde(default)]
    pub s3bucket: Option<String>,
}

/// CloudFormation custom resource request. Only `RequestType` and `ResponseURL` are needed to
/// answer; everything else is echoed back.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceEvent {
    pub request_type: RequestType,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    #[serde(default)]
    pub stack_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    #[serde(rename = "Data")]
    pub data: String,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub data: ResponseData,
}

impl CfnResponse {
    pub fn new(
        event: &CustomResourceEvent,
        status: ResponseStatus,
        message: String,
        log_stream: &str,
    ) -> Self {
        CfnResponse {
            status,
            reason: format!("See the details in CloudWatch Log Stream: {log_stream}"),
            physical_resource_id: event
                .physical_resource_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| event.logical_resource_id.clone()),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            data: ResponseData { data: message },
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod event_tests;
