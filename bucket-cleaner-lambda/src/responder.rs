use async_trait::async_trait;
use log::info;
use reqwest::header::CONTENT_TYPE;

use crate::errors::Error;
use crate::event::CfnResponse;

#[async_trait]
pub trait ResponseSender: Send + Sync {
    async fn send(&self, response_url: &str, response: &CfnResponse) -> Result<(), Error>;
}

/// Uploads the response to the pre-signed URL CloudFormation handed over with the request.
#[derive(Debug, Clone, Default)]
pub struct HttpResponder {
    client: reqwest::Client,
}

impl HttpResponder {
    pub fn new(client: reqwest::Client) -> Self {
        HttpResponder { client }
    }
}

#[async_trait]
impl ResponseSender for HttpResponder {
    async fn send(&self, response_url: &str, response: &CfnResponse) -> Result<(), Error> {
        let body = serde_json::to_string(response)?;
        // The pre-signed URL is signed without a content type.
        let reply = self
            .client
            .put(response_url)
            .header(CONTENT_TYPE, "")
            .body(body)
            .send()
            .await
            .map_err(|err| Error::ResponseFailed(err.to_string()))?;

        let status = reply.status();
        if !status.is_success() {
            return Err(Error::ResponseFailed(format!(
                "CloudFormation answered with status {status}"
            )));
        }
        info!("Response status code: {}", status);
        Ok(())
    }
}
