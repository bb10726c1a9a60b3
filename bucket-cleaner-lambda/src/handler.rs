use log::{error, info};

use crate::errors::Error;
use crate::event::{CfnResponse, CustomResourceEvent, RequestType, ResponseStatus};
use crate::responder::ResponseSender;
use crate::s3::BucketEmptier;

pub struct TeardownHandler<E, R> {
    emptier: E,
    responder: R,
    log_stream: String,
}

impl<E: BucketEmptier, R: ResponseSender> TeardownHandler<E, R> {
    pub fn new(emptier: E, responder: R, log_stream: impl Into<String>) -> Self {
        TeardownHandler {
            emptier,
            responder,
            log_stream: log_stream.into(),
        }
    }

    pub fn emptier(&self) -> &E {
        &self.emptier
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    /// Answers the request and always sends the response to CloudFormation. Only a failure to
    /// deliver that response is returned as an error.
    pub async fn handle(&self, event: CustomResourceEvent) -> Result<CfnResponse, Error> {
        info!(
            "{:?} request for {} in {}",
            event.request_type, event.logical_resource_id, event.stack_id
        );
        let (status, message) = match self.process(&event).await {
            Ok(message) => (ResponseStatus::Success, message),
            Err(err) => {
                error!("Request {} failed: {}", event.request_id, err);
                (
                    ResponseStatus::Failed,
                    format!("Exception raised for function: Exception details: {err}"),
                )
            }
        };

        let response = CfnResponse::new(&event, status, message, &self.log_stream);
        self.responder.send(&event.response_url, &response).await?;
        Ok(response)
    }

    async fn process(&self, event: &CustomResourceEvent) -> Result<String, Error> {
        let bucket = event
            .resource_properties
            .s3bucket
            .as_deref()
            .filter(|bucket| !bucket.is_empty())
            .ok_or(Error::MissingBucket)?;

        match event.request_type {
            RequestType::Delete => {
                let deleted = self.emptier.empty_bucket(bucket).await?;
                info!("Deleted {} keys from {}", deleted, bucket);
                Ok(format!("Deleted objects in bucket: {bucket}"))
            }
            _ => Ok("No work to do".to_string()),
        }
    }
}
