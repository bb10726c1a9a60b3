use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("'s3bucket' is missing from ResourceProperties")]
    MissingBucket,
    #[error("S3 request for bucket {bucket} failed: {reason}")]
    S3 { bucket: String, reason: String },
    #[error("{failed} objects in bucket {bucket} could not be deleted, first failure: {first}")]
    PartialDelete {
        bucket: String,
        failed: usize,
        first: String,
    },
    #[error("Could not send the response to CloudFormation: {0}")]
    ResponseFailed(String),
    #[error("Error serializing JSON {0}")]
    JsonError(#[from] serde_json::Error),
}
