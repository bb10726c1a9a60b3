use async_trait::async_trait;
use aws_sdk_codepipeline::error::DisplayErrorContext;
use aws_sdk_codepipeline::types::{ExecutionDetails, FailureDetails, FailureType};
use aws_sdk_codepipeline::Client;
use aws_types::SdkConfig;

use cfn_risk_scanner::pipeline::truncate_message;
use cfn_risk_scanner::{Error, JobReporter, Result};

/// CodePipeline allows at most this many characters in an execution summary.
const MAX_SUMMARY_LEN: usize = 2048;

#[derive(Clone, Debug)]
pub struct CodePipelineReporter {
    client: Client,
}

impl CodePipelineReporter {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        CodePipelineReporter {
            client: Client::new(sdk_config),
        }
    }
}

fn reporting_error<E: std::error::Error + 'static>(err: E) -> Error {
    Error::ReportingError(DisplayErrorContext(&err).to_string())
}

fn execution_details(message: &str) -> ExecutionDetails {
    ExecutionDetails::builder()
        .summary(truncate_message(message, MAX_SUMMARY_LEN))
        .build()
}

#[async_trait]
impl JobReporter for CodePipelineReporter {
    async fn put_job_success(&self, job_id: &str, message: &str) -> Result<()> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(execution_details(message))
            .send()
            .await
            .map_err(reporting_error)?;
        Ok(())
    }

    async fn continue_job_later(&self, job_id: &str, token: &str, message: &str) -> Result<()> {
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .continuation_token(token)
            .execution_details(execution_details(message))
            .send()
            .await
            .map_err(reporting_error)?;
        Ok(())
    }

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()> {
        let details = FailureDetails::builder()
            .r#type(FailureType::JobFailed)
            .message(message)
            .build()
            .map_err(reporting_error)?;
        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map_err(reporting_error)?;
        Ok(())
    }
}
