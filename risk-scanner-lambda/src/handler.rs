use log::info;
use serde::Serialize;

use cfn_risk_scanner::{
    ArtifactStore, CodePipelineEvent, JobReporter, KeyValueStore, Outcome, PipelineScanner,
};

/// What the function returns to the Lambda runtime after the job was reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutput {
    pub job_id: String,
    pub status: String,
    pub risk_score: Option<u64>,
    pub violated_rules: Vec<String>,
    pub message: Option<String>,
}

impl ScanOutput {
    pub fn from_outcome(job_id: &str, outcome: &Outcome) -> Self {
        let (status, evaluation, message) = match outcome {
            Outcome::Passed { evaluation } => ("Passed", Some(evaluation), None),
            Outcome::Continued { reason, .. } => ("Continued", None, Some(reason.clone())),
            Outcome::Failed {
                message,
                evaluation,
            } => ("Failed", evaluation.as_ref(), Some(message.clone())),
        };
        ScanOutput {
            job_id: job_id.to_string(),
            status: status.to_string(),
            risk_score: evaluation.map(|evaluation| evaluation.risk_score),
            violated_rules: evaluation
                .map(|evaluation| evaluation.violated_rules.clone())
                .unwrap_or_default(),
            message,
        }
    }
}

pub async fn handle_job<S, A, R>(
    scanner: &PipelineScanner<S, A, R>,
    event: CodePipelineEvent,
) -> Result<ScanOutput, lambda_runtime::Error>
where
    S: KeyValueStore,
    A: ArtifactStore,
    R: JobReporter,
{
    let job = event.job;
    let outcome = scanner.run(&job).await?;
    let output = ScanOutput::from_outcome(&job.id, &outcome);
    info!("Job {} finished as {}", output.job_id, output.status);
    Ok(output)
}
