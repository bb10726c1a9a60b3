pub mod artifact;
pub mod job;
pub mod params;

use async_trait::async_trait;
use log::{error, info, warn};
use serde::Serialize;

use crate::config::ScannerConfig;
use crate::rules::errors::Error;
use crate::rules::evaluate::{evaluate, EvaluationResult, Finding};
use crate::rules::store::{KeyValueStore, RuleStoreAccessor};
use crate::rules::Result;
use crate::template;
use crate::utils::retry::retry_with_backoff;
use job::{ArtifactCredentials, ContinuationToken, Job, S3Location};
use params::UserParameters;

/// CodePipeline rejects failure messages longer than this.
pub const MAX_FAILURE_MESSAGE_LEN: usize = 5000;

/// Object storage holding pipeline artifacts and receiving scan reports.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Downloads an artifact with the credentials the pipeline supplied for this job.
    async fn download(
        &self,
        location: &S3Location,
        credentials: Option<&ArtifactCredentials>,
    ) -> Result<Vec<u8>>;

    /// Stores a scan report with the function's own credentials.
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
}

/// Job status callbacks of the pipeline orchestrator.
#[async_trait]
pub trait JobReporter: Send + Sync {
    async fn put_job_success(&self, job_id: &str, message: &str) -> Result<()>;

    /// Completes this invocation and asks the pipeline to invoke the job again with `token`.
    async fn continue_job_later(&self, job_id: &str, token: &str, message: &str) -> Result<()>;

    async fn put_job_failure(&self, job_id: &str, message: &str) -> Result<()>;
}

/// What the scanner reported for a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed {
        evaluation: EvaluationResult,
    },
    Continued {
        token: String,
        reason: String,
    },
    Failed {
        message: String,
        evaluation: Option<EvaluationResult>,
    },
}

/// Report written to the output bucket for every evaluated template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport<'a> {
    pub job_id: &'a str,
    pub template: &'a str,
    pub passed: bool,
    pub risk_score: u64,
    pub max_risk_score: u64,
    pub violated_rules: &'a [String],
    pub findings: &'a [Finding],
}

/// Runs a CodePipeline job end to end: fetch the template, score it, report back.
pub struct PipelineScanner<S, A, R> {
    rules: RuleStoreAccessor<S>,
    artifacts: A,
    reporter: R,
    config: ScannerConfig,
}

impl<S, A, R> PipelineScanner<S, A, R>
where
    S: KeyValueStore,
    A: ArtifactStore,
    R: JobReporter,
{
    pub fn new(store: S, artifacts: A, reporter: R, config: ScannerConfig) -> Self {
        let rules = RuleStoreAccessor::new(store, config.rules_table_marker.clone())
            .with_retry(config.retry.clone())
            .with_bootstrap_settle(config.bootstrap_settle());
        PipelineScanner {
            rules,
            artifacts,
            reporter,
            config,
        }
    }

    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn rule_store(&self) -> &S {
        self.rules.store()
    }

    /// Every outcome, errors included, is reported to the pipeline before returning. Only
    /// a failure of that report is returned as `Err`.
    pub async fn run(&self, job: &Job) -> Result<Outcome> {
        info!("Scanning job {}", job.id);
        if let Some(token) = job.data.continuation_token.as_deref() {
            match ContinuationToken::decode(token) {
                Some(previous) => info!(
                    "Job {} continues deferred job {}",
                    job.id, previous.previous_job_id
                ),
                None => warn!("Job {} carries a continuation token this scanner did not issue", job.id),
            }
        }

        let outcome = match self.scan(job).await {
            Ok((params, evaluation)) => {
                self.store_report(job, &params, &evaluation).await;
                self.verdict(evaluation)
            }
            Err(err) if self.should_defer(job, &err) => Outcome::Continued {
                token: ContinuationToken {
                    previous_job_id: job.id.clone(),
                }
                .encode(),
                reason: err.to_string(),
            },
            Err(err) => Outcome::Failed {
                message: err.to_string(),
                evaluation: None,
            },
        };
        self.report(&job.id, &outcome).await?;
        Ok(outcome)
    }

    async fn scan(&self, job: &Job) -> Result<(UserParameters, EvaluationResult)> {
        let params = UserParameters::parse(job.user_parameters())?;
        let artifact = job.find_input_artifact(&params.input)?;
        let location = &artifact.location.s3_location;
        info!("Retrieving {} for template {}", location, params.file);

        let archive = retry_with_backoff(&self.config.retry, "download artifact", || {
            self.artifacts
                .download(location, job.data.artifact_credentials.as_ref())
        })
        .await?;
        let content = artifact::read_entry(&archive, &params.file)?;
        let document = template::parse_template(&content)?;

        let rules = self.rules.load_rules().await?;
        let resources = template::extract(&document)?;
        let evaluation = evaluate(&rules, &resources)?;
        Ok((params, evaluation))
    }

    fn should_defer(&self, job: &Job, err: &Error) -> bool {
        self.config.continue_on_transient_failure
            && err.is_recoverable()
            && job.data.continuation_token.is_none()
    }

    fn verdict(&self, evaluation: EvaluationResult) -> Outcome {
        if evaluation.risk_score > self.config.max_risk_score {
            Outcome::Failed {
                message: format!(
                    "Risk score {} exceeds the allowed {}. Violated rules: [{}]",
                    evaluation.risk_score,
                    self.config.max_risk_score,
                    evaluation.violated_rules.join(", ")
                ),
                evaluation: Some(evaluation),
            }
        } else {
            Outcome::Passed { evaluation }
        }
    }

    /// Upload problems are logged and never change the job's verdict.
    async fn store_report(&self, job: &Job, params: &UserParameters, evaluation: &EvaluationResult) {
        let report = ScanReport {
            job_id: &job.id,
            template: &params.file,
            passed: evaluation.risk_score <= self.config.max_risk_score,
            risk_score: evaluation.risk_score,
            max_risk_score: self.config.max_risk_score,
            violated_rules: &evaluation.violated_rules,
            findings: &evaluation.findings,
        };
        let key = format!("{}/{}.json", self.config.report_prefix.trim_end_matches('/'), job.id);
        let body = match serde_json::to_vec_pretty(&report) {
            Ok(body) => body,
            Err(e) => {
                error!("Could not serialize scan report for job {}: {}", job.id, e);
                return;
            }
        };
        match self.artifacts.upload(&params.output, &key, body).await {
            Ok(()) => info!("Stored scan report at s3://{}/{}", params.output, key),
            Err(e) => error!("Failed to store scan report for job {}: {}", job.id, e),
        }
    }

    async fn report(&self, job_id: &str, outcome: &Outcome) -> Result<()> {
        match outcome {
            Outcome::Passed { evaluation } => {
                let message = format!(
                    "Template passed with risk score {} (allowed {})",
                    evaluation.risk_score, self.config.max_risk_score
                );
                info!("Putting job success for {}: {}", job_id, message);
                self.reporter.put_job_success(job_id, &message).await
            }
            Outcome::Continued { token, reason } => {
                let message = format!("Scan deferred after a transient failure: {reason}");
                warn!("Putting job continuation for {}: {}", job_id, message);
                self.reporter.continue_job_later(job_id, token, &message).await
            }
            Outcome::Failed { message, .. } => {
                error!("Putting job failure for {}: {}", job_id, message);
                self.reporter
                    .put_job_failure(job_id, truncate_message(message, MAX_FAILURE_MESSAGE_LEN))
                    .await
            }
        }
    }
}

/// Cuts `message` to at most `max_len` bytes on a character boundary.
pub fn truncate_message(message: &str, max_len: usize) -> &str {
    if message.len() <= max_len {
        return message;
    }
    let mut end = max_len;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}
