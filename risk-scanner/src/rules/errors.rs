use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("UserParameters are invalid: {0}")]
    InvalidParameters(ParameterError),
    #[error("Input artifact named \"{0}\" not found in event")]
    ArtifactNotFound(String),
    #[error("Could not retrieve artifact {0}")]
    ArtifactUnavailable(String),
    #[error("Artifact archive could not be read: {0}")]
    InvalidArchive(String),
    #[error("Template could not be partitioned into resources: {0}")]
    MalformedTemplate(String),
    #[error("Rule store is unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Rule `{name}` could not be loaded: {reason}")]
    InvalidRule { name: String, reason: String },
    #[error("Regex expression could not be evaluated {0}")]
    RegexError(#[from] fancy_regex::Error),
    #[error("Error serializing JSON {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Could not report job status to the pipeline: {0}")]
    ReportingError(String),
    #[error("Invalid scanner configuration: {0}")]
    ConfigError(String),
}

impl Error {
    /// Transient failures talking to the rule store or artifact store. Everything else is
    /// terminal for the job.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::ArtifactUnavailable(_))
    }
}

impl From<ParameterError> for Error {
    fn from(err: ParameterError) -> Self {
        Error::InvalidParameters(err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::InvalidArchive(err.to_string())
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterError {
    Undecodable(String),
    MissingFields(Vec<&'static str>),
}

impl Display for ParameterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterError::Undecodable(reason) => {
                write!(f, "UserParameters could not be decoded as JSON ({reason})")
            }
            ParameterError::MissingFields(fields) => write!(
                f,
                "Your UserParameters JSON must include {}",
                fields
                    .iter()
                    .map(|field| format!("`{field}`"))
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
        }
    }
}
