use serde_json::{Map, Value};

use crate::rules::errors::ParameterError;

const INPUT_FIELD: &str = "input";
const FILE_FIELD: &str = "file";
const OUTPUT_FIELD: &str = "output";

/// Decoded `UserParameters` of the pipeline action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserParameters {
    /// Name of the input artifact holding the template.
    pub input: String,
    /// Path of the template inside the artifact zip.
    pub file: String,
    /// Bucket receiving the scan report.
    pub output: String,
}

impl UserParameters {
    /// Every missing or empty field is reported in one error, not just the first.
    pub fn parse(raw: Option<&str>) -> Result<UserParameters, ParameterError> {
        let raw = raw.ok_or_else(|| {
            ParameterError::Undecodable("the action has no UserParameters".to_string())
        })?;
        let decoded = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(ParameterError::Undecodable(format!(
                    "expected a JSON object, found {other}"
                )))
            }
            Err(e) => return Err(ParameterError::Undecodable(e.to_string())),
        };

        let mut missing = Vec::new();
        let mut field = |name: &'static str| match required(&decoded, name) {
            Some(value) => value,
            None => {
                missing.push(name);
                String::new()
            }
        };
        let params = UserParameters {
            input: field(INPUT_FIELD),
            file: field(FILE_FIELD),
            output: field(OUTPUT_FIELD),
        };
        if missing.is_empty() {
            Ok(params)
        } else {
            Err(ParameterError::MissingFields(missing))
        }
    }
}

fn required(decoded: &Map<String, Value>, name: &str) -> Option<String> {
    decoded
        .get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
