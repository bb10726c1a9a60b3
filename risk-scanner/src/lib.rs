// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod pipeline;
pub mod rules;
pub mod template;
pub mod utils;

pub use crate::config::ScannerConfig;
pub use crate::pipeline::job::{CodePipelineEvent, Job};
pub use crate::pipeline::{ArtifactStore, JobReporter, Outcome, PipelineScanner};
pub use crate::rules::errors::{Error, ParameterError};
pub use crate::rules::evaluate::{evaluate, EvaluationResult, Finding};
pub use crate::rules::store::{AttributeValue, Item, KeyValueStore, RuleStoreAccessor};
pub use crate::rules::{Category, Result, Rule, RuleSet};
pub use crate::template::{extract, parse_template, Resource, ResourceBuckets};

/// Scores template text against an already loaded rule set.
pub fn scan_template(content: &str, rules: &RuleSet) -> Result<EvaluationResult> {
    let document = parse_template(content)?;
    evaluate(rules, &extract(&document)?)
}
