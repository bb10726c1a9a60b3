use log::{debug, info, trace};
use serde::Serialize;

use super::{Category, Result, RuleSet};
use crate::template::ResourceBuckets;

/// One (resource, rule) pair where an active rule matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule: String,
    pub resource: String,
    pub category: Category,
    pub weight: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub risk_score: u64,
    pub violated_rules: Vec<String>,
    pub findings: Vec<Finding>,
}

impl EvaluationResult {
    fn record(&mut self, finding: Finding) {
        self.risk_score = self.risk_score.saturating_add(finding.weight);
        self.violated_rules.push(finding.rule.clone());
        self.findings.push(finding);
    }
}

/// Scores every resource against every active rule of its category.
///
/// Buckets are visited ingress first, then instances; within a bucket iteration is
/// resource-major, rule-minor, which fixes the order of `violated_rules`. Every matching
/// pair adds its weight, so a rule that matches three resources counts three times.
pub fn evaluate(rules: &RuleSet, resources: &ResourceBuckets) -> Result<EvaluationResult> {
    let mut result = EvaluationResult::default();
    for category in Category::ALL {
        let active = rules
            .rules_for(category)
            .iter()
            .filter(|rule| rule.is_active())
            .collect::<Vec<_>>();
        for resource in resources.bucket(category) {
            let serialized = resource.serialized()?;
            trace!("Checking [{}] as {}", resource.logical_id(), serialized);
            for rule in &active {
                if rule.matches(&serialized)? {
                    debug!(
                        "Rule {} matched [{}], adding {}",
                        rule.name(),
                        resource.logical_id(),
                        rule.weight()
                    );
                    result.record(Finding {
                        rule: rule.name().to_string(),
                        resource: resource.logical_id().to_string(),
                        category,
                        weight: rule.weight(),
                    });
                }
            }
        }
    }
    info!(
        "Evaluation finished with risk score {} and {} violation(s)",
        result.risk_score,
        result.violated_rules.len()
    );
    Ok(result)
}

#[cfg(test)]
#[path = "evaluate_tests.rs"]
mod evaluate_tests;
