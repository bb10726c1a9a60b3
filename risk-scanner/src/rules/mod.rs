pub mod defaults;
pub mod errors;
pub mod evaluate;
pub mod store;

use std::fmt::Formatter;

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};

use errors::Error;

pub type Result<R> = std::result::Result<R, Error>;

/// The resource bucket a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    NetworkIngress,
    ComputeInstance,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::NetworkIngress, Category::ComputeInstance];

    /// Value of the `category` attribute in the rules table.
    pub fn store_name(&self) -> &'static str {
        match self {
            Category::NetworkIngress => "SecurityGroup",
            Category::ComputeInstance => "EC2Instance",
        }
    }

    pub fn from_store_name(name: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|category| category.store_name() == name)
    }

    /// Substring of a resource `Type` that places it in this bucket.
    pub fn type_marker(&self) -> &'static str {
        match self {
            // Covers security groups with inline `SecurityGroupIngress` rules as well as
            // standalone `SecurityGroupIngress` resources.
            Category::NetworkIngress => "EC2::SecurityGroup",
            Category::ComputeInstance => "EC2::Instance",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.store_name())
    }
}

/// A risk rule as loaded from the rules table. The pattern is compiled once when the
/// record is decoded and the rule is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    category: Category,
    pattern: Regex,
    weight: u64,
    active: bool,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        pattern: &str,
        weight: u64,
        active: bool,
    ) -> Result<Rule> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| Error::InvalidRule {
            name: name.clone(),
            reason: format!("pattern does not compile: {e}"),
        })?;
        Ok(Rule {
            name,
            category,
            pattern,
            weight,
            active,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True when the pattern matches a prefix of `text`, i.e. a match that begins at
    /// offset 0. The leftmost match starts at 0 whenever any match there exists.
    pub fn matches(&self, text: &str) -> Result<bool> {
        Ok(self
            .pattern
            .find(text)?
            .map_or(false, |found| found.start() == 0))
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.category == other.category
            && self.pattern() == other.pattern()
            && self.weight == other.weight
            && self.active == other.active
    }
}

/// Snapshot of the rules table for one evaluation pass, partitioned by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub ingress_rules: Vec<Rule>,
    pub instance_rules: Vec<Rule>,
}

impl RuleSet {
    pub fn rules_for(&self, category: Category) -> &[Rule] {
        match category {
            Category::NetworkIngress => &self.ingress_rules,
            Category::ComputeInstance => &self.instance_rules,
        }
    }

    pub fn len(&self) -> usize {
        self.ingress_rules.len() + self.instance_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<T: IntoIterator<Item = Rule>>(iter: T) -> Self {
        let mut rule_set = RuleSet::default();
        for rule in iter {
            match rule.category {
                Category::NetworkIngress => rule_set.ingress_rules.push(rule),
                Category::ComputeInstance => rule_set.instance_rules.push(rule),
            }
        }
        rule_set
    }
}
