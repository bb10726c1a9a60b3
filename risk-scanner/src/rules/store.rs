use std::collections::HashMap;
use std::convert::TryFrom;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, trace, warn};

use super::defaults;
use super::errors::Error;
use super::{Category, Result, Rule, RuleSet};
use crate::utils::retry::{retry_with_backoff, RetryPolicy};

pub const KEY_ATTRIBUTE: &str = "rule";
pub const REGEX_RULE_TYPE: &str = "regex";

const CATEGORY_ATTRIBUTE: &str = "category";
const RULE_TYPE_ATTRIBUTE: &str = "ruleType";
const PATTERN_ATTRIBUTE: &str = "ruleData";
const WEIGHT_ATTRIBUTE: &str = "riskValue";
const ACTIVE_ATTRIBUTE: &str = "active";

/// The attribute value shapes the rules table uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    N(String),
    Bool(bool),
}

pub type Item = HashMap<String, AttributeValue>;

/// Key-value table capability backing the rule store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn list_tables(&self) -> Result<Vec<String>>;

    async fn scan(&self, table: &str) -> Result<Vec<Item>>;

    /// Strongly consistent read of a single item.
    async fn get_item(&self, table: &str, key_attribute: &str, key: &str) -> Result<Option<Item>>;

    /// Writes `item` unless an item with the same key exists. Returns `false` when the
    /// write was skipped because of an existing item.
    async fn put_item_if_absent(&self, table: &str, key_attribute: &str, item: Item)
        -> Result<bool>;
}

/// A rules table item decoded into typed fields, before its pattern is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRecord {
    pub name: String,
    pub category: String,
    pub rule_type: String,
    pub pattern: String,
    pub weight: u64,
    pub active: bool,
}

impl RuleRecord {
    pub fn from_item(item: &Item) -> Result<RuleRecord> {
        let name = match item.get(KEY_ATTRIBUTE) {
            Some(AttributeValue::S(name)) => name.clone(),
            _ => {
                return Err(Error::InvalidRule {
                    name: "<unnamed>".to_string(),
                    reason: format!("missing string attribute `{KEY_ATTRIBUTE}`"),
                })
            }
        };
        let invalid = |reason: String| Error::InvalidRule {
            name: name.clone(),
            reason,
        };
        let string_attribute = |attribute: &str| match item.get(attribute) {
            Some(AttributeValue::S(value)) => Ok(value.clone()),
            _ => Err(invalid(format!("missing string attribute `{attribute}`"))),
        };

        let category = string_attribute(CATEGORY_ATTRIBUTE)?;
        let rule_type = string_attribute(RULE_TYPE_ATTRIBUTE)?;
        let pattern = string_attribute(PATTERN_ATTRIBUTE)?;
        let weight = match item.get(WEIGHT_ATTRIBUTE) {
            Some(AttributeValue::N(number)) | Some(AttributeValue::S(number)) => number
                .trim()
                .parse::<u64>()
                .map_err(|e| invalid(format!("`{WEIGHT_ATTRIBUTE}` is not a non-negative integer: {e}")))?,
            _ => return Err(invalid(format!("missing numeric attribute `{WEIGHT_ATTRIBUTE}`"))),
        };
        let active = match item.get(ACTIVE_ATTRIBUTE) {
            Some(AttributeValue::Bool(flag)) => *flag,
            Some(AttributeValue::S(flag)) => match flag.trim().to_ascii_uppercase().as_str() {
                "Y" | "TRUE" => true,
                "N" | "FALSE" => false,
                other => return Err(invalid(format!("`{ACTIVE_ATTRIBUTE}` flag `{other}` is not Y or N"))),
            },
            _ => return Err(invalid(format!("missing attribute `{ACTIVE_ATTRIBUTE}`"))),
        };

        Ok(RuleRecord {
            name,
            category,
            rule_type,
            pattern,
            weight,
            active,
        })
    }

    pub fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(KEY_ATTRIBUTE.to_string(), AttributeValue::S(self.name.clone()));
        item.insert(CATEGORY_ATTRIBUTE.to_string(), AttributeValue::S(self.category.clone()));
        item.insert(RULE_TYPE_ATTRIBUTE.to_string(), AttributeValue::S(self.rule_type.clone()));
        item.insert(PATTERN_ATTRIBUTE.to_string(), AttributeValue::S(self.pattern.clone()));
        item.insert(WEIGHT_ATTRIBUTE.to_string(), AttributeValue::N(self.weight.to_string()));
        let flag = if self.active { "Y" } else { "N" };
        item.insert(ACTIVE_ATTRIBUTE.to_string(), AttributeValue::S(flag.to_string()));
        item
    }
}

impl TryFrom<&RuleRecord> for Rule {
    type Error = Error;

    fn try_from(record: &RuleRecord) -> Result<Rule> {
        if record.rule_type != REGEX_RULE_TYPE {
            return Err(Error::InvalidRule {
                name: record.name.clone(),
                reason: format!("unsupported rule type `{}`", record.rule_type),
            });
        }
        let category =
            Category::from_store_name(&record.category).ok_or_else(|| Error::InvalidRule {
                name: record.name.clone(),
                reason: format!("unknown category `{}`", record.category),
            })?;
        Rule::new(
            record.name.clone(),
            category,
            &record.pattern,
            record.weight,
            record.active,
        )
    }
}

/// Loads the rule set from the rules table, bootstrapping the default rules into an
/// empty table.
pub struct RuleStoreAccessor<S> {
    store: S,
    table_marker: String,
    retry: RetryPolicy,
    bootstrap_settle: Duration,
}

impl<S: KeyValueStore> RuleStoreAccessor<S> {
    pub fn new(store: S, table_marker: impl Into<String>) -> Self {
        RuleStoreAccessor {
            store,
            table_marker: table_marker.into(),
            retry: RetryPolicy::default(),
            bootstrap_settle: Duration::from_secs(2),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_bootstrap_settle(mut self, settle: Duration) -> Self {
        self.bootstrap_settle = settle;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// First table, in listing order, whose name contains the configured marker.
    pub async fn locate_table(&self) -> Result<String> {
        let tables = retry_with_backoff(&self.retry, "list tables", || self.store.list_tables()).await?;
        trace!("Tables visible to the scanner: {:?}", tables);
        tables
            .into_iter()
            .find(|table| table.contains(&self.table_marker))
            .ok_or_else(|| {
                Error::StoreUnavailable(format!(
                    "no table with `{}` in its name was found",
                    self.table_marker
                ))
            })
    }

    pub async fn load_rules(&self) -> Result<RuleSet> {
        let table = self.locate_table().await?;
        info!("Loading risk rules from table {}", table);

        let mut items = self.scan(&table).await?;
        if items.is_empty() {
            let inserted = self.bootstrap_defaults(&table).await?;
            info!("Rules table {} was empty, bootstrapped {} default rule(s)", table, inserted);
            tokio::time::sleep(self.bootstrap_settle).await;
            items = self.scan(&table).await?;
            if items.is_empty() {
                warn!("Scan of {} still empty after bootstrap, reading defaults back by key", table);
                items = self.read_back_defaults(&table).await?;
            }
        }

        let rule_set = items
            .iter()
            .map(|item| RuleRecord::from_item(item).and_then(|record| Rule::try_from(&record)))
            .collect::<Result<RuleSet>>()?;
        debug!(
            "Loaded {} ingress rule(s) and {} instance rule(s)",
            rule_set.ingress_rules.len(),
            rule_set.instance_rules.len()
        );
        Ok(rule_set)
    }

    /// Writes the default rules with put-if-absent. Rules already present, for example
    /// written by a concurrent cold start, are left untouched. Returns the number written.
    pub async fn bootstrap_defaults(&self, table: &str) -> Result<usize> {
        let mut inserted = 0;
        for item in defaults::default_items() {
            let written = retry_with_backoff(&self.retry, "put default rule", || {
                self.store
                    .put_item_if_absent(table, KEY_ATTRIBUTE, item.clone())
            })
            .await?;
            if written {
                inserted += 1;
            } else {
                debug!("Default rule {:?} already present", item.get(KEY_ATTRIBUTE));
            }
        }
        Ok(inserted)
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>> {
        retry_with_backoff(&self.retry, "scan rules table", || self.store.scan(table)).await
    }

    async fn read_back_defaults(&self, table: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        for name in defaults::default_rule_names() {
            let item = retry_with_backoff(&self.retry, "get default rule", || {
                self.store.get_item(table, KEY_ATTRIBUTE, name)
            })
            .await?;
            items.extend(item);
        }
        Ok(items)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
