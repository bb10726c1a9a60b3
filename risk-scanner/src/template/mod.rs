mod yaml;

use log::{debug, trace};
use serde_json::Value;

use crate::rules::errors::Error;
use crate::rules::{Category, Result};

/// A resource declaration taken from a template's `Resources` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    logical_id: String,
    resource_type: String,
    declaration: Value,
}

impl Resource {
    pub fn new(logical_id: impl Into<String>, resource_type: impl Into<String>, declaration: Value) -> Self {
        Resource {
            logical_id: logical_id.into(),
            resource_type: resource_type.into(),
            declaration,
        }
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn declaration(&self) -> &Value {
        &self.declaration
    }

    /// Compact JSON of the declaration, keys in document order. Rule patterns are
    /// matched against this text.
    pub fn serialized(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.declaration)?)
    }
}

/// Template resources partitioned by rule category. Resources of any other type are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBuckets {
    pub ingress: Vec<Resource>,
    pub instances: Vec<Resource>,
}

impl ResourceBuckets {
    pub fn bucket(&self, category: Category) -> &[Resource] {
        match category {
            Category::NetworkIngress => &self.ingress,
            Category::ComputeInstance => &self.instances,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<Resource> {
        match category {
            Category::NetworkIngress => &mut self.ingress,
            Category::ComputeInstance => &mut self.instances,
        }
    }

    pub fn len(&self) -> usize {
        self.ingress.len() + self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses template text as JSON, falling back to YAML with short-form intrinsic functions.
pub fn parse_template(content: &str) -> Result<Value> {
    match serde_json::from_str::<Value>(content) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            trace!("Template is not JSON ({}), trying YAML", json_err);
            let document = serde_yaml::from_str::<serde_yaml::Value>(content).map_err(|yaml_err| {
                Error::MalformedTemplate(format!(
                    "template was unreadable as json ({json_err}) or yaml ({yaml_err})"
                ))
            })?;
            yaml::to_json(document)
        }
    }
}

pub fn extract(template: &Value) -> Result<ResourceBuckets> {
    let resources = template
        .get("Resources")
        .ok_or_else(|| {
            Error::MalformedTemplate("template does not contain a [Resources] section".to_string())
        })?
        .as_object()
        .ok_or_else(|| Error::MalformedTemplate("[Resources] section is not a map".to_string()))?;

    let mut buckets = ResourceBuckets::default();
    for (logical_id, declaration) in resources {
        let resource_type = declaration
            .get("Type")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::MalformedTemplate(format!("resource [{logical_id}] has no string Type"))
            })?;
        match Category::ALL
            .into_iter()
            .find(|category| resource_type.contains(category.type_marker()))
        {
            Some(category) => {
                trace!("[{}] of type {} goes to {}", logical_id, resource_type, category);
                buckets
                    .bucket_mut(category)
                    .push(Resource::new(logical_id.clone(), resource_type, declaration.clone()));
            }
            None => trace!("[{}] of type {} is not scanned", logical_id, resource_type),
        }
    }
    debug!(
        "Extracted {} ingress and {} instance resource(s) from {} declaration(s)",
        buckets.ingress.len(),
        buckets.instances.len(),
        resources.len()
    );
    Ok(buckets)
}
