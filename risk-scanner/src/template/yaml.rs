use std::collections::HashMap;

use lazy_static::lazy_static;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as YamlValue;

use crate::rules::errors::Error;
use crate::rules::Result;

lazy_static! {
    static ref SHORT_FORM_TO_LONG_MAPPING: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("Ref", "Ref");
        m.insert("Condition", "Condition");
        m.insert("GetAtt", "Fn::GetAtt");
        m.insert("Base64", "Fn::Base64");
        m.insert("Sub", "Fn::Sub");
        m.insert("GetAZs", "Fn::GetAZs");
        m.insert("ImportValue", "Fn::ImportValue");
        m.insert("Select", "Fn::Select");
        m.insert("Split", "Fn::Split");
        m.insert("Join", "Fn::Join");
        m.insert("FindInMap", "Fn::FindInMap");
        m.insert("Cidr", "Fn::Cidr");
        m.insert("And", "Fn::And");
        m.insert("Equals", "Fn::Equals");
        m.insert("If", "Fn::If");
        m.insert("Not", "Fn::Not");
        m.insert("Or", "Fn::Or");
        m
    };
}

fn short_form_to_long(tag: &str) -> String {
    match SHORT_FORM_TO_LONG_MAPPING.get(tag) {
        Some(long) => long.to_string(),
        None => format!("Fn::{tag}"),
    }
}

/// Converts a YAML document into JSON, rewriting CloudFormation short-form intrinsic
/// functions (`!Ref x`) into their long form (`{"Ref": "x"}`).
pub(crate) fn to_json(value: YamlValue) -> Result<Value> {
    Ok(match value {
        YamlValue::Null => Value::Null,
        YamlValue::Bool(b) => Value::Bool(b),
        YamlValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                match n.as_f64().and_then(Number::from_f64) {
                    Some(f) => Value::Number(f),
                    None => Value::String(n.to_string()),
                }
            }
        }
        YamlValue::String(s) => Value::String(s),
        YamlValue::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(to_json)
                .collect::<Result<Vec<Value>>>()?,
        ),
        YamlValue::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (key, value) in mapping {
                map.insert(key_to_string(key)?, to_json(value)?);
            }
            Value::Object(map)
        }
        YamlValue::Tagged(tagged) => {
            let tag = tagged.tag.to_string();
            let function = short_form_to_long(tag.trim_start_matches('!'));
            let argument = match (function.as_str(), tagged.value) {
                ("Fn::GetAtt", YamlValue::String(dotted)) => match dotted.split_once('.') {
                    Some((resource, attribute)) => Value::Array(vec![
                        Value::String(resource.to_string()),
                        Value::String(attribute.to_string()),
                    ]),
                    None => Value::String(dotted),
                },
                (_, value) => to_json(value)?,
            };
            let mut map = Map::with_capacity(1);
            map.insert(function, argument);
            Value::Object(map)
        }
    })
}

fn key_to_string(key: YamlValue) -> Result<String> {
    match key {
        YamlValue::String(s) => Ok(s),
        YamlValue::Number(n) => Ok(n.to_string()),
        YamlValue::Bool(b) => Ok(b.to_string()),
        YamlValue::Null => Ok("null".to_string()),
        other => Err(Error::MalformedTemplate(format!(
            "mapping key {other:?} is not a scalar"
        ))),
    }
}
