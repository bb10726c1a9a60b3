use super::store::{AttributeValue, Item, RuleRecord};
use super::Category;

/// Rules written to an empty rules table: (name, category, pattern, weight, active).
const DEFAULT_RULES: [(&str, Category, &str, u64, bool); 4] = [
    (
        "IngressOpenToWorld",
        Category::NetworkIngress,
        r"^.*Ingress.*((0\.){3}0/0)",
        100,
        true,
    ),
    (
        "SSHOpenToWorld",
        Category::NetworkIngress,
        r"^.*Ingress.*(([fF]rom[pP]ort.?.?.?22)|([tT]o[pP]ort.?.?.?22)).*((0\.){3}0/0)",
        100,
        true,
    ),
    (
        "AllowHttp",
        Category::NetworkIngress,
        r"^.*Ingress.*[fF]rom[pP]ort.?.?.?80",
        3,
        false,
    ),
    (
        "ForbiddenAMIs",
        Category::ComputeInstance,
        r"^.*ImageId.*?(ami-7a11e211)|(ami-08111162)|(ami-f6035893)",
        10,
        false,
    ),
];

pub fn default_rule_names() -> impl Iterator<Item = &'static str> {
    DEFAULT_RULES.iter().map(|(name, ..)| *name)
}

pub fn default_records() -> Vec<RuleRecord> {
    DEFAULT_RULES
        .iter()
        .map(|(name, category, pattern, weight, active)| RuleRecord {
            name: name.to_string(),
            category: category.store_name().to_string(),
            rule_type: super::store::REGEX_RULE_TYPE.to_string(),
            pattern: pattern.to_string(),
            weight: *weight,
            active: *active,
        })
        .collect()
}

pub fn default_items() -> Vec<Item> {
    default_records().iter().map(RuleRecord::to_item).collect()
}
