use std::collections::BTreeMap;

use super::types::{FilterValue, MapperRules};

pub struct FilterWhere;

impl FilterWhere {
    /// Map logical filters to `filter[<field>]` parameters.
    ///
    /// Unset values are omitted entirely; `filter[x]=` is never emitted.
    /// Multi-value filters become one comma-joined value under a single key.
    pub fn generate(filters: &BTreeMap<String, FilterValue>, rules: &MapperRules) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (name, value) in filters {
            let Some(field) = rules.filter_field(name) else {
                tracing::debug!("Filter '{}' has no backend field for this resource, ignoring", name);
                continue;
            };
            if let Some(encoded) = Self::encode_value(value) {
                out.push((format!("filter[{}]", field), encoded));
            }
        }
        out
    }

    fn encode_value(value: &FilterValue) -> Option<String> {
        match value {
            FilterValue::Text(s) if s.is_empty() => None,
            FilterValue::Text(s) => Some(s.clone()),
            FilterValue::Many(values) => {
                let kept: Vec<&str> = values.iter().map(String::as_str).filter(|v| !v.is_empty()).collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(kept.join(","))
                }
            }
        }
    }
}
