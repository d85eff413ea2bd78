//! Shared types used across the codebase

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Mutations supported by the resource clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

/// Backend record identifier.
///
/// The API hands ids out as numbers but accepts them as strings in paths and
/// form bodies, so the canonical form is the string. Numeric ids serialize back
/// to JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(String);

impl Id {
    pub fn new(value: impl Into<String>) -> Self {
        Id(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Id(value.to_string())
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Id(value.to_string())
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Id(value.to_string())
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Id::new(value)
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Id::new(value)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(n) => serializer.serialize_i64(n),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Id::from(n),
            Raw::Float(f) => Id(f.to_string()),
            Raw::Text(s) => Id::new(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_accepts_numbers_and_strings() {
        let a: Id = serde_json::from_value(json!(7)).unwrap();
        let b: Id = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(&a).unwrap(), json!(7));
    }

    #[test]
    fn non_numeric_id_stays_a_string() {
        let id = Id::from("abc");
        assert_eq!(serde_json::to_value(&id).unwrap(), json!("abc"));
        assert_eq!(id.as_i64(), None);
    }
}
