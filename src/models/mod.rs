// Typed entities, payload schemas and resource bindings
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::Id;

pub mod attachment;
pub mod branch;
pub mod district;
pub mod mosque;
pub mod user;
pub mod worker;

pub use attachment::{Attachment, Attachments};
pub use branch::{Branch, BranchOption, Branches, CreateBranch, UpdateBranch};
pub use district::{CreateDistrict, District, Districts, UpdateDistrict};
pub use mosque::{CreateMosque, Mosque, MosqueTypeTag, Mosques, UpdateMosque};
pub use user::{CreateUser, UpdateUser, User, Users, ROLE_VALUES};
pub use worker::{CreateWorker, UpdateWorker, WithPhoto, Worker, Workers};

/// Nested related record (`branch`, `district`, `mosque`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Related {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub district_id: Option<Id>,
}

/// Booleans arrive as `true`, `1` or `"1"`
pub(crate) fn flex_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Bool(b)) => Some(b),
        Some(Raw::Int(n)) => Some(n != 0),
        Some(Raw::Text(s)) => match s.trim() {
            "" => None,
            "1" | "true" => Some(true),
            "0" | "false" => Some(false),
            other => return Err(D::Error::custom(format!("invalid boolean '{}'", other))),
        },
    })
}

/// Free text that the backend sometimes sends as a number (coordinates, timestamps)
pub(crate) fn flex_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => return Err(D::Error::custom(format!("expected text, got {}", other))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Flags {
        #[serde(default, deserialize_with = "flex_bool")]
        on: Option<bool>,
        #[serde(default, deserialize_with = "flex_text")]
        lat: Option<String>,
    }

    #[test]
    fn flexible_scalars() {
        let f: Flags = serde_json::from_value(json!({"on": 1, "lat": 31.5})).unwrap();
        assert_eq!(f.on, Some(true));
        assert_eq!(f.lat.as_deref(), Some("31.5"));

        let f: Flags = serde_json::from_value(json!({"on": "0"})).unwrap();
        assert_eq!(f.on, Some(false));
        assert_eq!(f.lat, None);

        assert!(serde_json::from_value::<Flags>(json!({"on": "maybe"})).is_err());
    }
}
