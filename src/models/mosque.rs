use serde::{Deserialize, Serialize};

use super::{flex_bool, flex_text, Related};
use crate::error::ClientError;
use crate::resource::{spec, Checks, Payload, Resource, ResourceSpec};
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosqueTypeTag {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mosque {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub district_id: Option<Id>,
    #[serde(default, alias = "cirty_or_village")]
    pub city_or_village: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub current_status: Option<String>,
    #[serde(default)]
    pub technical_status: Option<String>,
    #[serde(default)]
    pub mosque_attachments: Option<String>,
    #[serde(default)]
    pub demolition_percentage: Option<String>,
    #[serde(default)]
    pub destruction_status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub support_friday: Option<bool>,
    #[serde(default, deserialize_with = "flex_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "flex_text")]
    pub longitude: Option<String>,
    #[serde(default)]
    pub branch: Option<Related>,
    #[serde(default)]
    pub district: Option<Related>,
    #[serde(default)]
    pub types: Vec<MosqueTypeTag>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Mosque {
    pub fn type_names(&self) -> Vec<&str> {
        self.types.iter().map(|t| t.kind.as_str()).collect()
    }
}

/// Fields shared by create and update; the backend spells the city key
/// `cirty_or_village`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMosque {
    pub branch_id: Option<Id>,
    pub district_id: Option<Id>,
    #[serde(default)]
    pub name: String,
    #[serde(rename(serialize = "cirty_or_village"), alias = "cirty_or_village")]
    pub city_or_village: Option<String>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub support_friday: Option<bool>,
    pub category: Option<String>,
    pub current_status: Option<String>,
    pub technical_status: Option<String>,
    pub mosque_attachments: Option<String>,
    pub demolition_percentage: Option<String>,
    pub destruction_status: Option<String>,
    #[serde(default, deserialize_with = "flex_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "flex_text")]
    pub longitude: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Payload for CreateMosque {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .required("branch_id", self.branch_id.as_ref().filter(|id| !id.is_empty()))
            .required("district_id", self.district_id.as_ref().filter(|id| !id.is_empty()))
            .min_len("name", &self.name, 2)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMosque {
    pub branch_id: Option<Id>,
    pub district_id: Option<Id>,
    pub name: Option<String>,
    #[serde(rename(serialize = "cirty_or_village"), alias = "cirty_or_village")]
    pub city_or_village: Option<String>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub support_friday: Option<bool>,
    pub category: Option<String>,
    pub current_status: Option<String>,
    pub technical_status: Option<String>,
    pub mosque_attachments: Option<String>,
    pub demolition_percentage: Option<String>,
    pub destruction_status: Option<String>,
    #[serde(default, deserialize_with = "flex_text")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "flex_text")]
    pub longitude: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl Payload for UpdateMosque {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new().min_len_opt("name", self.name.as_deref(), 2).finish()
    }
}

pub struct Mosques;

impl Resource for Mosques {
    type Entity = Mosque;
    type Create = CreateMosque;
    type Update = UpdateMosque;

    const SPEC: &'static ResourceSpec = &spec::MOSQUES;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::payload::encode;
    use crate::resource::BodyEncoding;
    use crate::transport::RequestBody;
    use serde_json::json;

    #[test]
    fn create_form_matches_backend_contract() {
        let dto: CreateMosque = serde_json::from_value(json!({
            "branch_id": 1,
            "district_id": "2",
            "name": "Mosque of Light",
            "city_or_village": "Riverside",
            "is_active": true,
            "support_friday": 0,
            "types": ["jami", "musalla"],
            "latitude": 31.77
        }))
        .unwrap();
        dto.validate().unwrap();

        let RequestBody::Form(fields) = encode(&dto, BodyEncoding::FormUrlEncoded).unwrap() else {
            panic!("expected form body");
        };
        let has = |k: &str, v: &str| fields.contains(&(k.to_string(), v.to_string()));
        assert!(has("branch_id", "1"));
        assert!(has("district_id", "2"));
        assert!(has("cirty_or_village", "Riverside"));
        assert!(has("is_active", "1"));
        assert!(has("support_friday", "0"));
        assert!(has("types[]", "jami"));
        assert!(has("types[]", "musalla"));
        assert!(has("latitude", "31.77"));
        assert!(!fields.iter().any(|(k, _)| k == "category" || k == "city_or_village"));
    }

    #[test]
    fn create_requires_hierarchy() {
        let err = CreateMosque { name: "Light".into(), ..Default::default() }.validate().unwrap_err();
        match err {
            ClientError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("branch_id"));
                assert!(field_errors.contains_key("district_id"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn entity_reads_type_tags() {
        let mosque: Mosque = serde_json::from_value(json!({
            "id": 5, "name": "Light", "is_active": 1,
            "types": [{"id": 1, "mosque_id": 5, "type": "jami"}],
            "branch": {"id": 1, "name": "North"}
        }))
        .unwrap();
        assert_eq!(mosque.type_names(), vec!["jami"]);
        assert_eq!(mosque.is_active, Some(true));
        assert_eq!(mosque.branch.unwrap().name, "North");
    }
}
