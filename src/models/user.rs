use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{flex_bool, Related};
use crate::auth::{extract_role_name, RoleName};
use crate::error::ClientError;
use crate::resource::{spec, Checks, Payload, Resource, ResourceSpec};
use crate::types::Id;

pub const ROLE_VALUES: [&str; 4] = ["system_administrator", "supervisor", "branch_manager", "field_committee"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub roles: Value,
    #[serde(default, deserialize_with = "flex_bool")]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub branch: Option<Related>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl User {
    pub fn role_name(&self) -> Option<RoleName> {
        extract_role_name(&self.roles).or_else(|| self.role.as_deref().and_then(RoleName::parse))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    pub branch_id: Option<Id>,
}

impl Payload for CreateUser {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .min_len("username", &self.username, 3)
            .min_len("password", &self.password, 6)
            .min_len("name", &self.name, 2)
            .required_text("role", &self.role)
            .one_of("role", Some(self.role.as_str()), &ROLE_VALUES)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "flex_bool")]
    pub is_active: Option<bool>,
    pub branch_id: Option<Id>,
}

impl Payload for UpdateUser {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .min_len_opt("username", self.username.as_deref(), 3)
            .min_len_opt("name", self.name.as_deref(), 2)
            .min_len_opt("password", self.password.as_deref(), 6)
            .one_of("role", self.role.as_deref(), &ROLE_VALUES)
            .finish()
    }
}

pub struct Users;

impl Resource for Users {
    type Entity = User;
    type Create = CreateUser;
    type Update = UpdateUser;

    const SPEC: &'static ResourceSpec = &spec::USERS;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::payload::encode;
    use crate::resource::BodyEncoding;
    use crate::transport::RequestBody;
    use serde_json::json;

    #[test]
    fn create_requires_known_role() {
        let dto = CreateUser {
            username: "omar".into(),
            password: "secret1".into(),
            name: "Omar".into(),
            role: "janitor".into(),
            branch_id: None,
        };
        let err = dto.validate().unwrap_err();
        assert!(err.display_message("x").starts_with("Role must be one of"));
    }

    #[test]
    fn update_sends_only_changed_fields() {
        let dto: UpdateUser = serde_json::from_value(json!({"name": "Omar", "password": "", "is_active": "0"})).unwrap();
        dto.validate().unwrap();
        let RequestBody::Form(mut fields) = encode(&dto, BodyEncoding::FormUrlEncoded).unwrap() else {
            panic!("expected form body");
        };
        fields.sort();
        assert_eq!(fields, vec![("is_active".to_string(), "0".to_string()), ("name".to_string(), "Omar".to_string())]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(serde_json::from_value::<UpdateUser>(json!({"nickname": "x"})).is_err());
    }

    #[test]
    fn role_read_from_roles_or_role() {
        let user: User = serde_json::from_value(json!({"id": 1, "roles": [{"name": "supervisor"}]})).unwrap();
        assert_eq!(user.role_name(), Some(RoleName::Supervisor));
        let user: User = serde_json::from_value(json!({"id": 2, "role": "field_committee"})).unwrap();
        assert_eq!(user.role_name(), Some(RoleName::FieldCommittee));
    }
}
