use serde::{Deserialize, Serialize};

use super::Related;
use crate::error::ClientError;
use crate::resource::{spec, Checks, Payload, Resource, ResourceSpec};
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub branch: Option<Related>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateDistrict {
    #[serde(default)]
    pub name: String,
    pub branch_id: Option<Id>,
    pub code: Option<String>,
}

impl Payload for CreateDistrict {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .min_len("name", &self.name, 2)
            .required("branch_id", self.branch_id.as_ref().filter(|id| !id.is_empty()))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateDistrict {
    pub name: Option<String>,
    pub branch_id: Option<Id>,
    pub code: Option<String>,
}

impl Payload for UpdateDistrict {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new().min_len_opt("name", self.name.as_deref(), 2).finish()
    }
}

pub struct Districts;

impl Resource for Districts {
    type Entity = District;
    type Create = CreateDistrict;
    type Update = UpdateDistrict;

    const SPEC: &'static ResourceSpec = &spec::DISTRICTS;
}
