use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::resource::{spec, Checks, Payload, Resource, ResourceSpec};
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Entry of the short `?list=1` branch listing used by pickers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchOption {
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateBranch {
    #[serde(default)]
    pub name: String,
}

impl Payload for CreateBranch {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new().min_len("name", &self.name, 2).finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateBranch {
    pub name: Option<String>,
}

impl Payload for UpdateBranch {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new().min_len_opt("name", self.name.as_deref(), 2).finish()
    }
}

pub struct Branches;

impl Resource for Branches {
    type Entity = Branch;
    type Create = CreateBranch;
    type Update = UpdateBranch;

    const SPEC: &'static ResourceSpec = &spec::BRANCHES;
}
