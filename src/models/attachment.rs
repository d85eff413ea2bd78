use serde::{Deserialize, Serialize};

use crate::resource::{spec, NoPayload, Resource, ResourceSpec};
use crate::types::Id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Id,
    #[serde(default)]
    pub mosque_id: Option<Id>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

pub struct Attachments;

impl Resource for Attachments {
    type Entity = Attachment;
    type Create = NoPayload;
    type Update = NoPayload;

    const SPEC: &'static ResourceSpec = &spec::ATTACHMENTS;
}
