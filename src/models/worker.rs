use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{flex_text, Related};
use crate::error::ClientError;
use crate::resource::{spec, Checks, Payload, Resource, ResourceSpec};
use crate::transport::Upload;
use crate::types::Id;

/// Multipart key of the worker photo
const PHOTO_FIELD: &str = "image";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mosque_id: Option<Id>,
    #[serde(default)]
    pub branch_id: Option<Id>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub job_status: Option<String>,
    #[serde(default, alias = "sponsorship_type")]
    pub sponsorship_types: Option<String>,
    #[serde(default)]
    pub educational_level: Option<String>,
    #[serde(default, alias = "quran_level")]
    pub quran_levels: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub salary: Option<Decimal>,
    /// Photo URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub mosque: Option<Related>,
    #[serde(default, deserialize_with = "flex_text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateWorker {
    pub branch_id: Option<Id>,
    pub mosque_id: Option<Id>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub job_title: String,
    pub job_status: Option<String>,
    pub sponsorship_types: Option<String>,
    pub educational_level: Option<String>,
    #[serde(default)]
    pub quran_levels: String,
    pub phone: Option<String>,
    pub salary: Option<Decimal>,
    #[serde(skip)]
    pub photo: Option<Upload>,
}

impl Payload for CreateWorker {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .required("branch_id", self.branch_id.as_ref().filter(|id| !id.is_empty()))
            .required("mosque_id", self.mosque_id.as_ref().filter(|id| !id.is_empty()))
            .min_len("name", &self.name, 2)
            .required_text("job_title", &self.job_title)
            .required_text("quran_levels", &self.quran_levels)
            .positive("salary", self.salary)
            .finish()
    }

    fn uploads(&self) -> Vec<(String, Upload)> {
        self.photo.iter().map(|p| (PHOTO_FIELD.to_string(), p.clone())).collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateWorker {
    pub branch_id: Option<Id>,
    pub mosque_id: Option<Id>,
    pub name: Option<String>,
    pub job_title: Option<String>,
    pub job_status: Option<String>,
    pub sponsorship_types: Option<String>,
    pub educational_level: Option<String>,
    pub quran_levels: Option<String>,
    pub phone: Option<String>,
    pub salary: Option<Decimal>,
    #[serde(skip)]
    pub photo: Option<Upload>,
}

impl Payload for UpdateWorker {
    fn validate(&self) -> Result<(), ClientError> {
        Checks::new()
            .min_len_opt("name", self.name.as_deref(), 2)
            .positive("salary", self.salary)
            .finish()
    }

    fn uploads(&self) -> Vec<(String, Upload)> {
        self.photo.iter().map(|p| (PHOTO_FIELD.to_string(), p.clone())).collect()
    }
}

/// Attach a photo to a worker payload
pub trait WithPhoto {
    fn set_photo(&mut self, photo: Upload);
}

impl WithPhoto for CreateWorker {
    fn set_photo(&mut self, photo: Upload) {
        self.photo = Some(photo);
    }
}

impl WithPhoto for UpdateWorker {
    fn set_photo(&mut self, photo: Upload) {
        self.photo = Some(photo);
    }
}

pub struct Workers;

impl Resource for Workers {
    type Entity = Worker;
    type Create = CreateWorker;
    type Update = UpdateWorker;

    const SPEC: &'static ResourceSpec = &spec::WORKERS;
}
