use clap::Subcommand;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::cli::config::load_state;
use crate::cli::utils::{build_query, failure, output_rows, output_success, output_value, read_stdin_json, read_upload};
use crate::cli::OutputFormat;
use crate::models::{CreateWorker, UpdateWorker, WithPhoto};
use crate::registry::{Mutation, Registry};
use crate::resource::Payload;
use crate::types::Id;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records of a resource")]
    List {
        #[arg(help = "Resource key (users, branches, districts, mosques, workers, mosque-attachments)")]
        resource: String,
        #[arg(long, help = "Page number (1-based)")]
        page: Option<u32>,
        #[arg(long, help = "Rows per page")]
        page_size: Option<u32>,
        #[arg(long, help = "Sort column, prefix with - for descending")]
        sort: Option<String>,
        #[arg(long = "filter", help = "Filter as name=value (repeatable; a,b for several values)")]
        filters: Vec<String>,
    },

    #[command(about = "Show one record")]
    Get {
        #[arg(help = "Resource key")]
        resource: String,
        #[arg(help = "Record ID")]
        id: String,
    },

    #[command(about = "Create record from stdin")]
    Create {
        #[arg(help = "Resource key")]
        resource: String,
        #[arg(long, help = "Photo to upload (workers only)")]
        photo: Option<PathBuf>,
    },

    #[command(about = "Update record from stdin")]
    Update {
        #[arg(help = "Resource key")]
        resource: String,
        #[arg(help = "Record ID to update")]
        id: String,
        #[arg(long, help = "Photo to upload (workers only)")]
        photo: Option<PathBuf>,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Resource key")]
        resource: String,
        #[arg(help = "Record ID to delete")]
        id: String,
    },
}

/// Decode stdin into a worker payload and attach the photo
fn worker_payload<P: DeserializeOwned + WithPhoto + Payload>(body: Value, photo: &Path) -> anyhow::Result<P> {
    let mut payload: P = serde_json::from_value(body).map_err(|e| anyhow::anyhow!("Invalid workers payload: {}", e))?;
    payload.set_photo(read_upload(photo)?);
    Ok(payload)
}

fn photo_only_for_workers(resource: &str, photo: &Option<PathBuf>) -> anyhow::Result<()> {
    if photo.is_some() && resource != "workers" {
        return Err(anyhow::anyhow!("--photo is only supported for workers"));
    }
    Ok(())
}

async fn create(registry: &Registry, resource: &str, body: Value, photo: Option<PathBuf>) -> anyhow::Result<Value> {
    photo_only_for_workers(resource, &photo)?;
    match photo {
        Some(path) => {
            let payload: CreateWorker = worker_payload(body, &path)?;
            let worker = registry.workers().create(&payload).await.map_err(|e| failure(e, "Create failed"))?;
            Ok(serde_json::to_value(worker)?)
        }
        None => registry
            .mutate(resource, Mutation::Create(body))
            .await
            .map_err(|e| failure(e, "Create failed")),
    }
}

async fn update(registry: &Registry, resource: &str, id: Id, body: Value, photo: Option<PathBuf>) -> anyhow::Result<Value> {
    photo_only_for_workers(resource, &photo)?;
    match photo {
        Some(path) => {
            let payload: UpdateWorker = worker_payload(body, &path)?;
            let worker = registry.workers().update(id, &payload).await.map_err(|e| failure(e, "Update failed"))?;
            Ok(serde_json::to_value(worker)?)
        }
        None => registry
            .mutate(resource, Mutation::Update(id, body))
            .await
            .map_err(|e| failure(e, "Update failed")),
    }
}

pub async fn handle(cmd: DataCommands, output_format: &OutputFormat) -> anyhow::Result<()> {
    let registry = load_state()?.registry()?;

    match cmd {
        DataCommands::List { resource, page, page_size, sort, filters } => {
            let query = build_query(page, page_size, sort.as_deref(), &filters)?;
            let result = registry
                .fetch_list(&resource, &query)
                .await
                .map_err(|e| failure(e, "Could not load records"))?;
            output_rows(output_format, &result.items, result.total, result.page_info.page)
        }
        DataCommands::Get { resource, id } => {
            let record = registry
                .fetch_one(&resource, id)
                .await
                .map_err(|e| failure(e, "Could not load record"))?;
            output_value(output_format, &record)
        }
        DataCommands::Create { resource, photo } => {
            let body = read_stdin_json()?;
            let created = create(&registry, &resource, body, photo).await?;
            let id = created.get("id").cloned().unwrap_or(Value::Null);
            output_success(output_format, &format!("Created {} {}", resource, id), Some(json!({ "data": created })))
        }
        DataCommands::Update { resource, id, photo } => {
            let body = read_stdin_json()?;
            let updated = update(&registry, &resource, Id::new(id.as_str()), body, photo).await?;
            output_success(output_format, &format!("Updated {} {}", resource, id), Some(json!({ "data": updated })))
        }
        DataCommands::Delete { resource, id } => {
            registry
                .mutate(&resource, Mutation::Delete(Id::new(id.as_str())))
                .await
                .map_err(|e| failure(e, "Delete failed"))?;
            output_success(output_format, &format!("Deleted {} {}", resource, id), None)
        }
    }
}
