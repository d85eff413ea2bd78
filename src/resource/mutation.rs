// Mutation Coordinator: validate, encode, send, then invalidate
use serde_json::Value;

use super::client::ClientCore;
use super::payload::{encode, Payload};
use super::spec::ResourceSpec;
use crate::api::{ensure_success, item_data};
use crate::enums;
use crate::error::{ClientError, FieldErrors};
use crate::transport::{ApiRequest, Method};
use crate::types::{Id, Operation};

fn writable(spec: &ResourceSpec) -> Result<(), ClientError> {
    if spec.is_read_only() {
        return Err(ClientError::validation(
            format!("{} cannot be modified", spec.key),
            FieldErrors::new(),
        ));
    }
    Ok(())
}

fn required_id(id: &Id) -> Result<(), ClientError> {
    if id.is_empty() {
        return Err(ClientError::invalid_field("id", "Id is required"));
    }
    Ok(())
}

fn checked<P: Payload + ?Sized>(spec: &ResourceSpec, op: Operation, payload: &P) -> Result<(), ClientError> {
    writable(spec)?;
    payload.validate().map_err(|e| {
        tracing::error!("Rejected {} on {} before sending: {}", op.as_str(), spec.key, e);
        e
    })
}

/// Send a mutation and, on success, invalidate every list of the resource,
/// the detail entry of `id` and the enumerations the resource owns.
/// Mutations are never retried.
async fn execute(
    core: &ClientCore,
    spec: &ResourceSpec,
    op: Operation,
    id: Option<&Id>,
    request: ApiRequest,
) -> Result<Value, ClientError> {
    let outcome = core.transport.send(request).await.and_then(|response| {
        ensure_success(&response.body)?;
        Ok(response.body)
    });

    match outcome {
        Ok(body) => {
            let lists = core.cache.invalidate_lists(spec.key);
            if let Some(id) = id {
                core.cache.invalidate_detail(spec.key, id);
            }
            core.cache.invalidate_prefixed(&enums::cache_prefix(spec.key));
            tracing::info!("{} on {} succeeded, {} cached lists invalidated", op.as_str(), spec.key, lists);
            Ok(body)
        }
        Err(e) => {
            tracing::error!("{} on {} failed: {}", op.as_str(), spec.key, e);
            Err(e)
        }
    }
}

pub async fn create<P: Payload + ?Sized>(
    core: &ClientCore,
    spec: &ResourceSpec,
    payload: &P,
) -> Result<Value, ClientError> {
    checked(spec, Operation::Create, payload)?;
    let body = encode(payload, spec.body)?;
    let request = ApiRequest::new(Method::POST, spec.path).with_body(body);

    let response = execute(core, spec, Operation::Create, None, request).await?;
    let created = item_data(&response)?;
    // The new id may already have a cached miss from an earlier lookup
    if let Some(id) = created.get("id").and_then(id_of) {
        core.cache.invalidate_detail(spec.key, &id);
    }
    Ok(created)
}

pub async fn update<P: Payload + ?Sized>(
    core: &ClientCore,
    spec: &ResourceSpec,
    id: &Id,
    payload: &P,
) -> Result<Value, ClientError> {
    required_id(id)?;
    checked(spec, Operation::Update, payload)?;
    let body = encode(payload, spec.body)?;
    let request = ApiRequest::new(spec.update_method.method(), spec.item_path(id)).with_body(body);

    let response = execute(core, spec, Operation::Update, Some(id), request).await?;
    item_data(&response)
}

pub async fn remove(core: &ClientCore, spec: &ResourceSpec, id: &Id) -> Result<(), ClientError> {
    required_id(id)?;
    writable(spec)?;
    let request = ApiRequest::new(Method::DELETE, spec.item_path(id));
    execute(core, spec, Operation::Delete, Some(id), request).await?;
    Ok(())
}

fn id_of(value: &Value) -> Option<Id> {
    match value {
        Value::Number(n) => n.as_i64().map(Id::from),
        Value::String(s) if !s.is_empty() => Some(Id::new(s.as_str())),
        _ => None,
    }
}
