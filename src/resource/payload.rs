use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};

use super::spec::BodyEncoding;
use crate::error::{ClientError, FieldErrors};
use crate::transport::{RequestBody, Upload};

/// A create or update DTO.
///
/// `validate` runs before anything touches the network. Fields serialized as
/// `null`, `""` or `[]` are treated as "not changed" and never sent.
pub trait Payload: Serialize + Send + Sync {
    fn validate(&self) -> Result<(), ClientError>;

    /// Files to attach; any file forces a multipart body
    fn uploads(&self) -> Vec<(String, Upload)> {
        Vec::new()
    }
}

/// Payload type of read-only resources; it has no values
#[derive(Debug, Serialize)]
pub enum NoPayload {}

impl Payload for NoPayload {
    fn validate(&self) -> Result<(), ClientError> {
        match *self {}
    }
}

/// Collects field-scoped schema violations
#[derive(Debug, Default)]
pub struct Checks {
    errors: FieldErrors,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.entry(field.to_string()).or_default().push(message.into());
        self
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) -> &mut Self {
        if value.trim().chars().count() < min {
            self.fail(field, format!("{} must be at least {} characters", label(field), min));
        }
        self
    }

    /// Same as [`Checks::min_len`] but an absent or empty value passes
    pub fn min_len_opt(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        match value {
            Some(v) if !v.is_empty() => self.min_len(field, v, min),
            _ => self,
        }
    }

    pub fn required<T>(&mut self, field: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.fail(field, format!("{} is required", label(field)));
        }
        self
    }

    pub fn required_text(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.fail(field, format!("{} is required", label(field)));
        }
        self
    }

    pub fn positive(&mut self, field: &str, value: Option<Decimal>) -> &mut Self {
        if let Some(v) = value {
            if v <= Decimal::ZERO {
                self.fail(field, format!("{} must be positive", label(field)));
            }
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) -> &mut Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            if !allowed.contains(&v) {
                self.fail(field, format!("{} must be one of: {}", label(field), allowed.join(", ")));
            }
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ClientError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let errors = std::mem::take(&mut self.errors);
        let message = errors
            .values()
            .flatten()
            .next()
            .cloned()
            .unwrap_or_else(|| "Invalid payload".to_string());
        Err(ClientError::validation(message, errors))
    }
}

// "branch_id" -> "Branch id"
fn label(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Serialize and drop every key the user did not set
fn stripped_fields<P: Payload + ?Sized>(payload: &P) -> Result<Map<String, Value>, ClientError> {
    let value = serde_json::to_value(payload)?;
    let Value::Object(map) = value else {
        return Err(ClientError::decode("payload must serialize to an object"));
    };
    Ok(map
        .into_iter()
        .filter(|(_, v)| match v {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => true,
        })
        .collect())
}

fn coerce_bool(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(b as u8),
        other => other,
    }
}

fn form_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => (*b as u8).to_string(),
        other => other.to_string(),
    }
}

/// Flat form fields; arrays become repeated `key[]` entries
fn form_fields(map: Map<String, Value>) -> Vec<(String, String)> {
    let mut fields = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                let key = format!("{}[]", key);
                for item in items {
                    fields.push((key.clone(), form_scalar(&item)));
                }
            }
            other => fields.push((key, form_scalar(&other))),
        }
    }
    fields
}

/// Encode a validated payload for the wire
pub fn encode<P: Payload + ?Sized>(payload: &P, encoding: BodyEncoding) -> Result<RequestBody, ClientError> {
    let map = stripped_fields(payload)?;
    let files = payload.uploads();

    if encoding == BodyEncoding::ReadOnly {
        return Err(ClientError::validation("This resource cannot be modified", FieldErrors::new()));
    }

    if !files.is_empty() || encoding == BodyEncoding::Multipart {
        return Ok(RequestBody::Multipart { fields: form_fields(map), files });
    }

    Ok(match encoding {
        BodyEncoding::Json => RequestBody::Json(Value::Object(
            map.into_iter().map(|(k, v)| (k, coerce_bool(v))).collect(),
        )),
        _ => RequestBody::Form(form_fields(map)),
    })
}
