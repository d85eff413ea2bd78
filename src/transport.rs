// HTTP transport: the "authenticated request" capability consumed by the core
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub use reqwest::Method;

use crate::auth::SessionContext;
use crate::config::ApiConfig;
use crate::error::ClientError;
use crate::filter::QueryParams;

/// A file attached to a mutation (e.g. a worker photo)
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
    Multipart {
        fields: Vec<(String, String)>,
        files: Vec<(String, Upload)>,
    },
}

impl RequestBody {
    /// Text fields regardless of encoding, for inspection and logging
    pub fn fields(&self) -> Vec<(String, String)> {
        match self {
            RequestBody::Json(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect(),
            RequestBody::Json(_) => Vec::new(),
            RequestBody::Form(fields) => fields.clone(),
            RequestBody::Multipart { fields, .. } => fields.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub params: QueryParams,
    pub body: Option<RequestBody>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: QueryParams::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn with_params(mut self, params: QueryParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful (2xx) response with its JSON body; an empty body is `Null`
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Sends requests on behalf of the core.
///
/// Implementations attach credentials, map non-2xx responses to
/// [`ClientError`] and never react to a 401 themselves.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError>;
}

/// Send a read, retrying a transient failure at most `max_retries` times.
/// Mutations are never routed through here.
pub async fn send_with_retry(
    transport: &dyn Transport,
    request: ApiRequest,
    max_retries: u32,
) -> Result<RawResponse, ClientError> {
    let mut attempt = 0;
    loop {
        match transport.send(request.clone()).await {
            Err(e) if e.is_transient() && attempt < max_retries => {
                attempt += 1;
                tracing::warn!("Transient failure on {} {}, retrying: {}", request.method, request.path, e);
            }
            other => return other,
        }
    }
}

/// reqwest-backed transport with bearer credentials from the session
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
    log_requests: bool,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig, session: SessionContext) -> Result<Self, ClientError> {
        // Validate early so a bad URL fails at startup, not on first request
        Url::parse(&config.base_url)
            .map_err(|e| ClientError::transport(format!("invalid API base URL '{}': {}", config.base_url, e), false))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::transport(e.to_string(), false))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            log_requests: config.enable_request_logging,
        })
    }

    pub fn into_shared(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }

    fn url_for(&self, request: &ApiRequest) -> Result<Url, ClientError> {
        let path = if request.path.starts_with('/') {
            request.path.clone()
        } else {
            format!("/{}", request.path)
        };
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::transport(format!("invalid request URL: {}", e), false))?;
        if !request.params.is_empty() {
            url.set_query(Some(&request.params.to_query_string()));
        }
        Ok(url)
    }

    fn attach_body(builder: reqwest::RequestBuilder, body: RequestBody) -> Result<reqwest::RequestBuilder, ClientError> {
        Ok(match body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart { fields, files } => {
                let mut form = reqwest::multipart::Form::new();
                for (key, value) in fields {
                    form = form.text(key, value);
                }
                for (key, upload) in files {
                    let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
                    if let Some(mime) = upload.mime {
                        part = part
                            .mime_str(&mime)
                            .map_err(|e| ClientError::invalid_field(key.clone(), format!("invalid file type: {}", e)))?;
                    }
                    form = form.part(key, part);
                }
                builder.multipart(form)
            }
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let url = self.url_for(&request)?;
        if self.log_requests {
            tracing::info!("{} {}", request.method, url);
        } else {
            tracing::debug!("{} {}", request.method, url);
        }

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(authorization) = self.session.authorization() {
            builder = builder.header(reqwest::header::AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body {
            builder = Self::attach_body(builder, body)?;
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(value) => value,
                // Non-JSON error pages still need a status-based error
                Err(_) if !(200..300).contains(&status) => Value::Null,
                Err(e) => return Err(ClientError::decode(format!("response is not JSON: {}", e))),
            }
        };

        if (200..300).contains(&status) {
            Ok(RawResponse { status, body })
        } else {
            Err(ClientError::from_response(status, &body))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeTransport;
    use serde_json::json;

    #[tokio::test]
    async fn one_silent_retry_for_transient_failures() {
        let fake = FakeTransport::new();
        fake.fail_once(Method::GET, "/dashboard/users", ClientError::transport("reset", true));
        fake.respond(Method::GET, "/dashboard/users", json!({"success": true, "data": []}));

        let res = send_with_retry(&fake, ApiRequest::get("/dashboard/users"), 1).await.unwrap();
        assert_eq!(res.status, 200);
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/users"), 2);
    }

    #[tokio::test]
    async fn persistent_failures_surface_after_one_retry() {
        let fake = FakeTransport::new();
        fake.fail_always(Method::GET, "/dashboard/users", ClientError::transport("down", true));

        let err = send_with_retry(&fake, ApiRequest::get("/dashboard/users"), 1).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/users"), 2);
    }

    #[tokio::test]
    async fn backend_rejections_are_not_retried() {
        let fake = FakeTransport::new();
        fake.fail_always(Method::GET, "/dashboard/users", ClientError::from_response(500, &json!({})));

        assert!(send_with_retry(&fake, ApiRequest::get("/dashboard/users"), 1).await.is_err());
        assert_eq!(fake.call_count(&Method::GET, "/dashboard/users"), 1);
    }

    #[test]
    fn url_joins_base_path_and_query() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/api/".to_string(),
            timeout_secs: 5,
            enable_request_logging: false,
        };
        let transport = HttpTransport::new(&config, SessionContext::new()).unwrap();
        let mut params = QueryParams::new();
        params.insert("filter[name]", "a b");
        let url = transport
            .url_for(&ApiRequest::get("/dashboard/mosques").with_params(params))
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/dashboard/mosques?filter[name]=a%20b");
    }
}
