use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::ClientError;
use crate::transport::{ApiRequest, Method, RawResponse, Transport};

type Handler = Arc<dyn Fn(&ApiRequest) -> Result<Value, ClientError> + Send + Sync>;
type DelayFn = Arc<dyn Fn(&ApiRequest) -> Duration + Send + Sync>;

#[derive(Default)]
struct Route {
    queued: VecDeque<Result<Value, ClientError>>,
    handler: Option<Handler>,
    delay: Option<DelayFn>,
}

#[derive(Default)]
struct FakeState {
    routes: HashMap<(Method, String), Route>,
    calls: Vec<ApiRequest>,
}

/// Scripted in-memory backend.
///
/// Each route answers from its queue of one-shot responses first, then from
/// its standing handler. Every request is recorded before any delay elapses,
/// so call counts include requests that are still in flight.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    fn with_route(&self, method: Method, path: &str, f: impl FnOnce(&mut Route)) {
        let mut state = self.state.lock().unwrap();
        f(state.routes.entry((method, path.to_string())).or_default());
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.respond_with(method, path, move |_| Ok(body.clone()));
    }

    pub fn respond_with<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&ApiRequest) -> Result<Value, ClientError> + Send + Sync + 'static,
    {
        self.with_route(method, path, |route| route.handler = Some(Arc::new(handler)));
    }

    pub fn respond_once(&self, method: Method, path: &str, body: Value) {
        self.with_route(method, path, |route| route.queued.push_back(Ok(body)));
    }

    pub fn fail_once(&self, method: Method, path: &str, error: ClientError) {
        self.with_route(method, path, |route| route.queued.push_back(Err(error)));
    }

    pub fn fail_always(&self, method: Method, path: &str, error: ClientError) {
        self.respond_with(method, path, move |_| Err(error.clone()));
    }

    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        self.delay_with(method, path, move |_| delay);
    }

    pub fn delay_with<F>(&self, method: Method, path: &str, delay: F)
    where
        F: Fn(&ApiRequest) -> Duration + Send + Sync + 'static,
    {
        self.with_route(method, path, |route| route.delay = Some(Arc::new(delay)));
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, method: &Method, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| &c.method == method && c.path == path)
            .collect()
    }

    pub fn call_count(&self, method: &Method, path: &str) -> usize {
        self.calls_to(method, path).len()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ClientError> {
        let key = (request.method.clone(), request.path.clone());
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(request.clone());
            state
                .routes
                .get(&key)
                .and_then(|r| r.delay.clone())
                .map(|f| f(&request))
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = {
            let mut state = self.state.lock().unwrap();
            match state.routes.get_mut(&key) {
                Some(route) => match route.queued.pop_front() {
                    Some(outcome) => outcome,
                    None => match route.handler.clone() {
                        Some(handler) => handler(&request),
                        None => Err(ClientError::from_response(404, &json!({"message": "no scripted response"}))),
                    },
                },
                None => Err(ClientError::from_response(
                    404,
                    &json!({"message": format!("no route for {} {}", request.method, request.path)}),
                )),
            }
        };

        outcome.map(|body| RawResponse { status: 200, body })
    }
}

/// `{success: true, data: rows}` with optional total
pub fn list_body(rows: Vec<Value>, total: Option<u64>) -> Value {
    match total {
        Some(total) => json!({"success": true, "data": rows, "meta": {"total": total}}),
        None => json!({"success": true, "data": rows}),
    }
}
