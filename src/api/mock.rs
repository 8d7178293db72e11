//! Scripted API client for tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::{ApiClient, ApiResponse};
use crate::app::{PlazaError, Result};
use crate::auth::HOME_PATH;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl RecordedCall {
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        match self.path.split_once('?') {
            Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Clone)]
enum Reply {
    Ok(Value),
    Fail { status: u16, message: String },
    Gated { gate: Arc<Notify>, data: Value },
}

struct Route {
    method: Method,
    path: String,
    reply: Reply,
}

#[derive(Default)]
pub(crate) struct MockApiClient {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self, method: Method, path: &str, reply: Reply) {
        self.routes.lock().unwrap().push(Route {
            method,
            path: path.to_string(),
            reply,
        });
    }

    /// Replies with `data` to every matching call. Later registrations win.
    pub fn on(&self, method: Method, path: &str, data: Value) -> &Self {
        self.register(method, path, Reply::Ok(data));
        self
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        self.register(
            method,
            path,
            Reply::Fail {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    /// Holds the reply until `gate` is notified.
    pub fn gated(&self, method: Method, path: &str, gate: Arc<Notify>, data: Value) -> &Self {
        self.register(method, path, Reply::Gated { gate, data });
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: Method, route: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method && c.route() == route)
            .count()
    }

    async fn handle(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            method: method.clone(),
            path: path.to_string(),
            body: body.cloned(),
        });

        let route = path.split('?').next().unwrap_or("");
        let reply = self
            .routes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == route)
            .map(|r| r.reply.clone());

        match reply {
            Some(Reply::Ok(data)) => Ok(ApiResponse::new(200, data)),
            Some(Reply::Gated { gate, data }) => {
                gate.notified().await;
                Ok(ApiResponse::new(200, data))
            }
            Some(Reply::Fail { status: 404, .. }) | None => {
                Err(PlazaError::NotFound(path.to_string()))
            }
            Some(Reply::Fail { status: 401, .. }) => Err(PlazaError::AuthRequired {
                return_to: HOME_PATH.to_string(),
            }),
            Some(Reply::Fail { status, message }) => Err(PlazaError::Api { status, message }),
        }
    }
}

#[async_trait]
impl ApiClient for MockApiClient {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.handle(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.handle(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.handle(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.handle(Method::DELETE, path, None).await
    }
}
