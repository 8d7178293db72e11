pub mod endpoints;
pub mod http_client;
pub mod responses;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::app::{PlazaError, Result};

pub use http_client::HttpApiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
}

impl ApiResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data }
    }

    /// Decodes the body into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.data).map_err(|e| PlazaError::Decode(e.to_string()))
    }
}

/// The REST backend. Paths are relative to the API base (`/posts`, `/favorites/count/42`, ...)
/// and may carry an encoded query string.
#[async_trait]
pub trait ApiClient {
    async fn get(&self, path: &str) -> Result<ApiResponse>;
    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse>;
    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse>;
    async fn delete(&self, path: &str) -> Result<ApiResponse>;
}

pub type SharedApi = std::sync::Arc<dyn ApiClient + Send + Sync>;
