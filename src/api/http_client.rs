use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::api::{ApiClient, ApiResponse};
use crate::app::{PlazaError, Result};
use crate::auth::{Session, HOME_PATH};
use crate::config::ApiConfig;

pub struct HttpApiClient {
    client: Client,
    base_url: Url,
    session: Session,
}

impl HttpApiClient {
    pub fn new(config: &ApiConfig, session: Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            session,
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResponse> {
        let url = self.url(path)?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let data = parse_body(&bytes);

        if status.is_success() {
            Ok(ApiResponse::new(status.as_u16(), data))
        } else {
            warn!("{} {} failed with {}", method, path, status);
            Err(error_for_status(status, path, &data))
        }
    }
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Maps a non-success status to an error, preferring the server's own message.
fn error_for_status(status: StatusCode, path: &str, data: &Value) -> PlazaError {
    match status {
        StatusCode::NOT_FOUND => return PlazaError::NotFound(path.to_string()),
        StatusCode::UNAUTHORIZED => {
            return PlazaError::AuthRequired {
                return_to: HOME_PATH.to_string(),
            }
        }
        _ => {}
    }

    let message = ["message", "error", "errors"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(String::from)
        .or_else(|| data.as_str().filter(|s| !s.is_empty()).map(String::from))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    PlazaError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> HttpApiClient {
        let config = ApiConfig {
            base_url: base.to_string(),
            ..ApiConfig::default()
        };
        HttpApiClient::new(&config, Session::anonymous()).unwrap()
    }

    #[test]
    fn test_url_joins_base_path() {
        let client = client("http://localhost:8000/api/");
        assert_eq!(
            client.url("/posts?page=2").unwrap().as_str(),
            "http://localhost:8000/api/posts?page=2"
        );
        assert_eq!(
            client.url("favorites/count/p1").unwrap().as_str(),
            "http://localhost:8000/api/favorites/count/p1"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = ApiConfig {
            base_url: "not a url".into(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpApiClient::new(&config, Session::anonymous()),
            Err(PlazaError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_error_for_status_prefers_server_message() {
        let err = error_for_status(
            StatusCode::BAD_REQUEST,
            "/posts",
            &json!({"message": "Slug already exists"}),
        );
        match err {
            PlazaError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Slug already exists");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_for_status_falls_back_to_reason() {
        match error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "/posts", &Value::Null) {
            PlazaError::Api { message, .. } => assert_eq!(message, "Internal Server Error"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err = error_for_status(StatusCode::NOT_FOUND, "/posts/slug/x", &json!({}));
        assert!(matches!(err, PlazaError::NotFound(p) if p == "/posts/slug/x"));
    }

    #[test]
    fn test_unauthorized_maps_to_auth_required() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, "/favorites", &json!({}));
        assert!(matches!(err, PlazaError::AuthRequired { ref return_to } if return_to == "/"));
    }

    #[test]
    fn test_parse_body_variants() {
        assert_eq!(parse_body(b""), Value::Null);
        assert_eq!(parse_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(b"plain text"), json!("plain text"));
    }
}
