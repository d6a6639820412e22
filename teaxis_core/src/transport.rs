//! HTTP transport to the Teaxis backend.
//!
//! A [`Transport`] performs exactly one exchange per call and reports what
//! happened as an [`Outcome`]. It attaches the bearer credential it is
//! given and never looks at, or changes, the session itself.

use crate::{Error, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Serialize;
use std::time::Duration;

/// A request to one backend endpoint, independent of the HTTP library
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Why a call did not succeed (other than an authorization failure)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// The server answered with a non-success status
    Status { status: u16, body: String },
    /// No response was received
    Unreachable(String),
}

/// Tagged result of one exchange
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success { status: u16, body: String },
    /// 401: the credential was missing, expired or rejected
    Unauthorized { body: String },
    Failed(Failure),
}

/// HTTP client bound to one backend address
#[derive(Clone, Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid backend address {:?}: {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send `request`, adding `Authorization: Bearer <token>` iff a token is
    /// given
    pub async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Outcome {
        let url = self.url_for(&request.path);
        tracing::debug!("{} {}", request.method, request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(body) = &request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} {} failed without a response: {}", request.method, request.path, e);
                return Outcome::Failed(Failure::Unreachable(e.to_string()));
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if status < 300 => {
                return Outcome::Failed(Failure::Unreachable(format!(
                    "response body could not be read: {}",
                    e
                )));
            }
            Err(_) => String::new(),
        };

        tracing::debug!("{} {} -> {}", request.method, request.path, status);
        match status {
            200..=299 => Outcome::Success { status, body },
            401 => Outcome::Unauthorized { body },
            _ => Outcome::Failed(Failure::Status { status, body }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let err = Transport::new("not a url", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_url_joining() {
        let t = Transport::new("http://localhost:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(t.base_url(), "http://localhost:8080");
        assert_eq!(t.url_for("/login"), "http://localhost:8080/login");
        assert_eq!(t.url_for("sessoes/3"), "http://localhost:8080/sessoes/3");
    }

    #[test]
    fn test_request_builders() {
        let req = ApiRequest::get("/avaliacoes/me")
            .query("profissionalId", 4);
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.query, vec![("profissionalId".to_string(), "4".to_string())]);

        let req = ApiRequest::post("/favoritos")
            .json(&serde_json::json!({"profissionalId": 4}))
            .unwrap();
        assert_eq!(req.body.unwrap()["profissionalId"], 4);
    }
}
