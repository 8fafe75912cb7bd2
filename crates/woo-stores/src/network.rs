//! Network collaborator
//!
//! Stores never build HTTP requests themselves. They describe a [`Request`]
//! and hand it to a [`Network`], which answers with the decoded JSON body or
//! a [`NetworkError`].

use crate::error::NetworkError;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(anyhow!("unknown HTTP method: {}", other)),
        }
    }
}

/// A request against the store API
#[derive(Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub auth_token: Option<String>,
}

impl Request {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token
    pub fn authorized(mut self, auth_token: Option<&str>) -> Self {
        self.auth_token = auth_token.map(str::to_string);
        self
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("authorized", &self.auth_token.is_some())
            .finish()
    }
}

/// Issues requests and returns the JSON body
///
/// Implementations must be `Send + Sync`: requests run on the async runtime,
/// off the dispatcher's thread.
#[async_trait]
pub trait Network: Send + Sync {
    async fn request(&self, request: Request) -> Result<Value, NetworkError>;
}

type ResponseKey = (Method, String);

/// Answers requests from canned responses
///
/// Used by tests and by the console's offline mode. Every request is
/// recorded and can be inspected with [`InMemoryNetwork::requests`].
#[derive(Default)]
pub struct InMemoryNetwork {
    responses: Mutex<HashMap<ResponseKey, Result<Value, NetworkError>>>,
    requests: Mutex<Vec<Request>>,
    required_token: Option<String>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method path` with `body`
    pub fn with_response(self, method: Method, path: &str, body: Value) -> Self {
        self.set_response(method, path, Ok(body));
        self
    }

    /// Answer `method path` with `error`
    pub fn with_failure(self, method: Method, path: &str, error: NetworkError) -> Self {
        self.set_response(method, path, Err(error));
        self
    }

    /// Reject requests not carrying `token`
    pub fn require_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Replace the canned answer for `method path`
    pub fn set_response(&self, method: Method, path: &str, response: Result<Value, NetworkError>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((method, path.to_string()), response);
    }

    /// Every request received so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Load canned responses from a JSON object keyed by `"METHOD path"`
    ///
    /// ```json
    /// { "GET me": { "ID": 1, "username": "merchant" } }
    /// ```
    pub fn from_fixture_str(content: &str) -> Result<Self> {
        let fixtures: HashMap<String, Value> =
            serde_json::from_str(content).context("Fixtures must be a JSON object")?;

        let network = Self::new();
        for (key, body) in fixtures {
            let (method, path) = key
                .split_once(' ')
                .with_context(|| format!("Fixture key {:?} is not \"METHOD path\"", key))?;
            let method: Method = method.parse()?;
            network.set_response(method, path.trim(), Ok(body));
        }
        Ok(network)
    }

    /// Load canned responses from a fixture file
    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixtures: {:?}", path))?;
        Self::from_fixture_str(&content)
            .with_context(|| format!("Failed to parse fixtures: {:?}", path))
    }
}

#[async_trait]
impl Network for InMemoryNetwork {
    async fn request(&self, request: Request) -> Result<Value, NetworkError> {
        log::debug!("InMemoryNetwork: {}", request);
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if let Some(required) = &self.required_token {
            if request.auth_token.as_deref() != Some(required.as_str()) {
                return Err(NetworkError::Unauthorized(format!(
                    "invalid token for {}",
                    request
                )));
            }
        }

        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        match responses.get(&(request.method, request.path.clone())) {
            Some(response) => response.clone(),
            None => Err(NetworkError::NotFound {
                method: request.method.to_string(),
                path: request.path,
            }),
        }
    }
}
