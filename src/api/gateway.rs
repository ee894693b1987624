//! Request gateway for the TaskForge API.
//!
//! Every API call goes through [`ApiGateway::request`]: the gateway resolves the path
//! against the configured base URL, attaches the stored access token as a bearer
//! credential, and turns any non-2xx response into an [`ApiError`] carrying the status
//! and the parsed error body. It only ever *reads* the token store; reacting to a
//! rejected token is left to the session controller.

use log::{debug, warn};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::token_store::TokenStore;

/// Method, body and extra headers of a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn post<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::POST).json(body)
    }

    pub fn put<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        Self::new(Method::PUT).json(body)
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::transport(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
    tokens: TokenStore,
}

impl ApiGateway {
    /// Builds a gateway with its own HTTP client, honouring the configured timeout.
    pub fn new(config: &ClientConfig, tokens: TokenStore) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(client, &config.api_base_url, tokens))
    }

    pub fn with_client(client: Client, base_url: &str, tokens: TokenStore) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Header set sent with a request: JSON content type, then the caller's headers,
    /// then the bearer token when one is stored.
    fn headers_for(&self, extra: &HeaderMap) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in extra {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = self.tokens.get_access() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored access token is not a valid header value, omitting it"),
            }
        }
        headers
    }

    /// Issues a request and decodes the JSON body as `T`.
    ///
    /// A `204 No Content` (or an empty success body) is decoded from JSON `null`, so it
    /// suits `()` or `Option<_>` targets.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.url_for(path);
        debug!("{} {}", options.method, url);

        let mut builder = self
            .client
            .request(options.method.clone(), &url)
            .headers(self.headers_for(&options.headers));
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);
        let bytes = response.bytes().await?;

        if !status.is_success() {
            debug!("{} {} failed with {}", options.method, url, status);
            return Err(error_from_body(status, is_json, &bytes));
        }

        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return decode(Value::Null);
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::transport(format!("Failed to decode response: {}", e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::post(body)?).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(path, RequestOptions::put(body)?).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(path, RequestOptions::delete()).await
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value)
        .map_err(|e| ApiError::transport(format!("Failed to decode response: {}", e)))
}

/// Builds the error for a non-success response body.
fn error_from_body(status: StatusCode, is_json: bool, body: &[u8]) -> ApiError {
    let fallback = format!("Request failed with status {}", status.as_u16());

    if is_json {
        if let Ok(details) = serde_json::from_slice::<Value>(body) {
            let message = message_from_json(&details).unwrap_or(fallback);
            return ApiError::http(status.as_u16(), message, Some(details));
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    let message = if text.is_empty() { fallback } else { text };
    ApiError::http(status.as_u16(), message, None)
}

/// Picks a human-readable message out of a JSON error body.
///
/// Understands `{"detail": "..."}`, validation lists of the form
/// `{"detail": [{"msg": "..."}, ...]}`, and `{"error": "..."}` / `{"message": "..."}`.
pub(crate) fn message_from_json(body: &Value) -> Option<String> {
    match body.get("detail") {
        Some(Value::String(detail)) => return Some(detail.clone()),
        Some(Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            if !messages.is_empty() {
                return Some(messages.join("; "));
            }
        }
        _ => {}
    }
    ["error", "message"]
        .iter()
        .find_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}
