//! REST client for the inspection backend.
//!
//! Every call goes through [`ApiClient`]: base URL from config, the session
//! token attached as `X-Auth-Token`, non-2xx bodies turned into
//! [`InspectError::Api`] with the backend's `{error}` message when present.

mod auth;
mod images;
mod records;
mod regions;
mod transformers;

pub use images::ImageUpload;

use crate::config::Config;
use crate::error::{InspectError, Result};
use crate::session::Session;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thermal_inspect_common::serde_util::coerce_list;

pub const AUTH_HEADER: &str = "X-Auth-Token";
const GENERIC_FAILURE: &str = "Request failed";
const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action (403 from backend).";

/// HTTP client bound to one backend and one session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuses an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: None,
        }
    }

    pub fn from_config(config: &Config, session: &Session) -> Result<Self> {
        Ok(Self::new(config.api_url()?, config.timeout())?.with_session(session))
    }

    /// Attaches the session token to every subsequent request.
    pub fn with_session(mut self, session: &Session) -> Self {
        self.token = session.token().map(String::from);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL of an image's raw bytes.
    pub fn image_raw_url(&self, image_id: &str) -> String {
        self.url(&format!("/transformers/images/{}/raw", image_id))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header(AUTH_HEADER, token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        Self::ensure_success(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.json::<T>().await?)
    }

    /// GET of a list endpoint; any non-list payload becomes empty.
    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>> {
        let value: Value = self.get_json(path).await?;
        Ok(coerce_list(value))
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(method, path).json(body)).await?;
        Self::parse_optional_json(response).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Parses a JSON body, treating an empty body as JSON `null`.
    async fn parse_optional_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let text = response.text().await?;
        let value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok(serde_json::from_value(value)?)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let err = error_for_status(status, &body);
        tracing::debug!(status = status.as_u16(), body = %body, "backend returned an error");
        Err(err)
    }
}

/// Extracts `{error}` (or `{message}`) from an error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

pub fn error_for_status(status: StatusCode, body: &str) -> InspectError {
    let message = error_message(body);
    if status == StatusCode::FORBIDDEN {
        return InspectError::Forbidden(message.unwrap_or_else(|| FORBIDDEN_MESSAGE.to_string()));
    }
    InspectError::Api {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| format!("{} ({})", GENERIC_FAILURE, status.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"Title taken"}"#).as_deref(), Some("Title taken"));
        assert_eq!(error_message(r#"{"message":"Bad id"}"#).as_deref(), Some("Bad id"));
        assert_eq!(error_message("<html>oops</html>"), None);
        assert_eq!(error_message(r#"{"error":"  "}"#), None);
    }

    #[test]
    fn test_error_for_status() {
        let err = error_for_status(StatusCode::BAD_REQUEST, r#"{"error":"Invalid transformer"}"#);
        assert_eq!(err.to_string(), "Invalid transformer");
        assert_eq!(err.status(), Some(400));

        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(err.to_string(), "Request failed (500)");

        let err = error_for_status(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, InspectError::Forbidden(_)));
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_url_building() {
        let api = ApiClient::with_client(reqwest::Client::new(), "http://localhost:8080/api/");
        assert_eq!(api.url("/transformers"), "http://localhost:8080/api/transformers");
        assert_eq!(
            api.image_raw_url("12"),
            "http://localhost:8080/api/transformers/images/12/raw"
        );
    }
}
