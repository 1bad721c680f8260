//! HTTP helpers for the JSON API with consistent timeouts and error
//! handling. Endpoint wrappers in [`crate::client`] use these helpers to
//! avoid duplicating request setup. Bearer tokens are attached from
//! caller-provided secrets and never logged.

use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info_span, Instrument};
use url::Url;

use crate::config::ClientConfig;
use crate::errors::{sanitize_body, ApiError};
use crate::types::ApiEnvelope;

/// Shared request plumbing: a configured reqwest client plus the API base URL.
pub(crate) struct Http {
    client: Client,
    base_url: String,
}

impl Http {
    /// Builds the underlying client, validating the configured base URL.
    pub(crate) fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim();
        if base_url.is_empty() {
            return Err(ApiError::Config(
                "API base URL is not configured.".to_string(),
            ));
        }
        let parsed = Url::parse(base_url)
            .map_err(|err| ApiError::Config(format!("Invalid API base URL: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "Unsupported API base URL scheme: {}",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Joins the base URL with an endpoint path.
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` returning the envelope payload; bearer auth optional.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let url = self.url(path);
        let span = info_span!("api.request", http.method = "GET", url = %url);
        let request = with_bearer(self.client.get(&url), bearer);
        let response = request.send().instrument(span).await.map_err(ApiError::from)?;
        handle_response(response).await
    }

    /// `POST` with a JSON body, returning the envelope; bearer auth optional.
    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&SecretString>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let url = self.url(path);
        let span = info_span!("api.request", http.method = "POST", url = %url);
        let request = with_bearer(self.client.post(&url), bearer).json(body);
        let response = request.send().instrument(span).await.map_err(ApiError::from)?;
        handle_response(response).await
    }

    /// `POST` with an empty body, returning the envelope; bearer auth optional.
    pub(crate) async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Option<&SecretString>,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let url = self.url(path);
        let span = info_span!("api.request", http.method = "POST", url = %url);
        let request = with_bearer(self.client.post(&url), bearer);
        let response = request.send().instrument(span).await.map_err(ApiError::from)?;
        handle_response(response).await
    }
}

fn with_bearer(request: RequestBuilder, bearer: Option<&SecretString>) -> RequestBuilder {
    match bearer {
        Some(token) => request.bearer_auth(token.expose_secret()),
        None => request,
    }
}

/// Decodes the response envelope, surfacing HTTP errors with sanitized bodies.
async fn handle_response<T: DeserializeOwned>(
    response: Response,
) -> Result<ApiEnvelope<T>, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("request rejected with status {status}");
        return Err(ApiError::Http {
            status: status.as_u16(),
            message: sanitize_body(body),
        });
    }

    response
        .json::<ApiEnvelope<T>>()
        .await
        .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(base: &str) -> ClientConfig {
        ClientConfig::new(base).with_timeout(Duration::from_millis(250))
    }

    #[test]
    fn new_rejects_empty_base_url() {
        let err = Http::new(&config("")).err().expect("empty base must fail");
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn new_rejects_unsupported_scheme() {
        let err = Http::new(&config("ftp://example.com"))
            .err()
            .expect("ftp scheme must fail");
        assert!(err.to_string().contains("Unsupported"));
    }

    #[test]
    fn url_joins_base_and_path() {
        let http = Http::new(&config("https://api.example.com/")).expect("config is valid");
        assert_eq!(
            http.url("/profile/me"),
            "https://api.example.com/profile/me"
        );
        assert_eq!(
            http.url("tokens/request"),
            "https://api.example.com/tokens/request"
        );
    }
}
