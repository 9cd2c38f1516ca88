//! Generic request transport shared by all provider strategies
//!
//! Two POST primitives: JSON and multipart. Both send `Authorization:
//! Bearer <api key>` and route every non-2xx response through the same
//! `GenError::Http` shape so strategies never see raw `reqwest` failures.
//!
//! The multipart primitive must not set `Content-Type` manually; reqwest
//! generates the boundary.

use serde::Serialize;

use crate::error::GenError;
use crate::types::ProviderConfig;

/// Thin HTTP POST helper bound to one provider's base URL and API key.
///
/// Constructed fresh per adapter from an immutable config snapshot; holds no
/// other state, so concurrent generation calls are fully independent.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// Build a transport from a provider config, validating it first.
    pub fn new(config: &ProviderConfig) -> Result<Self, GenError> {
        config.validate()?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// The provider's API root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body to `{base_url}{endpoint}` and decode the JSON reply.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> Result<serde_json::Value, GenError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "sending JSON request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        Self::decode_json_response(response).await
    }

    /// POST a multipart form to `{base_url}{endpoint}` and decode the JSON
    /// reply. The boundary (and thus `Content-Type`) comes from reqwest.
    pub async fn post_multipart(
        &self,
        endpoint: &str,
        form: reqwest::multipart::Form,
    ) -> Result<serde_json::Value, GenError> {
        let url = format!("{}{}", self.base_url, endpoint);
        tracing::debug!(%url, "sending multipart request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::decode_json_response(response).await
    }

    /// Fetch an arbitrary URL to bytes, returning the `Content-Type` header
    /// when the server sent one. Used to inline URL reference images; no
    /// bearer token is attached since the URL is not a provider endpoint.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>), GenError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenError::Http { status, message });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }

    async fn decode_json_response(
        response: reqwest::Response,
    ) -> Result<serde_json::Value, GenError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenError::Http { status, message });
        }

        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| GenError::Parse(format!("Failed to parse response JSON: {e}")))
    }
}
