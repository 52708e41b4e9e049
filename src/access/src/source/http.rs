//! HTTP identity and catalog backend

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{CatalogSource, IdentitySource};
use crate::config::BackendConfig;
use crate::error::{AccessError, Result};
use crate::types::{Credential, IdentityPayload, ModuleDescriptor};

/// Longest error body carried into an error message
const MAX_ERROR_BODY: usize = 256;

/// Bearer-authenticated JSON client for the identity and module endpoints
pub struct HttpBackend {
    client: Client,
    base_url: String,
    identity_path: String,
    catalog_path: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AccessError::Config(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            identity_path: config.identity_path.clone(),
            catalog_path: config.catalog_path.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, credential: &Credential) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.token())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AccessError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AccessError::CredentialRejected(format!("{} from {}", status.as_u16(), path)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AccessError::Transport(e.to_string()))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let message: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(AccessError::Status {
                code: status.as_u16(),
                message,
            });
        }

        let value: Value = serde_json::from_slice(&body)?;
        Ok(serde_json::from_value(unwrap_envelope(value))?)
    }
}

/// Accept both a bare body and `{ "data": ... }`
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("id") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl IdentitySource for HttpBackend {
    async fn fetch_identity(&self, credential: &Credential) -> Result<IdentityPayload> {
        self.get_json(&self.identity_path, credential).await
    }
}

#[async_trait]
impl CatalogSource for HttpBackend {
    async fn fetch_modules(&self, credential: &Credential) -> Result<Vec<ModuleDescriptor>> {
        self.get_json(&self.catalog_path, credential)
            .await
            .map_err(|err| match err {
                AccessError::CredentialRejected(_) => err,
                other => AccessError::CatalogUnavailable(other.to_string()),
            })
    }
}
