// /////////////////////////////////////////////////////////////////////////////
// Layered Configuration Resolver
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Remote HTTP Source
//!
//! Fetches a configuration mapping from an HTTP(S) endpoint with a GET
//! request. The response must be a JSON object; a top-level array, a
//! non-200 status, a timeout, or a decode failure all collapse to an empty
//! mapping with the failure recorded on metadata.
//!
//! Authentication options mirror what configuration services commonly
//! accept: a bearer token, basic credentials, or an arbitrary header
//! carrying an API key. The request timeout and TLS verification are
//! configurable per source.
//!
//! As a dynamic source, its fingerprint is the content hash of the last
//! successful load, computed lazily: `fingerprint()` only performs a
//! network round-trip when no load has succeeded yet.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use layered_config_domain::{ConfigSource, ConfigValue, Fingerprint, SourceKind, SourceMetadata};
use parking_lot::Mutex;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authentication applied to remote requests.
#[derive(Debug, Clone)]
pub enum RemoteAuth {
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic <base64(user:pass)>`
    Basic { username: String, password: String },
    /// A caller-named header carrying an API key.
    ApiKey { header: String, value: String },
}

/// Configuration source backed by an HTTP(S) endpoint.
pub struct RemoteSource {
    url: String,
    auth: RemoteAuth,
    timeout: Duration,
    verify_ssl: bool,
    metadata: Mutex<SourceMetadata>,
    last_hash: Mutex<Option<Fingerprint>>,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        let metadata = SourceMetadata::new(SourceKind::Remote, url.clone());
        Self {
            url,
            auth: RemoteAuth::None,
            timeout: DEFAULT_TIMEOUT,
            verify_ssl: true,
            metadata: Mutex::new(metadata),
            last_hash: Mutex::new(None),
        }
    }

    /// Sends `Authorization: Bearer <token>`.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.auth = RemoteAuth::Bearer(token.into());
        self
    }

    /// Sends `Authorization: Basic <credentials>`.
    pub fn with_basic(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = RemoteAuth::Basic {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sends an API key in a caller-named header.
    pub fn with_api_key(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth = RemoteAuth::ApiKey {
            header: header.into(),
            value: value.into(),
        };
        self
    }

    /// Overrides the request timeout (default 10 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables TLS certificate verification. Only for development
    /// endpoints with self-signed certificates.
    pub fn danger_disable_ssl_verify(mut self) -> Self {
        self.verify_ssl = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn client(&self) -> Result<reqwest::Client, String> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_ssl)
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))
    }

    async fn fetch(&self) -> Result<ConfigValue, String> {
        let client = self.client()?;
        let mut request = client.get(&self.url);
        request = match &self.auth {
            RemoteAuth::None => request,
            RemoteAuth::Bearer(token) => request.header("Authorization", format!("Bearer {token}")),
            RemoteAuth::Basic { username, password } => {
                let credentials = BASE64_STANDARD.encode(format!("{username}:{password}"));
                request.header("Authorization", format!("Basic {credentials}"))
            }
            RemoteAuth::ApiKey { header, value } => request.header(header.as_str(), value.as_str()),
        };
        let response = request.send().await.map_err(|e| format!("request failed: {e}"))?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!("unexpected status {status}"));
        }
        let body: serde_json::Value = response.json().await.map_err(|e| format!("invalid JSON response: {e}"))?;
        if !body.is_object() {
            return Err("response root is not a JSON object".to_string());
        }
        Ok(ConfigValue::from(body))
    }
}

#[async_trait]
impl ConfigSource for RemoteSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Remote
    }

    fn origin(&self) -> String {
        self.url.clone()
    }

    async fn is_available(&self) -> bool {
        Url::parse(&self.url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false)
    }

    async fn load(&self) -> ConfigValue {
        self.metadata.lock().record_attempt();
        match self.fetch().await {
            Ok(tree) => {
                let fingerprint = Fingerprint::of_tree(&tree);
                *self.last_hash.lock() = Some(fingerprint.clone());
                self.metadata
                    .lock()
                    .record_success(Some(tree.size_estimate() as u64), Some(fingerprint));
                debug!(source = %self.describe(), "loaded remote configuration");
                tree
            }
            Err(error) => {
                warn!(source = %self.describe(), %error, "remote load failed");
                self.metadata.lock().record_failure(error);
                ConfigValue::empty_mapping()
            }
        }
    }

    async fn fingerprint(&self) -> Fingerprint {
        if let Some(hash) = self.last_hash.lock().clone() {
            return hash;
        }
        // Computed lazily: first derivation loads once; failures leave the
        // fingerprint unavailable and the source uncached.
        let _ = self.load().await;
        self.last_hash.lock().clone().unwrap_or(Fingerprint::Unavailable)
    }

    fn metadata(&self) -> SourceMetadata {
        self.metadata.lock().clone()
    }
}
