// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;

use bon::Builder;
use jiff::SignedDuration;
use reqwest::Url;
use smart_default::SmartDefault;

use crate::{
    client::HttpClient,
    error::FetchError,
    fetch::{ObjectStream, fetch_object},
    path::{object_key, object_url},
    reqwest_client::ReqwestClient,
    sign::RequestSigner,
};

/// Configuration for a [`Bucket`]
#[derive(Debug, Clone, SmartDefault, Builder)]
pub struct BucketConfig {
    /// Timeout for establishing each connection. Deliberately not a
    /// whole-request timeout: object bodies may stream for a long time.
    #[default(SignedDuration::from_secs(30))]
    #[builder(default = SignedDuration::from_secs(30))]
    pub connect_timeout: SignedDuration,

    /// Custom User-Agent header
    pub user_agent: Option<String>,

    /// Request signer applied by the production client to every attempt
    pub signer: Option<Arc<dyn RequestSigner>>,

    /// Interrupted attempts tolerated per fetch before giving up
    #[default = 8]
    #[builder(default = 8)]
    pub max_resumes: usize,
}

/// Read access to one S3-compatible bucket (or key prefix) under a base URL.
#[derive(Debug, Clone)]
pub struct Bucket<C = ReqwestClient> {
    client:   Arc<C>,
    base_url: Url,
    config:   BucketConfig,
}

impl Bucket {
    /// Bucket over a freshly built production client.
    ///
    /// # Panics
    ///
    /// Panics if the configured connect timeout is negative or the TLS
    /// backend cannot be initialized.
    #[must_use]
    pub fn new(base_url: Url, config: BucketConfig) -> Self {
        let client = Self::build_client(&config);
        Self {
            client: Arc::new(client),
            base_url,
            config,
        }
    }

    fn build_client(config: &BucketConfig) -> ReqwestClient {
        let connect_timeout: std::time::Duration = config
            .connect_timeout
            .try_into()
            .expect("connect timeout must be non-negative");

        let mut builder = reqwest::Client::builder().connect_timeout(connect_timeout);
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }
        let http = builder.build().expect("Failed to build HTTP client");

        match config.signer.clone() {
            Some(signer) => ReqwestClient::with_signer(http, signer),
            None => ReqwestClient::new(http),
        }
    }
}

impl<C> Bucket<C>
where
    C: HttpClient + 'static,
{
    /// Bucket over a caller-supplied transport (tests, wrappers, exotic
    /// stores). `signer`, `connect_timeout`, and `user_agent` in `config`
    /// are ignored here; they only shape the production client.
    pub fn with_client(base_url: Url, client: C, config: BucketConfig) -> Self {
        Self {
            client: Arc::new(client),
            base_url,
            config,
        }
    }

    /// Stream the object stored at `path`.
    ///
    /// The logical path may carry a leading `/`; the store key never does.
    /// The first request is classified before this returns, so a missing or
    /// forbidden object fails here with zero bytes delivered.
    pub async fn get(&self, path: &str) -> Result<ObjectStream, FetchError> {
        let key = object_key(path);
        let url = object_url(&self.base_url, key)?;
        fetch_object(
            Arc::clone(&self.client),
            url,
            path.to_string(),
            self.config.max_resumes,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = BucketConfig::default();
        assert_eq!(config.connect_timeout, SignedDuration::from_secs(30));
        assert_eq!(config.max_resumes, 8);
        assert!(config.user_agent.is_none());
        assert!(config.signer.is_none());
    }

    #[test]
    fn config_builder_overrides() {
        let config = BucketConfig::builder()
            .connect_timeout(SignedDuration::from_secs(5))
            .user_agent("obstream-tests".to_string())
            .max_resumes(2)
            .build();
        assert_eq!(config.connect_timeout, SignedDuration::from_secs(5));
        assert_eq!(config.max_resumes, 2);
        assert_eq!(config.user_agent.as_deref(), Some("obstream-tests"));
    }
}
