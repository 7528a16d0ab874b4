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

use futures::TryStreamExt;
use reqwest::header;

use crate::{
    client::{BodyStream, GetRequest, GetResponse, HttpClient},
    error::BoxError,
    sign::RequestSigner,
};

/// Production [`HttpClient`] backed by a shared [`reqwest::Client`].
///
/// Redirects are followed by reqwest itself. When a signer is attached it
/// runs once per attempt, after the request is fully formed.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    http:   reqwest::Client,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl ReqwestClient {
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http, signer: None }
    }

    #[must_use]
    pub const fn with_signer(http: reqwest::Client, signer: Arc<dyn RequestSigner>) -> Self {
        Self {
            http,
            signer: Some(signer),
        }
    }
}

impl HttpClient for ReqwestClient {
    type Error = reqwest::Error;

    fn get(
        &self,
        request: GetRequest,
    ) -> impl Future<Output = Result<GetResponse, Self::Error>> + Send {
        async move {
            let mut builder = self.http.get(&request.url);
            if let Some(range) = &request.range {
                builder = builder.header(header::RANGE, range);
            }
            if let Some(etag) = &request.if_match {
                builder = builder.header(header::IF_MATCH, etag);
            }

            let mut outgoing = builder.build()?;
            if let Some(signer) = &self.signer {
                signer.sign(&mut outgoing);
            }

            let response = self.http.execute(outgoing).await?;
            let status = response.status();
            let content_length = response.content_length();
            let etag = response
                .headers()
                .get(header::ETAG)
                .and_then(|value| value.to_str().ok())
                .map(ToOwned::to_owned);
            let body: BodyStream =
                Box::pin(response.bytes_stream().map_err(|err| Box::new(err) as BoxError));

            Ok(GetResponse {
                status,
                content_length,
                etag,
                body,
            })
        }
    }
}
