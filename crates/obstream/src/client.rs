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

use bytes::Bytes;
use futures::stream::BoxStream;
use http::StatusCode;

use crate::error::BoxError;

/// Byte stream produced by a single GET attempt.
pub type BodyStream = BoxStream<'static, Result<Bytes, BoxError>>;

/// One GET against the object store.
#[derive(Debug, Clone)]
pub struct GetRequest {
    /// Absolute object URL.
    pub url: String,

    /// Wire-format `Range` header value. Set on resume attempts only; the
    /// first attempt always asks for the whole object.
    pub range: Option<String>,

    /// Wire-format `If-Match` header value. Set on resume attempts when the
    /// first response carried an ETag, so a replaced object fails loudly
    /// instead of splicing two generations together.
    pub if_match: Option<String>,
}

/// The store's answer to a [`GetRequest`].
pub struct GetResponse {
    pub status: StatusCode,

    /// Size of this response's body. On the first attempt this is the object
    /// size; on a resume attempt it covers the remainder.
    pub content_length: Option<u64>,

    /// Entity tag of the object generation being served, if the store sent
    /// one.
    pub etag: Option<String>,

    pub body: BodyStream,
}

/// Minimal HTTP surface the fetch machinery runs against.
///
/// Implementations are expected to follow redirects and authenticate on
/// their own; callers never see either concern. An `Err` from [`get`] means
/// the request could not be sent at all. Transport failures after the
/// response head arrives surface as `Err` items on the body stream instead.
///
/// [`get`]: HttpClient::get
pub trait HttpClient: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn get(
        &self,
        request: GetRequest,
    ) -> impl Future<Output = Result<GetResponse, Self::Error>> + Send;
}

/// What a response status means for the fetch, per the store contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Classified {
    /// 200, or 206 answering a ranged resume. The body is the object bytes
    /// (or the requested remainder).
    Success,

    /// 404: no object under that key.
    NotFound,

    /// 403: the caller may not read this object.
    AccessDenied,

    /// Any other status, carried verbatim for the caller to inspect.
    Unexpected(u16),
}

impl Classified {
    pub(crate) fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::OK | StatusCode::PARTIAL_CONTENT => Self::Success,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::FORBIDDEN => Self::AccessDenied,
            other => Self::Unexpected(other.as_u16()),
        }
    }
}
