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

use std::{
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use async_stream::stream;
use bytes::Bytes;
use futures::{Stream, StreamExt, stream::BoxStream};
use http::StatusCode;
use reqwest::Url;
use snafu::IntoError;
use tracing::{debug, trace};

use crate::{
    client::{Classified, GetRequest, GetResponse, HttpClient},
    error::{
        AccessDeniedSnafu, BoxError, ConnectionFailedSnafu, FetchError, NotFoundSnafu,
        RequestFailedSnafu, TooManyInterruptionsSnafu, UnexpectedStatusSnafu,
    },
    header::ByteRange,
    progress::Progress,
};

type ObjectBody = BoxStream<'static, Result<Bytes, FetchError>>;

/// The bytes of one object, spliced across however many attempts it takes.
///
/// The stream yields the object's bytes in order, exactly once, with no gaps
/// or overlaps. A clean mid-body truncation is invisible to the consumer:
/// the fetch machinery re-requests the remainder with a `Range` header and
/// keeps going. Anything else terminal surfaces as the final `Err` item.
/// Dropping the stream cancels the fetch and releases the in-flight
/// connection.
pub struct ObjectStream {
    inner:          ObjectBody,
    progress:       Progress,
    content_length: Option<u64>,
    etag:           Option<String>,
}

impl ObjectStream {
    /// Bytes delivered to the consumer so far, across all attempts.
    #[must_use]
    pub fn bytes_read(&self) -> u64 { self.progress.bytes_seen() }

    /// Object size as reported by the first response, if the store sent one.
    #[must_use]
    pub const fn content_length(&self) -> Option<u64> { self.content_length }

    /// Entity tag of the object generation being streamed.
    #[must_use]
    pub fn etag(&self) -> Option<&str> { self.etag.as_deref() }
}

impl Stream for ObjectStream {
    type Item = Result<Bytes, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) { self.inner.size_hint() }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("bytes_read", &self.bytes_read())
            .field("content_length", &self.content_length)
            .field("etag", &self.etag)
            .finish_non_exhaustive()
    }
}

/// Open the object at `url` and return its spliced byte stream.
///
/// The first request is issued and classified here, so a missing or
/// forbidden object fails the call itself rather than the stream.
pub(crate) async fn fetch_object<C>(
    client: Arc<C>,
    url: Url,
    path: String,
    max_resumes: usize,
) -> Result<ObjectStream, FetchError>
where
    C: HttpClient + 'static,
{
    let first = GetRequest {
        url:      url.to_string(),
        range:    None,
        if_match: None,
    };
    let response = checked_get(client.as_ref(), &path, first).await?;

    let content_length = response.content_length;
    let etag = response.etag.clone();
    let progress = Progress::new();
    debug!(path = %path, len = ?content_length, "object stream opened");

    let tracker = progress.clone();
    let if_match = etag.clone();
    let first_body = response.body;
    let inner: ObjectBody = Box::pin(stream! {
        let mut body = tracker.count_stream(first_body);
        // Expected end offset of the whole object; `None` means the store
        // never told us, in which case every clean end of stream counts as
        // completion.
        let mut expected = content_length;
        let mut resumes = 0usize;

        'fetch: loop {
            while let Some(item) = body.next().await {
                match item {
                    Ok(chunk) => {
                        trace!(len = chunk.len(), "forwarding chunk");
                        yield Ok(chunk);
                    }
                    Err(source) => {
                        // An explicit transport error is terminal. Resuming
                        // is reserved for clean truncation.
                        tracker.set_resumable(false);
                        yield Err(ConnectionFailedSnafu { path: &path }.into_error(source));
                        break 'fetch;
                    }
                }
            }

            let seen = tracker.bytes_seen();
            let interrupted = matches!(expected, Some(total) if seen < total);
            tracker.set_resumable(interrupted);

            if !tracker.is_resumable() {
                debug!(path = %path, bytes = seen, "object stream complete");
                break 'fetch;
            }

            if resumes == max_resumes {
                yield Err(TooManyInterruptionsSnafu { path: &path, resumes }.build());
                break 'fetch;
            }
            resumes += 1;
            debug!(path = %path, offset = seen, attempt = resumes, "stream interrupted, resuming");

            // The finished attempt's connection is released before the next
            // request goes out, so at most one is held per logical fetch.
            drop(body);

            let request = GetRequest {
                url:      url.to_string(),
                range:    Some(ByteRange::AllFrom(seen).to_string()),
                if_match: if_match.clone(),
            };
            let response = match checked_get(client.as_ref(), &path, request).await {
                Ok(response) => response,
                Err(err) => {
                    tracker.set_resumable(false);
                    yield Err(err);
                    break 'fetch;
                }
            };

            // A resume response's length covers the remainder only.
            expected = response.content_length.map(|remaining| seen + remaining);
            body = tracker.count_stream(response.body);
        }
    });

    Ok(ObjectStream {
        inner,
        progress,
        content_length,
        etag,
    })
}

/// Issue one GET and map its status through the classification table.
async fn checked_get<C: HttpClient>(
    client: &C,
    path: &str,
    request: GetRequest,
) -> Result<GetResponse, FetchError> {
    let response = client.get(request).await.map_err(|source| {
        RequestFailedSnafu { path }.into_error(Box::new(source) as BoxError)
    })?;
    match status_error(path, response.status) {
        Some(err) => Err(err),
        None => Ok(response),
    }
}

/// Terminal error for a response status, if its classification calls for one.
fn status_error(path: &str, status: StatusCode) -> Option<FetchError> {
    match Classified::from_status(status) {
        Classified::Success => None,
        Classified::NotFound => Some(NotFoundSnafu { path }.build()),
        Classified::AccessDenied => Some(AccessDeniedSnafu { path }.build()),
        Classified::Unexpected(status) => Some(UnexpectedStatusSnafu { path, status }.build()),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use futures::stream;

    use super::*;
    use crate::client::BodyStream;

    #[derive(Debug)]
    struct FakeError(String);

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
    }

    impl std::error::Error for FakeError {}

    /// One scripted exchange: a response, or a failure to send at all.
    enum Attempt {
        Respond {
            status:         StatusCode,
            content_length: Option<u64>,
            etag:           Option<&'static str>,
            chunks:         Vec<Result<Bytes, &'static str>>,
        },
        FailToSend(&'static str),
    }

    impl Attempt {
        fn ok(content_length: Option<u64>, chunks: Vec<Result<Bytes, &'static str>>) -> Self {
            Self::Respond {
                status: StatusCode::OK,
                content_length,
                etag: None,
                chunks,
            }
        }

        fn partial(content_length: Option<u64>, chunks: Vec<Result<Bytes, &'static str>>) -> Self {
            Self::Respond {
                status: StatusCode::PARTIAL_CONTENT,
                content_length,
                etag: None,
                chunks,
            }
        }

        fn status(status: StatusCode) -> Self {
            Self::Respond {
                status,
                content_length: None,
                etag: None,
                chunks: Vec::new(),
            }
        }

        fn with_etag(mut self, tag: &'static str) -> Self {
            if let Self::Respond { etag, .. } = &mut self {
                *etag = Some(tag);
            }
            self
        }
    }

    struct FakeClient {
        script:   Mutex<VecDeque<Attempt>>,
        requests: Mutex<Vec<GetRequest>>,
    }

    impl FakeClient {
        fn scripted(attempts: Vec<Attempt>) -> Arc<Self> {
            Arc::new(Self {
                script:   Mutex::new(attempts.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GetRequest> { self.requests.lock().unwrap().clone() }
    }

    impl HttpClient for FakeClient {
        type Error = FakeError;

        fn get(
            &self,
            request: GetRequest,
        ) -> impl Future<Output = Result<GetResponse, Self::Error>> + Send {
            self.requests.lock().unwrap().push(request);
            let attempt = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .expect("request beyond scripted attempts");
            async move {
                match attempt {
                    Attempt::FailToSend(message) => Err(FakeError(message.to_string())),
                    Attempt::Respond {
                        status,
                        content_length,
                        etag,
                        chunks,
                    } => {
                        let items: Vec<Result<Bytes, BoxError>> = chunks
                            .into_iter()
                            .map(|chunk| chunk.map_err(BoxError::from))
                            .collect();
                        let body: BodyStream = Box::pin(stream::iter(items));
                        Ok(GetResponse {
                            status,
                            content_length,
                            etag: etag.map(ToOwned::to_owned),
                            body,
                        })
                    }
                }
            }
        }
    }

    fn object_data(len: usize) -> Vec<u8> { (0..len).map(|i| (i % 251) as u8).collect() }

    fn chunk(data: &[u8]) -> Result<Bytes, &'static str> { Ok(Bytes::copy_from_slice(data)) }

    async fn fetch(client: &Arc<FakeClient>, max_resumes: usize) -> Result<ObjectStream, FetchError> {
        fetch_object(
            Arc::clone(client),
            Url::parse("http://store.test/bucket/a/b.json").unwrap(),
            "a/b.json".to_string(),
            max_resumes,
        )
        .await
    }

    async fn collect_ok(stream: &mut ObjectStream) -> Vec<u8> {
        let mut bytes = Vec::new();
        while let Some(item) = stream.next().await {
            bytes.extend_from_slice(&item.expect("stream should not error"));
        }
        bytes
    }

    async fn collect_until_err(stream: &mut ObjectStream) -> (Vec<u8>, FetchError) {
        let mut bytes = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(err) => return (bytes, err),
            }
        }
        panic!("stream ended without the expected error");
    }

    #[tokio::test]
    async fn whole_object_in_one_attempt() {
        let data = object_data(24);
        let client = FakeClient::scripted(vec![Attempt::ok(
            Some(24),
            vec![chunk(&data[..10]), chunk(&data[10..20]), chunk(&data[20..])],
        )
        .with_etag("\"v1\"")]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(stream.content_length(), Some(24));
        assert_eq!(stream.etag(), Some("\"v1\""));

        assert_eq!(collect_ok(&mut stream).await, data);
        assert_eq!(stream.bytes_read(), 24);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].range, None);
        assert_eq!(requests[0].if_match, None);
    }

    #[tokio::test]
    async fn interruption_resumes_from_first_unread_byte() {
        let data = object_data(10_000);
        let client = FakeClient::scripted(vec![
            // First attempt dies cleanly after 4096 bytes.
            Attempt::ok(Some(10_000), vec![chunk(&data[..2048]), chunk(&data[2048..4096])])
                .with_etag("\"v1\""),
            // Resume covers the remaining 5904.
            Attempt::partial(Some(5_904), vec![chunk(&data[4096..8192]), chunk(&data[8192..])]),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(collect_ok(&mut stream).await, data);
        assert_eq!(stream.bytes_read(), 10_000);

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].range, None);
        assert_eq!(requests[1].range.as_deref(), Some("bytes=4096-"));
        assert_eq!(requests[1].if_match.as_deref(), Some("\"v1\""));
    }

    #[tokio::test]
    async fn repeated_interruptions_preserve_byte_order() {
        let data = object_data(10_000);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10_000), vec![chunk(&data[..4000])]),
            Attempt::partial(Some(6_000), vec![chunk(&data[4000..7000])]),
            Attempt::partial(Some(3_000), vec![chunk(&data[7000..])]),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(collect_ok(&mut stream).await, data);

        let requests = client.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].range.as_deref(), Some("bytes=4000-"));
        assert_eq!(requests[2].range.as_deref(), Some("bytes=7000-"));
    }

    #[tokio::test]
    async fn not_found_fails_the_call() {
        let client = FakeClient::scripted(vec![Attempt::status(StatusCode::NOT_FOUND)]);

        let err = fetch(&client, 8).await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound { ref path } if path == "a/b.json"));
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn access_denied_fails_the_call() {
        let client = FakeClient::scripted(vec![Attempt::status(StatusCode::FORBIDDEN)]);

        let err = fetch(&client, 8).await.unwrap_err();
        assert!(matches!(err, FetchError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn other_status_carries_the_code() {
        let client = FakeClient::scripted(vec![Attempt::status(StatusCode::SERVICE_UNAVAILABLE)]);

        let err = fetch(&client, 8).await.unwrap_err();
        assert!(matches!(err, FetchError::UnexpectedStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn not_found_on_resume_ends_the_stream() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), vec![chunk(&data[..4])]),
            Attempt::status(StatusCode::NOT_FOUND),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes, &data[..4]);
        assert!(matches!(err, FetchError::NotFound { .. }));
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn access_denied_on_resume_ends_the_stream() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), vec![chunk(&data[..4])]),
            Attempt::status(StatusCode::FORBIDDEN),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes, &data[..4]);
        assert!(matches!(err, FetchError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn transport_error_never_resumes() {
        let data = object_data(2048);
        let client = FakeClient::scripted(vec![Attempt::ok(
            Some(10_000),
            vec![chunk(&data), Err("connection reset by peer")],
        )]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes, data);
        assert_eq!(stream.bytes_read(), 2048);
        assert!(matches!(err, FetchError::ConnectionFailed { .. }));
        assert!(err.to_string().contains("connection reset by peer"));

        // Terminal: exactly one request, no resume after a hard error.
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn send_failure_on_resume_is_terminal() {
        let data = object_data(5_000);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(5_000), vec![chunk(&data[..1000])]),
            Attempt::FailToSend("dns lookup failed"),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes.len(), 1000);
        assert!(matches!(err, FetchError::RequestFailed { .. }));
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn resume_budget_is_bounded() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), vec![chunk(&data[..1])]),
            Attempt::partial(Some(9), vec![chunk(&data[1..2])]),
            Attempt::partial(Some(8), vec![chunk(&data[2..3])]),
        ]);

        let mut stream = fetch(&client, 2).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes, &data[..3]);
        assert!(matches!(err, FetchError::TooManyInterruptions { resumes: 2, .. }));

        // One initial attempt plus the whole resume budget.
        assert_eq!(client.requests().len(), 3);
    }

    #[tokio::test]
    async fn interruption_at_zero_re_requests_everything() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), Vec::new()),
            Attempt::partial(Some(10), vec![chunk(&data)]),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(collect_ok(&mut stream).await, data);

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].range.as_deref(), Some("bytes=0-"));
    }

    #[tokio::test]
    async fn missing_etag_leaves_resumes_unguarded() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), vec![chunk(&data[..4])]),
            Attempt::partial(Some(6), vec![chunk(&data[4..])]),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(collect_ok(&mut stream).await, data);
        assert_eq!(client.requests()[1].if_match, None);
    }

    #[tokio::test]
    async fn replaced_object_fails_the_resume() {
        let data = object_data(10);
        let client = FakeClient::scripted(vec![
            Attempt::ok(Some(10), vec![chunk(&data[..3])]).with_etag("\"v1\""),
            Attempt::status(StatusCode::PRECONDITION_FAILED),
        ]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let (bytes, err) = collect_until_err(&mut stream).await;
        assert_eq!(bytes, &data[..3]);
        assert!(matches!(err, FetchError::UnexpectedStatus { status: 412, .. }));
        assert_eq!(client.requests()[1].if_match.as_deref(), Some("\"v1\""));
    }

    #[tokio::test]
    async fn unknown_length_completes_on_clean_eof() {
        let data = object_data(5);
        let client = FakeClient::scripted(vec![Attempt::ok(None, vec![chunk(&data)])]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(stream.content_length(), None);
        assert_eq!(collect_ok(&mut stream).await, data);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_object_completes_immediately() {
        let client = FakeClient::scripted(vec![Attempt::ok(Some(0), Vec::new())]);

        let mut stream = fetch(&client, 8).await.unwrap();
        assert_eq!(collect_ok(&mut stream).await, Vec::<u8>::new());
        assert_eq!(stream.bytes_read(), 0);
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn bytes_read_tracks_consumption() {
        let data = object_data(6);
        let client = FakeClient::scripted(vec![Attempt::ok(
            Some(6),
            vec![chunk(&data[..2]), chunk(&data[2..4]), chunk(&data[4..])],
        )]);

        let mut stream = fetch(&client, 8).await.unwrap();
        let mut consumed = 0u64;
        let mut last_seen = 0u64;
        while let Some(item) = stream.next().await {
            consumed += item.unwrap().len() as u64;
            let seen = stream.bytes_read();
            assert_eq!(seen, consumed);
            assert!(seen >= last_seen);
            last_seen = seen;
        }
        assert_eq!(stream.bytes_read(), 6);
    }
}
