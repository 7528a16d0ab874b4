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

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use futures::StreamExt;

use crate::client::BodyStream;

/// Byte accounting for one logical fetch.
///
/// Cloning shares the same counters, so the resume loop and the handle given
/// to the consumer observe identical state. The byte count only ever grows:
/// it is never reset between resumed attempts, and a fresh tracker is created
/// for every logical fetch.
#[derive(Debug, Clone, Default)]
pub(crate) struct Progress {
    inner: Arc<ProgressInner>,
}

#[derive(Debug, Default)]
struct ProgressInner {
    bytes_seen: AtomicU64,
    resumable:  AtomicBool,
}

impl Progress {
    pub(crate) fn new() -> Self { Self::default() }

    /// Bytes forwarded to the consumer so far, across all attempts.
    pub(crate) fn bytes_seen(&self) -> u64 { self.inner.bytes_seen.load(Ordering::Acquire) }

    fn add(&self, n: u64) { self.inner.bytes_seen.fetch_add(n, Ordering::AcqRel); }

    /// Record how the most recent attempt ended: `true` for a clean
    /// truncation worth resuming, `false` for completion or a hard error.
    pub(crate) fn set_resumable(&self, resumable: bool) {
        self.inner.resumable.store(resumable, Ordering::Release);
    }

    pub(crate) fn is_resumable(&self) -> bool { self.inner.resumable.load(Ordering::Acquire) }

    /// Wrap an attempt's body so every chunk is counted before it is handed
    /// downstream.
    pub(crate) fn count_stream(&self, body: BodyStream) -> BodyStream {
        let progress = self.clone();
        Box::pin(body.map(move |item| {
            if let Ok(chunk) = &item {
                progress.add(chunk.len() as u64);
            }
            item
        }))
    }
}
