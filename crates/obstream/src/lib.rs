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

//! Resumable streaming reads for S3-compatible object stores.
//!
//! One object, one ordered byte stream, however many HTTP attempts it takes:
//! - **Transparent resume**: a cleanly truncated body is re-requested from
//!   the first unread byte with an open-ended `Range` header and spliced
//!   onto the same stream
//! - **Strict byte accounting**: every chunk is counted before the consumer
//!   sees it, so a resume never skips or repeats data
//! - **Honest failures**: missing objects, denied access, unexpected
//!   statuses, and mid-stream transport errors end the fetch with a typed
//!   error rather than a silent short read
//! - **Generation guard**: resumes echo the first response's ETag as
//!   `If-Match`, so an object replaced mid-fetch fails instead of splicing
//!   two versions together
//! - **Pluggable transport**: the fetch logic runs against the
//!   [`HttpClient`] trait; [`ReqwestClient`] is the production
//!   implementation, and scripted clients cover tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::TryStreamExt;
//! use obstream::{Bucket, BucketConfig, Url};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let base = Url::parse("https://objects.example.com/my-bucket")?;
//!     let bucket = Bucket::new(base, BucketConfig::default());
//!
//!     let mut stream = bucket.get("reports/2025/summary.json").await?;
//!     while let Some(chunk) = stream.try_next().await? {
//!         println!("read {} bytes (total {})", chunk.len(), stream.bytes_read());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Design
//!
//! - [`Bucket`]: entry point; composes object URLs and opens fetches
//! - [`ObjectStream`]: the spliced byte stream plus fetch metadata
//! - [`HttpClient`] / [`GetRequest`] / [`GetResponse`]: transport seam
//! - [`ReqwestClient`]: production transport with optional [`RequestSigner`]
//! - [`FetchError`]: terminal outcomes; clean truncation is not among them

mod bucket;
mod client;
mod error;
mod fetch;
mod header;
mod path;
mod progress;
mod reqwest_client;
mod sign;

pub use bucket::{Bucket, BucketConfig};
pub use client::{BodyStream, GetRequest, GetResponse, HttpClient};
pub use error::{BoxError, FetchError};
pub use fetch::ObjectStream;
pub use header::{ByteRange, InvalidRange};
// Callers parse base URLs without pulling in url/reqwest themselves.
pub use reqwest::Url;
pub use reqwest_client::ReqwestClient;
pub use sign::RequestSigner;
