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

use snafu::Snafu;

/// Boxed error carried by transport-level failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Terminal outcomes of an object fetch.
///
/// A clean interruption of the byte stream is not represented here: the
/// fetch machinery resumes it transparently. Every variant below ends the
/// logical fetch for good; none of them is retried.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    #[snafu(display("Object not found: {path}"))]
    NotFound { path: String },

    #[snafu(display("Access denied for object: {path}"))]
    AccessDenied { path: String },

    #[snafu(display("Unexpected HTTP status {status} for object: {path}"))]
    UnexpectedStatus { path: String, status: u16 },

    #[snafu(display("Connection failed while streaming object {path}: {source}"))]
    ConnectionFailed { path: String, source: BoxError },

    #[snafu(display("Request could not be sent for object {path}: {source}"))]
    RequestFailed { path: String, source: BoxError },

    #[snafu(display("Giving up on object {path} after {resumes} resumed attempts"))]
    TooManyInterruptions { path: String, resumes: usize },

    #[snafu(display("Base URL cannot carry an object path: {url}"))]
    InvalidBaseUrl { url: String },
}
