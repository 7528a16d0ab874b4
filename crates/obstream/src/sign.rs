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

use std::fmt;

/// Per-request authentication hook for [`ReqwestClient`].
///
/// The fetch machinery never looks at authentication. Implementations get
/// each fully-formed request right before it is sent, once per attempt, and
/// may add whatever headers or query parameters the store's auth scheme
/// needs (SigV4, presigned tokens, plain bearer tokens).
///
/// [`ReqwestClient`]: crate::ReqwestClient
pub trait RequestSigner: fmt::Debug + Send + Sync {
    fn sign(&self, request: &mut reqwest::Request);
}
