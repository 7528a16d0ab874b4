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

use reqwest::Url;
use snafu::OptionExt;

use crate::error::{FetchError, InvalidBaseUrlSnafu};

/// Store key for a logical object path. Keys never start with a separator,
/// so any number of leading `/` is stripped.
pub(crate) fn object_key(path: &str) -> &str { path.trim_start_matches('/') }

/// Absolute URL for an object key under `base`.
///
/// Key segments are percent-escaped one by one so the `/` separators
/// survive. Fails only for bases that cannot carry a path at all.
pub(crate) fn object_url(base: &Url, key: &str) -> Result<Url, FetchError> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .ok()
            .context(InvalidBaseUrlSnafu { url: base.as_str() })?;
        segments.pop_if_empty();
        for segment in key.split('/') {
            segments.push(segment);
        }
    }
    Ok(url)
}
