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

use std::{fmt, str::FromStr};

/// Value of a `Range` request header holding a single byte range.
///
/// S3-compatible stores accept one range per request, so the multi-range
/// forms of RFC 9110 are not representable here. Resuming only ever sends
/// [`ByteRange::AllFrom`]; the other forms exist so servers and tests can
/// parse whatever a client sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// All bytes between `start` and `end` inclusive (`bytes=start-end`).
    Inclusive(u64, u64),

    /// All bytes from `start` to the end of the object (`bytes=start-`).
    AllFrom(u64),

    /// The final `n` bytes of the object (`bytes=-n`).
    Last(u64),
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Inclusive(start, end) => write!(f, "bytes={start}-{end}"),
            Self::AllFrom(start) => write!(f, "bytes={start}-"),
            Self::Last(n) => write!(f, "bytes=-{n}"),
        }
    }
}

impl FromStr for ByteRange {
    type Err = InvalidRange;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = s.strip_prefix("bytes=").ok_or(InvalidRange)?;
        if spec.contains(',') {
            // Multiple ranges in one header are not supported.
            return Err(InvalidRange);
        }
        let mut iter = spec.splitn(2, '-');
        match (iter.next(), iter.next()) {
            (Some(""), Some(n)) => n.parse().map(Self::Last).map_err(|_| InvalidRange),
            (Some(start), Some("")) => start.parse().map(Self::AllFrom).map_err(|_| InvalidRange),
            (Some(start), Some(end)) => match (start.parse(), end.parse()) {
                (Ok(start), Ok(end)) if start <= end => Ok(Self::Inclusive(start, end)),
                _ => Err(InvalidRange),
            },
            _ => Err(InvalidRange),
        }
    }
}

/// The string is not a single well-formed byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidRange;

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid byte range header")
    }
}

impl std::error::Error for InvalidRange {}
