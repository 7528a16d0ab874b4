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

//! Example streaming one object to stdout
//!
//! This example shows:
//! - Configuring a `Bucket` against any S3-compatible endpoint
//! - Consuming an `ObjectStream` chunk by chunk
//! - Reading the progress counter while the stream is live
//!
//! Usage:
//!
//! ```sh
//! cargo run --example get -- https://bucket.s3.us-east-1.amazonaws.com path/to/object
//! ```

use futures::TryStreamExt;
use obstream::{Bucket, BucketConfig, Url};
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let base = args.next().expect("usage: get <base-url> <object-path>");
    let path = args.next().expect("usage: get <base-url> <object-path>");

    let base_url = Url::parse(&base).expect("base URL must be absolute");
    let config = BucketConfig::builder()
        .user_agent("obstream-example/0.1".to_string())
        .build();
    let bucket = Bucket::new(base_url, config);

    let mut stream = bucket.get(&path).await.expect("failed to open object");
    tracing::info!(
        len = ?stream.content_length(),
        etag = ?stream.etag(),
        "Object stream opened"
    );

    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = stream.try_next().await.expect("stream failed") {
        stdout
            .write_all(&chunk)
            .await
            .expect("failed to write chunk");
    }
    stdout.flush().await.expect("failed to flush stdout");

    tracing::info!(bytes = stream.bytes_read(), "Object fully streamed");
}
