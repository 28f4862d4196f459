// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

use crate::error::ErrorReport;
use crate::error::Fallible;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub const FETCH_USER_AGENT: &str = "AnkiMarkdown/1.0";

/// Something that can retrieve the bytes behind a URL.
///
/// The store only ever asks for whole modules, so there is no streaming: a
/// call either returns the complete body or fails.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        (**self).fetch(url)
    }
}

/// Errors that can occur when fetching a module.
#[derive(Debug, PartialEq)]
pub enum FetchError {
    /// No response within [`FETCH_TIMEOUT`].
    Timeout { url: String },
    /// Could not reach the server.
    Connection { url: String, reason: String },
    /// The server answered with a non-success status.
    Status { url: String, status: u16 },
    /// The response body could not be read.
    Body { url: String, reason: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Timeout { url } => write!(f, "request to {url} timed out"),
            FetchError::Connection { url, reason } => {
                write!(f, "could not connect to {url}: {reason}")
            }
            FetchError::Status { url, status } => write!(f, "{url} returned HTTP {status}"),
            FetchError::Body { url, reason } => {
                write!(f, "could not read response from {url}: {reason}")
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl From<FetchError> for ErrorReport {
    fn from(value: FetchError) -> Self {
        ErrorReport::new(value.to_string())
    }
}

/// Fetches modules over HTTP(S), blocking the calling thread.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Fallible<Self> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| ErrorReport::new(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, FETCH_USER_AGENT)
            .send()
            .map_err(|e| classify(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;
        Ok(body.to_vec())
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Connection {
            url: url.to_string(),
            reason: e.to_string(),
        }
    }
}
