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
//
// SPDX-License-Identifier: Apache-2.0
//! # Transport error
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with a non success status.
    #[error("{message}")]
    Http {
        status: StatusCode,
        body: String,
        message: String,
    },

    /// The service could not be reached or the response could not be read.
    #[error("connection error: {}", source)]
    Connection {
        #[from]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Build the error for a failed response.
    ///
    /// For 4xx responses the message is replaced with the provider message
    /// found under the first top level key of the JSON body (e.g.
    /// `{"badRequest": {"message": "..."}}`). When the body does not look
    /// like that the generic message is kept.
    pub fn from_response<B: Into<String>>(status: StatusCode, body: B) -> Self {
        let body = body.into();
        let message = if status.is_client_error() {
            provider_message(&body).unwrap_or_else(|| generic_message(status))
        } else {
            generic_message(status)
        };
        Self::Http {
            status,
            body,
            message,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Connection { source } => source.status(),
        }
    }
}

fn generic_message(status: StatusCode) -> String {
    format!(
        "Failed. Response code = {}. Response message = {}.",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

/// Extract `body[first_key]["message"]`.
fn provider_message(body: &str) -> Option<String> {
    let Value::Object(map) = serde_json::from_str::<Value>(body).ok()? else {
        return None;
    };
    let (_, first) = map.into_iter().next()?;
    match first.get("message")? {
        Value::String(message) => Some(message.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
