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
//! # Error
//!
//! Errors that can occur while talking to the OpenStack services.
use reqwest::StatusCode;
use thiserror::Error;

use openstack_resource_api_types::error::BuilderError;

use crate::resource::error::MappingError;
use crate::session::ServiceName;
use crate::transport::error::TransportError;

/// OpenStack client error.
#[derive(Debug, Error)]
pub enum OpenStackError {
    /// Network or HTTP level failure. The message of a 4xx response carries
    /// the provider message when the body could be decoded.
    #[error(transparent)]
    Transport {
        #[from]
        source: TransportError,
    },

    /// The requested resource does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// Local (pre-submit) validation failed.
    #[error("validation failed: {source}")]
    Validation {
        #[from]
        source: validator::ValidationErrors,
    },

    /// The attribute mapper could not classify the data.
    #[error(transparent)]
    Mapping {
        #[from]
        source: MappingError,
    },

    /// The kind can only be read.
    #[error("{kind} resources are read only")]
    ReadOnly { kind: &'static str },

    /// Endpoint of the service is not known to the session.
    #[error("endpoint for the {0} service is not configured")]
    NotConfigured(ServiceName),

    /// Request builder error.
    #[error(transparent)]
    Builder {
        #[from]
        source: BuilderError,
    },

    /// Json serialization error.
    #[error("json serde error: {}", source)]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Url parsing error.
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },

    /// The token can not be placed into the request headers.
    #[error("invalid header value")]
    HeaderValue {
        #[from]
        source: reqwest::header::InvalidHeaderValue,
    },
}

impl OpenStackError {
    /// HTTP status of the failed response (if any).
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { source } => source.status(),
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    /// Whether the error says that the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
