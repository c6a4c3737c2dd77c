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
//! # Authentication errors
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

use crate::error::OpenStackError;

/// Outcome of a failed authentication.
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// Identity rejected the credentials (`401`). Reported as a field
    /// failure on `password`.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(ValidationErrors),

    /// The credentials are locally incomplete; nothing was sent.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Any other failure.
    #[error(transparent)]
    Transport(#[from] OpenStackError),
}

impl AuthFailure {
    /// Field failures of a credential problem.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::InvalidCredentials(errors) | Self::Validation(errors) => Some(errors),
            Self::Transport(_) => None,
        }
    }

    pub(crate) fn invalid_password() -> Self {
        let mut error = ValidationError::new("invalid");
        error.message = Some("is invalid".into());
        let mut errors = ValidationErrors::new();
        errors.add("password", error);
        Self::InvalidCredentials(errors)
    }
}

impl From<serde_json::Error> for AuthFailure {
    fn from(value: serde_json::Error) -> Self {
        Self::Transport(value.into())
    }
}
