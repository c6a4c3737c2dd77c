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

use config::{File, FileFormat};
use eyre::{Report, WrapErr};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Identity endpoints and credentials.
    pub auth: AuthSection,

    /// HTTP client options.
    #[serde(default)]
    pub http: HttpSection,
}

/// Identity endpoints and credentials.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct AuthSection {
    /// Keystone public endpoint (`http://keystone:5000/v2.0/`).
    pub auth_url: String,
    /// Keystone admin endpoint. Taken from the catalog when unset.
    pub admin_url: Option<String>,
    pub username: String,
    pub password: SecretString,
    /// Tenant the token is scoped to.
    pub tenant_id: Option<String>,
    /// Region of the catalog endpoints.
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSection {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            timeout: 5,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Config {
    pub fn new(path: PathBuf) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        if std::path::Path::new(&path).is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        builder.try_into()
    }
}

impl TryFrom<config::ConfigBuilder<config::builder::DefaultState>> for Config {
    type Error = Report;
    fn try_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Self::Error> {
        let mut builder = builder;
        builder = builder
            .set_default("http.timeout", "5")?
            .set_default("http.user_agent", default_user_agent())?;

        builder
            .build()
            .wrap_err("Failed to read configuration file")?
            .try_deserialize()
            .wrap_err("Failed to parse configuration file")
    }
}
