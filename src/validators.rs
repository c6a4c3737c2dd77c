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
//! # Validators
//!
//! Local mirrors of the server side constraints, run before a resource is
//! submitted.
use std::sync::LazyLock;

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use validator::ValidationError;

static TENANT_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w[\w\s]+\w$").unwrap());
static FREE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[\w\s\.\-:@+,'"]+$"#).unwrap());
static FREE_TEXT_FORBIDDEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s\.\-:@+,'"]"#).unwrap());
static ACCOUNT_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^[0-9a-z_]+$").unwrap());
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$").unwrap()
});
static SERVER_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\.\-]{2,}$").unwrap());
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\.\-]+$").unwrap());
static BRIDGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^[a-z][a-z0-9]{1,8}$").unwrap());
static BRIDGE_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]{1,5}[a-z0-9]{1,5}(\.[0-9]{1,4})?$").unwrap());
static NETWORK_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w\s]{1,20}$").unwrap());
static IPV4_CIDR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)/(?:3[0-2]|[12]?\d)$").unwrap()
});
static DEVICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[/\\a-zA-Z0-9]+$").unwrap());

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Blank values pass, presence is validated separately.
fn matches(re: &Regex, value: &str, message: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() || re.is_match(value) {
        Ok(())
    } else {
        Err(invalid("format", message))
    }
}

pub fn blank() -> ValidationError {
    invalid("required", "can't be blank")
}

pub fn min_length(value: &str, min: usize) -> Result<(), ValidationError> {
    if value.chars().count() >= min {
        return Ok(());
    }
    let mut err = ValidationError::new("length");
    err.message = Some(format!("is too short (minimum is {min} characters)").into());
    Err(err)
}

pub fn secret_present(value: &SecretString) -> Result<(), ValidationError> {
    if value.expose_secret().is_empty() {
        return Err(invalid("presence", "can't be blank"));
    }
    Ok(())
}

pub fn tenant_name(value: &str) -> Result<(), ValidationError> {
    matches(&TENANT_NAME, value, "must contain only letters, digits and spaces")
}

/// Free text (descriptions).
pub fn free_text(value: &str) -> Result<(), ValidationError> {
    matches(&FREE_TEXT, value, "contains not allowed characters")
}

/// Replace the characters not allowed in free text with `_`.
pub fn sanitize_free_text(value: &str) -> String {
    FREE_TEXT_FORBIDDEN.replace_all(value, "_").into_owned()
}

pub fn account_name(value: &str) -> Result<(), ValidationError> {
    matches(
        &ACCOUNT_NAME,
        value,
        "must contain only letters, digits and underscores",
    )
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    matches(&EMAIL, value, "is not a valid email address")
}

/// At least one digit or non word character.
pub fn password_strength(value: &SecretString) -> Result<(), ValidationError> {
    let value = value.expose_secret();
    if value.chars().count() < 8 {
        return Err(invalid("length", "must be at least 8 characters long"));
    }
    if !value
        .chars()
        .any(|c| c.is_ascii_digit() || !(c.is_alphanumeric() || c == '_'))
    {
        return Err(invalid(
            "format",
            "must contain at least one digit or special character",
        ));
    }
    Ok(())
}

pub fn server_name(value: &str) -> Result<(), ValidationError> {
    matches(
        &SERVER_NAME,
        value,
        "must be at least 2 letters, digits, dots, dashes or underscores",
    )
}

pub fn resource_name(value: &str) -> Result<(), ValidationError> {
    matches(
        &RESOURCE_NAME,
        value,
        "must contain only letters, digits, dots, dashes and underscores",
    )
}

pub fn bridge(value: &str) -> Result<(), ValidationError> {
    matches(&BRIDGE, value, "is not a valid bridge name")
}

pub fn bridge_interface(value: &str) -> Result<(), ValidationError> {
    matches(&BRIDGE_INTERFACE, value, "is not a valid interface name")
}

pub fn network_label(value: &str) -> Result<(), ValidationError> {
    matches(&NETWORK_LABEL, value, "is not a valid label")
}

pub fn ipv4_cidr(value: &str) -> Result<(), ValidationError> {
    matches(&IPV4_CIDR, value, "is not a valid IPv4 CIDR")
}

pub fn device(value: &str) -> Result<(), ValidationError> {
    matches(&DEVICE, value, "is not a valid device path")
}

pub fn ip_protocol(value: &str) -> Result<(), ValidationError> {
    match value {
        "tcp" | "udp" | "icmp" => Ok(()),
        _ => Err(invalid("inclusion", "must be one of tcp, udp or icmp")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_name() {
        assert!(tenant_name("my tenant").is_ok());
        assert!(tenant_name("x").is_err());
        assert!(tenant_name(" leading").is_err());
    }

    #[test]
    fn test_free_text() {
        assert!(free_text("").is_ok());
        assert!(free_text("Team A: dev@example.com, 'ok'").is_ok());
        assert!(free_text("<script>").is_err());
        assert_eq!("_script_ a_b", sanitize_free_text("<script> a/b"));
    }

    #[test]
    fn test_account_name() {
        assert!(account_name("Admin_1").is_ok());
        assert!(account_name("bad name").is_err());
    }

    #[test]
    fn test_email() {
        assert!(email("user@example.com").is_ok());
        assert!(email("user@").is_err());
    }

    #[test]
    fn test_password_strength() {
        assert!(password_strength(&"secret123".into()).is_ok());
        assert!(password_strength(&"secret!secret".into()).is_ok());
        assert!(password_strength(&"onlyletters".into()).is_err());
        assert!(password_strength(&"s1".into()).is_err());
    }

    #[test]
    fn test_network_values() {
        assert!(bridge("br100").is_ok());
        assert!(bridge("1br").is_err());
        assert!(bridge_interface("eth0.100").is_ok());
        assert!(bridge_interface("eth0.12345").is_err());
        assert!(network_label("private net").is_ok());
        assert!(ipv4_cidr("10.0.0.0/24").is_ok());
        assert!(ipv4_cidr("10.0.0.0").is_err());
        assert!(ipv4_cidr("300.0.0.0/8").is_err());
    }

    #[test]
    fn test_server_name() {
        assert!(server_name("vm-1.example").is_ok());
        assert!(server_name("v").is_err());
        assert!(server_name("my vm").is_err());
    }

    #[test]
    fn test_device_and_protocol() {
        assert!(device("/dev/vdb").is_ok());
        assert!(device("/dev/vdb; rm").is_err());
        assert!(ip_protocol("tcp").is_ok());
        assert!(ip_protocol("gre").is_err());
    }
}
