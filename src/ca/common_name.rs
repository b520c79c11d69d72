use std::fmt;

use serde::{Deserialize, Deserializer};

use super::errors::CaError;

const MAX_LEN: usize = 64;

/// Stem of the root credential files.
const RESERVED: &str = "ca";

/// Identity embedded in an issued certificate.
///
/// The value doubles as a file name in the credential directory and as a
/// command argument, so only ASCII alphanumerics and `.`, `-`, `_`, `@` are
/// accepted. A leading `-` or `.` is rejected so the value can never be read
/// as an option or escape the directory. `ca` is reserved for the root
/// credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommonName(String);

impl CommonName {
    pub fn parse(value: impl Into<String>) -> Result<Self, CaError> {
        let value = value.into();

        if value.is_empty() || value.len() > MAX_LEN {
            return Err(CaError::Validation(format!(
                "common name must be between 1 and {MAX_LEN} characters"
            )));
        }
        if value.starts_with(['-', '.']) {
            return Err(CaError::Validation(
                "common name must not start with '-' or '.'".into(),
            ));
        }
        if value.eq_ignore_ascii_case(RESERVED) {
            return Err(CaError::Validation(format!(
                "common name {value:?} is reserved"
            )));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@')))
        {
            return Err(CaError::Validation(format!(
                "invalid character {c:?} in common name"
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CommonName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CommonName::parse(raw).map_err(serde::de::Error::custom)
    }
}
