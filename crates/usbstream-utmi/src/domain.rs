use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UtmiError};

/// Name of the domain USB stream components are clocked from unless told otherwise.
pub const DEFAULT_DOMAIN: &str = "usb";

/// The clock domain a synchronous component belongs to.
///
/// A component is evaluated once per step of exactly one domain. The name is a
/// binding concern only: it selects which clock drives the steps and shows up
/// in diagnostics, but has no effect on behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockDomain(String);

impl ClockDomain {
    /// Bind to a named domain.
    ///
    /// Names follow identifier rules (`[A-Za-z0-9_]+`), matching the names a
    /// gateware toolchain would accept for a clock domain.
    pub fn named(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(UtmiError::EmptyDomain);
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(UtmiError::InvalidDomain(name));
        }
        Ok(Self(name))
    }

    /// The domain name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// True when this is the default `usb` domain.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_DOMAIN
    }
}

impl Default for ClockDomain {
    fn default() -> Self {
        Self(DEFAULT_DOMAIN.to_string())
    }
}

impl fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClockDomain {
    type Err = UtmiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::named(s)
    }
}

impl TryFrom<String> for ClockDomain {
    type Error = UtmiError;

    fn try_from(value: String) -> Result<Self> {
        Self::named(value)
    }
}

impl From<ClockDomain> for String {
    fn from(domain: ClockDomain) -> Self {
        domain.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_usb() {
        let domain = ClockDomain::default();
        assert_eq!(domain.name(), "usb");
        assert!(domain.is_default());
    }

    #[test]
    fn named_alternate_domain() {
        let domain = ClockDomain::named("usb_io").unwrap();
        assert_eq!(domain.to_string(), "usb_io");
        assert!(!domain.is_default());
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(ClockDomain::named(""), Err(UtmiError::EmptyDomain)));
    }

    #[test]
    fn rejects_non_identifier_name() {
        let err = "usb-fast".parse::<ClockDomain>().unwrap_err();
        assert!(matches!(err, UtmiError::InvalidDomain(name) if name == "usb-fast"));
    }

    #[test]
    fn serde_validates_name() {
        let domain: ClockDomain = serde_json::from_str("\"sync\"").unwrap();
        assert_eq!(domain.name(), "sync");
        assert!(serde_json::from_str::<ClockDomain>("\"no spaces\"").is_err());
    }
}
