/// Errors that can occur when binding UTMI-side components.
#[derive(Debug, thiserror::Error)]
pub enum UtmiError {
    /// A clock domain name was empty.
    #[error("clock domain name must not be empty")]
    EmptyDomain,

    /// A clock domain name contained characters outside `[A-Za-z0-9_]`.
    #[error("invalid clock domain name {0:?} (expected [A-Za-z0-9_]+)")]
    InvalidDomain(String),
}

pub type Result<T> = std::result::Result<T, UtmiError>;
