//! Local host identity.
//!
//! The host identifier is the name this process registers its store sessions
//! under, and the name the detector looks for in the client list. It is
//! resolved once at startup and never changes afterwards.

use std::fmt;

use thiserror::Error;

/// Errors resolving the local host identifier.
#[derive(Debug, Error)]
pub enum HostResolutionError {
    /// The OS hostname lookup failed.
    #[error("hostname lookup failed: {0}")]
    Lookup(#[from] nix::errno::Errno),

    /// The hostname is not valid UTF-8.
    #[error("hostname is not valid UTF-8")]
    NotUtf8,

    /// The hostname is empty.
    #[error("hostname is empty")]
    Empty,

    /// Store client names cannot contain whitespace.
    #[error("hostname {0:?} contains whitespace")]
    Whitespace(String),
}

/// Identifier distinguishing this host's store sessions from its peers'.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostId(String);

impl HostId {
    /// Validate a host identifier.
    pub fn new(name: impl Into<String>) -> Result<Self, HostResolutionError> {
        let name = name.into();
        if name.is_empty() {
            return Err(HostResolutionError::Empty);
        }
        if name.contains(char::is_whitespace) {
            return Err(HostResolutionError::Whitespace(name));
        }
        Ok(Self(name))
    }

    /// Resolve the OS hostname.
    pub fn resolve() -> Result<Self, HostResolutionError> {
        let raw = nix::unistd::gethostname()?;
        let name = raw.into_string().map_err(|_| HostResolutionError::NotUtf8)?;
        Self::new(name)
    }

    /// Use `configured` when present, otherwise resolve the OS hostname.
    pub fn resolve_or(configured: Option<&str>) -> Result<Self, HostResolutionError> {
        match configured {
            Some(name) => Self::new(name),
            None => Self::resolve(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
