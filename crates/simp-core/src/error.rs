use std::fmt;

/// Caller errors: the only failures a resolution request can surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    InvalidKind(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidKind(kind) => write!(
                f,
                "invalid constant kind '{kind}'; use one of: sef, kp, densidade, todos"
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A store lookup that could not be answered (connection lost, locked, ...).
///
/// The resolver never propagates this; it logs and moves to the next tier.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupError(pub String);

impl LookupError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store lookup failed: {}", self.0)
    }
}

impl std::error::Error for LookupError {}
