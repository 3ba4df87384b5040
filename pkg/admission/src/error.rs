use thiserror::Error;

/// Client-caused rejection. Never retried; surfaced verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid pod name: {0}")]
    InvalidName(String),

    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("not allowed to deploy into namespace '{0}'")]
    NamespaceForbidden(String),

    #[error("image '{0}' is not in the allowed image list")]
    ImageNotAllowed(String),
}

impl ValidationError {
    /// Stable machine-readable reason code.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "invalid_name",
            Self::InvalidNamespace(_) => "invalid_namespace",
            Self::NamespaceForbidden(_) => "namespace_forbidden",
            Self::ImageNotAllowed(_) => "image_not_allowed",
        }
    }
}

/// The manifest builder was handed input that validation should have rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("manifest invariant violated: {0}")]
pub struct InvariantViolation(pub String);
