//! Default resource and security policy values.

/// Images a user may deploy unless the config file overrides the list.
pub const DEFAULT_ALLOWED_IMAGES: &[&str] = &[
    "nginx:1.25-alpine",
    "node:20-alpine",
    "python:3.11-slim",
    "golang:1.21-alpine",
    "openjdk:17-slim",
    "redis:7-alpine",
];

/// Image used for the optional database sidecar.
pub const DEFAULT_DATABASE_IMAGE: &str = "postgres:16-alpine";

/// Fixed memory request for every container.
pub const MEMORY_REQUEST: &str = "256Mi";

/// Fixed memory limit for every container.
pub const MEMORY_LIMIT: &str = "512Mi";

/// Fixed CPU request for every container.
pub const CPU_REQUEST: &str = "100m";

/// Fixed CPU limit for every container.
pub const CPU_LIMIT: &str = "500m";

/// Fixed size of the optional persistent volume claim.
pub const STORAGE_SIZE: &str = "10Gi";

/// UID/GID every container runs as.
pub const RUN_AS_USER: i64 = 1000;

/// Substrings a pod name may not contain.
pub const RESERVED_NAME_FRAGMENTS: &[&str] = &["kube", "system", "default"];

/// Maximum length of a DNS-1123 label.
pub const MAX_NAME_LENGTH: usize = 63;
