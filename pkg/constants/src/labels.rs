//! Label and annotation keys stamped on every managed object.

/// Selector label shared by the pod and its Service.
pub const APP_LABEL: &str = "app";

pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

pub const MANAGED_BY_VALUE: &str = "paved-roads";

/// Label selector matching every object created by the gateway.
pub const MANAGED_SELECTOR: &str = "app.kubernetes.io/managed-by=paved-roads";

/// Sanitized principal id (label values are restricted to 63 chars of `[A-Za-z0-9._-]`).
pub const PRINCIPAL_LABEL: &str = "paved-roads/principal";

/// Creation time as unix seconds.
pub const CREATED_AT_LABEL: &str = "paved-roads/created-at";

/// Raw principal id.
pub const PRINCIPAL_ANNOTATION: &str = "paved-roads/principal-id";

/// RFC3339 creation time.
pub const CREATED_AT_ANNOTATION: &str = "paved-roads/created-at";

/// RFC3339 scheduled deletion time.
pub const EXPIRES_AT_ANNOTATION: &str = "paved-roads/expires-at";

/// Suffix of the derived PVC name.
pub const STORAGE_SUFFIX: &str = "-storage";

/// Suffix of the derived database credential Secret name.
pub const DB_SECRET_SUFFIX: &str = "-db-secret";
