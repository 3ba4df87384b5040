//! State store key layout.

/// Prefix of persisted deployment records: `<prefix><namespace>/<name>`.
pub const DEPLOYMENTS_PREFIX: &str = "/registry/deployments/";

/// Prefix of persisted quota windows: `<prefix><principal>`.
pub const QUOTA_PREFIX: &str = "/registry/quota/";
