//! Deployment lifetime and sweep timing.

/// How long a deployment lives before the sweep deletes it, in seconds.
pub const DEFAULT_LIFETIME_SECS: u64 = 300;

/// How often the sweep scans for expired deployments, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// The sweep interval may be at most `lifetime / SWEEP_INTERVAL_DIVISOR`.
pub const SWEEP_INTERVAL_DIVISOR: u64 = 2;

/// Failed delete attempts before a deployment is marked `Failed`.
pub const DEFAULT_MAX_DELETE_RETRIES: u32 = 5;

/// Upper bound on a single cluster API call, in seconds.
pub const DEFAULT_CLUSTER_TIMEOUT_SECS: u64 = 10;
