//! Per-principal admission quota defaults.

/// Deployments a principal may make inside one window.
pub const DEFAULT_MAX_DEPLOYMENTS: usize = 3;

/// Length of the trailing quota window, in seconds.
pub const DEFAULT_WINDOW_SECS: u64 = 3600;
