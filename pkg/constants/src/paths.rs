//! Filesystem path constants.

// ─── Gateway ───────────────────────────────────────────────────────────────

/// Default config file path for the gateway server.
pub const DEFAULT_SERVER_CONFIG: &str = "/etc/paved-roads/config.yaml";

/// Default data directory for the gateway state store.
pub const DEFAULT_SERVER_DATA_DIR: &str = "/tmp/paved-roads-data";

// ─── Inside deployed pods ──────────────────────────────────────────────────

/// Writable scratch directory (the root filesystem is read-only).
pub const TMP_MOUNT_PATH: &str = "/tmp";

/// Mount point of the persistent volume claim when storage is requested.
pub const STORAGE_MOUNT_PATH: &str = "/data";

/// Data directory of the database sidecar.
pub const DATABASE_DATA_PATH: &str = "/var/lib/postgresql/data";

/// Socket directory of the database sidecar.
pub const DATABASE_RUN_PATH: &str = "/var/run/postgresql";
