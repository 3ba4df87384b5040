//! Network-related constants.

/// Default port for the gateway API server.
pub const DEFAULT_API_PORT: u16 = 8000;

/// Port exposed by the generated Service.
pub const SERVICE_PORT: i32 = 80;

/// Container port the generated Service forwards to.
pub const SERVICE_TARGET_PORT: i32 = 8080;

/// Port the database sidecar listens on inside the pod.
pub const DATABASE_PORT: u16 = 5432;
