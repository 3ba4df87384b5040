pub mod auth;
pub mod error;
pub mod handlers;
pub mod request_id;
pub mod server;
pub mod service;

use std::sync::Arc;

use auth::PrincipalDirectory;
use service::DeploymentService;

/// Shared application state injected into all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DeploymentService>,
    pub principals: Arc<PrincipalDirectory>,
}
