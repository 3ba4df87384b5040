use axum::{
    Router, middleware,
    routing::{get, post},
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::AppState;
use crate::auth::{PrincipalDirectory, auth_middleware};
use crate::handlers::{deployments, health};
use crate::request_id::request_id_middleware;
use crate::service::DeploymentService;
use pkg_admission::policy::ResourcePolicy;
use pkg_admission::quota::{QuotaGate, QuotaLimits};
use pkg_cluster::ClusterGateway;
use pkg_cluster::kubernetes::KubeGateway;
use pkg_cluster::memory::MemoryCluster;
use pkg_controllers::lifecycle::{LifecycleConfig, LifecycleScheduler};
use pkg_state::client::StateStore;
use pkg_types::config::PrincipalEntry;

/// Which cluster backend the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    /// The cluster from the ambient kubeconfig or in-cluster service account.
    Kube,
    /// Objects kept in process memory. Nothing is scheduled.
    Memory,
}

impl std::str::FromStr for ClusterMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kube" => Ok(Self::Kube),
            "memory" => Ok(Self::Memory),
            other => anyhow::bail!("unknown cluster mode '{}' (expected kube or memory)", other),
        }
    }
}

/// Server configuration resolved by the binary from CLI and config file.
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub data_dir: String,
    pub cluster: ClusterMode,
    pub lifecycle: LifecycleConfig,
    pub quota: QuotaLimits,
    pub policy: Arc<ResourcePolicy>,
    pub principals: Vec<PrincipalEntry>,
}

/// All routes. `/healthz` is public; everything under `/api/v1` needs a bearer token.
pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/deployments", post(deployments::create_deployment))
        .route(
            "/api/v1/namespaces/{ns}/deployments",
            get(deployments::list_deployments),
        )
        .route(
            "/api/v1/namespaces/{ns}/deployments/{name}",
            get(deployments::get_deployment).delete(deployments::delete_deployment),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/healthz", get(health::healthz))
        .merge(api_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Wire the subsystems, reconcile persisted state, then serve until `cancel` fires.
///
/// On shutdown the listener stops accepting, the sweep finishes the pass in
/// flight and the store is closed.
pub async fn start_server(config: ServerConfig, cancel: CancellationToken) -> anyhow::Result<()> {
    let store = StateStore::new(&config.data_dir).await?;

    let cluster: Arc<dyn ClusterGateway> = match config.cluster {
        ClusterMode::Kube => Arc::new(KubeGateway::try_default().await?),
        ClusterMode::Memory => {
            info!("Using in-memory cluster; no workloads will actually run");
            Arc::new(MemoryCluster::new())
        }
    };

    let quota = QuotaGate::with_store(config.quota, store.clone());
    quota.restore().await?;

    let principals = Arc::new(PrincipalDirectory::new(&config.principals));
    info!("Loaded {} principals", principals.len());

    let scheduler = Arc::new(LifecycleScheduler::new(
        store.clone(),
        cluster,
        config.lifecycle,
    ));
    scheduler
        .reconcile(&principals.namespaces(), Utc::now())
        .await?;
    let sweeper = scheduler.clone().start(cancel.child_token());

    let state = AppState {
        service: Arc::new(DeploymentService::new(config.policy, quota, scheduler)),
        principals,
    };

    info!("Starting API server on {}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .await?;

    info!("API server stopped, waiting for the sweep to finish");
    cancel.cancel();
    sweeper.await?;
    store.close().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use pkg_types::deployment::DeploymentReceipt;
    use tower::ServiceExt;

    use crate::error::ErrorBody;

    async fn app() -> Router {
        let store = StateStore::in_memory().await.unwrap();
        let scheduler = Arc::new(LifecycleScheduler::new(
            store,
            Arc::new(MemoryCluster::new()),
            LifecycleConfig::default(),
        ));
        let principals = PrincipalDirectory::new(&[PrincipalEntry {
            token: "alice-token".into(),
            id: "alice".into(),
            namespaces: vec!["dev".into()],
        }]);
        router(AppState {
            service: Arc::new(DeploymentService::new(
                Arc::new(ResourcePolicy::default()),
                QuotaGate::new(QuotaLimits::default()),
                scheduler,
            )),
            principals: Arc::new(principals),
        })
    }

    fn submit(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/deployments")
            .header(header::AUTHORIZATION, "Bearer alice-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_public() {
        let response = app()
            .await
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn api_requires_known_token() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/namespaces/dev/deployments")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/namespaces/dev/deployments")
                    .header(header::AUTHORIZATION, "Bearer mallory")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn submit_get_delete_round() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(submit(serde_json::json!({
                "pod_name": "my-app",
                "namespace": "dev",
                "image": "nginx:1.25-alpine"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let receipt: DeploymentReceipt = json(response).await;
        assert_eq!(receipt.objects.pod, "my-app");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/namespaces/dev/deployments/my-app")
                    .header(header::AUTHORIZATION, "Bearer alice-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        for expected in ["deleted", "already_absent"] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method("DELETE")
                        .uri("/api/v1/namespaces/dev/deployments/my-app")
                        .header(header::AUTHORIZATION, "Bearer alice-token")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value = json(response).await;
            assert_eq!(body["outcome"], expected);
        }
    }

    #[tokio::test]
    async fn rejections_carry_reason_codes() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(submit(serde_json::json!({
                "pod_name": "my-app",
                "namespace": "dev",
                "image": "nginx:latest"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.reason, "image_not_allowed");

        let response = app
            .oneshot(submit(serde_json::json!({
                "pod_name": "my-app",
                "namespace": "prod",
                "image": "nginx:1.25-alpine"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body: ErrorBody = json(response).await;
        assert_eq!(body.reason, "namespace_forbidden");
    }

    #[tokio::test]
    async fn quota_rejection_has_retry_after() {
        let app = app().await;
        for name in ["a1", "a2", "a3"] {
            let response = app
                .clone()
                .oneshot(submit(serde_json::json!({
                    "pod_name": name,
                    "namespace": "dev",
                    "image": "nginx:1.25-alpine"
                })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        let response = app
            .oneshot(submit(serde_json::json!({
                "pod_name": "a4",
                "namespace": "dev",
                "image": "nginx:1.25-alpine"
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[test]
    fn cluster_mode_parses() {
        assert_eq!("kube".parse::<ClusterMode>().unwrap(), ClusterMode::Kube);
        assert_eq!("memory".parse::<ClusterMode>().unwrap(), ClusterMode::Memory);
        assert!("docker".parse::<ClusterMode>().is_err());
    }
}
