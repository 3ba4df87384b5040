use axum::{
    Extension, Json,
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::AppState;
use crate::error::GatewayError;
use pkg_types::principal::Principal;
use pkg_types::request::DeploymentRequest;

pub async fn create_deployment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<DeploymentRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let receipt = state.service.submit(&principal, &request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_deployments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AxumPath(ns): AxumPath<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let deployments = state.service.list(&principal, &ns).await?;
    Ok(Json(deployments))
}

pub async fn get_deployment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AxumPath((ns, name)): AxumPath<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let status = state.service.status(&principal, &ns, &name).await?;
    Ok(Json(status))
}

pub async fn delete_deployment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    AxumPath((ns, name)): AxumPath<(String, String)>,
) -> Result<impl IntoResponse, GatewayError> {
    let outcome = state.service.delete(&principal, &ns, &name).await?;
    Ok(Json(serde_json::json!({ "namespace": ns, "name": name, "outcome": outcome })))
}
