use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

use pkg_admission::error::{InvariantViolation, ValidationError};
use pkg_cluster::ClusterError;
use pkg_controllers::lifecycle::LifecycleError;

/// Every way a gateway operation can fail, as seen by callers.
///
/// Messages are safe to return: cluster and storage detail is logged at the
/// conversion point and never carried in the variant.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("deployment quota exhausted, retry in {} seconds", ceil_secs(.retry_after))]
    QuotaExceeded { retry_after: Duration },

    #[error("a deployment with this name already exists")]
    ClusterConflict,

    #[error("the cluster is unavailable, try again later")]
    ClusterUnavailable,

    #[error("the cluster did not answer in time; the outcome is unknown")]
    Timeout,

    #[error("deployment not found")]
    NotFound,

    #[error("internal error")]
    InternalInvariantViolation,

    #[error("internal storage error")]
    Storage,
}

impl GatewayError {
    /// Stable machine-readable reason code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.reason(),
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::ClusterConflict => "cluster_conflict",
            Self::ClusterUnavailable => "cluster_unavailable",
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::InternalInvariantViolation => "internal_invariant_violation",
            Self::Storage => "storage_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(ValidationError::NamespaceForbidden(_)) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::ClusterConflict => StatusCode::CONFLICT,
            Self::ClusterUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalInvariantViolation | Self::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn ceil_secs(d: &Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

impl From<ClusterError> for GatewayError {
    fn from(e: ClusterError) -> Self {
        match e {
            ClusterError::NotFound => Self::NotFound,
            ClusterError::Conflict => Self::ClusterConflict,
            ClusterError::Timeout => Self::Timeout,
            ClusterError::Unavailable(detail) => {
                warn!("Cluster unavailable: {}", detail);
                Self::ClusterUnavailable
            }
            ClusterError::Invalid(detail) => {
                error!("API server rejected a generated object: {}", detail);
                Self::InternalInvariantViolation
            }
        }
    }
}

impl From<LifecycleError> for GatewayError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::AlreadyExists(_) => Self::ClusterConflict,
            LifecycleError::Cluster(e) => e.into(),
            LifecycleError::Storage(e) => {
                error!("State store failure: {:#}", e);
                Self::Storage
            }
        }
    }
}

impl From<InvariantViolation> for GatewayError {
    fn from(e: InvariantViolation) -> Self {
        error!("{}", e);
        Self::InternalInvariantViolation
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub reason: String,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            reason: self.reason().to_string(),
            message: self.to_string(),
        };
        let mut response = (self.status_code(), Json(body)).into_response();
        if let Self::QuotaExceeded { retry_after } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(ceil_secs(&retry_after)));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_are_stable() {
        let cases = [
            (
                GatewayError::Validation(ValidationError::ImageNotAllowed("x".into())),
                "image_not_allowed",
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::Validation(ValidationError::NamespaceForbidden("prod".into())),
                "namespace_forbidden",
                StatusCode::FORBIDDEN,
            ),
            (GatewayError::ClusterConflict, "cluster_conflict", StatusCode::CONFLICT),
            (GatewayError::Timeout, "timeout", StatusCode::GATEWAY_TIMEOUT),
            (GatewayError::NotFound, "not_found", StatusCode::NOT_FOUND),
        ];
        for (err, reason, status) in cases {
            assert_eq!(err.reason(), reason);
            assert_eq!(err.status_code(), status);
        }
    }

    #[test]
    fn cluster_detail_is_not_exposed() {
        let err: GatewayError = ClusterError::Unavailable("etcd leader lost at 10.0.0.3".into()).into();
        assert_eq!(err.reason(), "cluster_unavailable");
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn quota_rejection_sets_retry_after() {
        let err = GatewayError::QuotaExceeded {
            retry_after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "deployment quota exhausted, retry in 2 seconds");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }
}
