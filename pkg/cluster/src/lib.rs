//! The only seam that talks to the Kubernetes API.
//!
//! Everything above this crate sees the cluster as four namespaced
//! operations: create, get, list and delete.

pub mod kubernetes;
pub mod memory;

use async_trait::async_trait;
use pkg_types::object::{ClusterObject, ObjectKind, ObjectState};
use thiserror::Error;

/// Failure talking to the cluster.
///
/// The `String` payloads carry API detail for logs only; they never cross the
/// gateway boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("object not found")]
    NotFound,

    #[error("object already exists")]
    Conflict,

    #[error("object rejected by the API server: {0}")]
    Invalid(String),

    #[error("cluster unavailable: {0}")]
    Unavailable(String),

    #[error("cluster call timed out")]
    Timeout,
}

/// Reference to an object the cluster accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
    pub uid: Option<String>,
}

/// Result of a delete call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteAck {
    Deleted,
    NotFound,
}

#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn create(
        &self,
        namespace: &str,
        object: &ClusterObject,
    ) -> Result<ObjectHandle, ClusterError>;

    /// `Ok(None)` when the object does not exist.
    async fn get(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<Option<ObjectState>, ClusterError>;

    /// List pods in `namespace` matching an equality `label_selector` (`k=v,k2=v2`).
    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ObjectState>, ClusterError>;

    async fn delete(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<DeleteAck, ClusterError>;
}
