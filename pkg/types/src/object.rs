use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pod::Pod;
use crate::secret::Secret;
use crate::service::Service;
use crate::volume::PersistentVolumeClaim;

/// Kinds of cluster objects the gateway creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    Pod,
    PersistentVolumeClaim,
    Service,
    Secret,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Pod => write!(f, "Pod"),
            ObjectKind::PersistentVolumeClaim => write!(f, "PersistentVolumeClaim"),
            ObjectKind::Service => write!(f, "Service"),
            ObjectKind::Secret => write!(f, "Secret"),
        }
    }
}

/// Metadata shared by every generated object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// A fully specified object ready to be submitted to the cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterObject {
    Pod(Pod),
    PersistentVolumeClaim(PersistentVolumeClaim),
    Service(Service),
    Secret(Secret),
}

impl ClusterObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            ClusterObject::Pod(_) => ObjectKind::Pod,
            ClusterObject::PersistentVolumeClaim(_) => ObjectKind::PersistentVolumeClaim,
            ClusterObject::Service(_) => ObjectKind::Service,
            ClusterObject::Secret(_) => ObjectKind::Secret,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ClusterObject::Pod(o) => &o.metadata,
            ClusterObject::PersistentVolumeClaim(o) => &o.metadata,
            ClusterObject::Service(o) => &o.metadata,
            ClusterObject::Secret(o) => &o.metadata,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Serialize to the JSON shape the Kubernetes API expects (`apiVersion`/`kind` included).
    pub fn to_api_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut value = match self {
            ClusterObject::Pod(o) => serde_json::to_value(o)?,
            ClusterObject::PersistentVolumeClaim(o) => serde_json::to_value(o)?,
            ClusterObject::Service(o) => serde_json::to_value(o)?,
            ClusterObject::Secret(o) => serde_json::to_value(o)?,
        };
        if let Some(map) = value.as_object_mut() {
            map.insert("apiVersion".into(), "v1".into());
            map.insert("kind".into(), self.kind().to_string().into());
        }
        Ok(value)
    }
}

/// Observed state of an object as reported by the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectState {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Pod phase (`Pending`, `Running`, ...). Only set for pods.
    #[serde(default)]
    pub phase: Option<String>,
    /// Ready containers as `ready/total`. Only set for pods.
    #[serde(default)]
    pub ready: Option<String>,
    #[serde(default)]
    pub restarts: u32,
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectState {
    pub fn new(kind: ObjectKind, namespace: &str, name: &str) -> Self {
        Self {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            phase: None,
            ready: None,
            restarts: 0,
            node: None,
            ip: None,
            created_at: None,
        }
    }
}
