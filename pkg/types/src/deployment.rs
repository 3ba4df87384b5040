use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object::{ObjectKind, ObjectState};
use pkg_constants::labels::{DB_SECRET_SUFFIX, STORAGE_SUFFIX};
use pkg_constants::state::DEPLOYMENTS_PREFIX;

/// Identity of a live deployment: `(namespace, pod name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeploymentKey {
    pub namespace: String,
    pub name: String,
}

impl DeploymentKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key under which the record is persisted.
    pub fn store_key(&self) -> String {
        format!("{}{}/{}", DEPLOYMENTS_PREFIX, self.namespace, self.name)
    }
}

impl std::fmt::Display for DeploymentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// --- Lifecycle state ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecycleState {
    /// Manifest submitted, creation not yet confirmed.
    Pending,
    /// Present in the cluster with an expiry timer running.
    Active,
    /// Deletion submitted, not yet confirmed.
    Deleting,
    /// Confirmed absent.
    Gone,
    /// Gave up after repeated failures; needs manual intervention.
    Failed,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Pending => write!(f, "Pending"),
            LifecycleState::Active => write!(f, "Active"),
            LifecycleState::Deleting => write!(f, "Deleting"),
            LifecycleState::Gone => write!(f, "Gone"),
            LifecycleState::Failed => write!(f, "Failed"),
        }
    }
}

// --- Object references ---

/// Names of the objects that make up one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRefs {
    pub pod: String,
    #[serde(default)]
    pub pvc: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
}

/// Name of the PVC derived from a pod name.
pub fn storage_name(pod: &str) -> String {
    format!("{}{}", pod, STORAGE_SUFFIX)
}

/// Name of the database credential Secret derived from a pod name.
pub fn db_secret_name(pod: &str) -> String {
    format!("{}{}", pod, DB_SECRET_SUFFIX)
}

impl ObjectRefs {
    /// Every object a deployment of `pod` may own. Used when only the pod is known.
    pub fn derived(pod: &str) -> Self {
        Self {
            pod: pod.to_string(),
            pvc: Some(storage_name(pod)),
            service: Some(pod.to_string()),
            secret: Some(db_secret_name(pod)),
        }
    }

    /// All objects in deletion order: the pod first, its dependencies after.
    pub fn deletion_order(&self) -> Vec<(ObjectKind, &str)> {
        let mut refs = vec![(ObjectKind::Pod, self.pod.as_str())];
        if let Some(ref svc) = self.service {
            refs.push((ObjectKind::Service, svc));
        }
        if let Some(ref pvc) = self.pvc {
            refs.push((ObjectKind::PersistentVolumeClaim, pvc));
        }
        if let Some(ref secret) = self.secret {
            refs.push((ObjectKind::Secret, secret));
        }
        refs
    }
}

// --- Deployment record ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Unique per creation, so a redeploy under the same name is distinguishable.
    pub uid: String,
    pub namespace: String,
    pub name: String,
    pub principal: String,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub objects: ObjectRefs,
    /// Failed delete attempts so far.
    #[serde(default)]
    pub delete_attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Set when the pod under this name was never created by us, so teardown
    /// must leave it alone.
    #[serde(default)]
    pub foreign_pod: bool,
}

impl DeploymentRecord {
    pub fn key(&self) -> DeploymentKey {
        DeploymentKey::new(&self.namespace, &self.name)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Objects teardown deletes, pod first.
    pub fn owned_objects(&self) -> Vec<(ObjectKind, &str)> {
        self.objects
            .deletion_order()
            .into_iter()
            .filter(|(kind, _)| !(self.foreign_pod && *kind == ObjectKind::Pod))
            .collect()
    }
}

// --- Views returned to callers ---

/// Status of one deployment: local lifecycle plus what the cluster reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentStatus {
    pub namespace: String,
    pub name: String,
    /// `None` when the pod is known to the cluster but not tracked locally.
    #[serde(default)]
    pub lifecycle: Option<LifecycleState>,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pod: Option<ObjectState>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentReceipt {
    pub namespace: String,
    pub name: String,
    pub state: LifecycleState,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub objects: ObjectRefs,
}

impl From<&DeploymentRecord> for DeploymentReceipt {
    fn from(r: &DeploymentRecord) -> Self {
        Self {
            namespace: r.namespace.clone(),
            name: r.name.clone(),
            state: r.state,
            created_at: r.created_at,
            expires_at: r.expires_at,
            objects: r.objects.clone(),
        }
    }
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_order_starts_with_pod() {
        let refs = ObjectRefs {
            pod: "app".into(),
            pvc: Some("app-storage".into()),
            service: Some("app".into()),
            secret: Some("app-db-secret".into()),
        };
        let order: Vec<ObjectKind> = refs.deletion_order().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            order,
            vec![
                ObjectKind::Pod,
                ObjectKind::Service,
                ObjectKind::PersistentVolumeClaim,
                ObjectKind::Secret
            ]
        );
    }

    #[test]
    fn derived_refs_cover_every_optional_object() {
        let refs = ObjectRefs::derived("my-app");
        assert_eq!(refs.pvc.as_deref(), Some("my-app-storage"));
        assert_eq!(refs.secret.as_deref(), Some("my-app-db-secret"));
        assert_eq!(refs.deletion_order().len(), 4);
    }

    #[test]
    fn foreign_pod_is_left_out_of_teardown() {
        let mut record = DeploymentRecord {
            uid: "u1".into(),
            namespace: "dev".into(),
            name: "app".into(),
            principal: "alice".into(),
            state: LifecycleState::Deleting,
            created_at: Utc::now(),
            expires_at: Utc::now(),
            objects: ObjectRefs::derived("app"),
            delete_attempts: 0,
            last_error: None,
            foreign_pod: false,
        };
        assert_eq!(record.owned_objects()[0], (ObjectKind::Pod, "app"));

        record.foreign_pod = true;
        let kinds: Vec<ObjectKind> = record.owned_objects().into_iter().map(|(k, _)| k).collect();
        assert!(!kinds.contains(&ObjectKind::Pod));
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn store_key_layout() {
        let key = DeploymentKey::new("dev", "my-app");
        assert_eq!(key.store_key(), "/registry/deployments/dev/my-app");
        assert_eq!(key.to_string(), "dev/my-app");
    }
}
