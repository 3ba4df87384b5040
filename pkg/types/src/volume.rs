use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::object::ObjectMeta;

/// Volume mount inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Volume source — where the storage comes from.
///
/// Host paths are intentionally not representable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VolumeSource {
    /// An empty directory created when the pod starts, deleted when it stops
    EmptyDir {},
    /// A persistent volume claim reference
    PersistentVolumeClaim { claim_name: String },
}

/// Named volume in a pod spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    #[serde(flatten)]
    pub source: VolumeSource,
}

impl Volume {
    pub fn empty_dir(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: VolumeSource::EmptyDir {},
        }
    }

    pub fn claim(name: &str, claim_name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: VolumeSource::PersistentVolumeClaim {
                claim_name: claim_name.to_string(),
            },
        }
    }
}

// --- Persistent Volume Claims ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    pub requests: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistentVolumeClaimSpec {
    pub access_modes: Vec<String>,
    pub resources: StorageRequest,
}

/// Persistent Volume Claim — a request for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaim {
    pub metadata: ObjectMeta,
    pub spec: PersistentVolumeClaimSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volumes_use_kubernetes_shape() {
        let v = serde_json::to_value(Volume::claim("data", "my-app-storage")).unwrap();
        assert_eq!(
            v,
            serde_json::json!({
                "name": "data",
                "persistentVolumeClaim": { "claimName": "my-app-storage" }
            })
        );
        let v = serde_json::to_value(Volume::empty_dir("tmp")).unwrap();
        assert_eq!(v, serde_json::json!({ "name": "tmp", "emptyDir": {} }));
    }
}
