use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Secret, Service};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::{debug, info};

use crate::{ClusterError, ClusterGateway, DeleteAck, ObjectHandle};
use pkg_types::object::{ClusterObject, ObjectKind, ObjectState};

/// Cluster gateway backed by kube-rs.
#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
}

impl KubeGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using in-cluster config, falling back to the local kubeconfig.
    pub async fn try_default() -> anyhow::Result<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load Kubernetes config: {}", e))?;
        info!("Kubernetes client initialized");
        Ok(Self::new(client))
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn create_as<K>(
        &self,
        namespace: &str,
        kind: ObjectKind,
        value: serde_json::Value,
    ) -> Result<ObjectHandle, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned
            + Serialize,
    {
        let object: K = serde_json::from_value(value)
            .map_err(|e| ClusterError::Invalid(format!("{} conversion failed: {}", kind, e)))?;
        let created = self
            .api::<K>(namespace)
            .create(&PostParams::default(), &object)
            .await
            .map_err(map_kube_error)?;
        Ok(ObjectHandle {
            kind,
            namespace: namespace.to_string(),
            name: created.name_any(),
            uid: created.uid(),
        })
    }

    async fn get_as<K>(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<Option<ObjectState>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        let found = self
            .api::<K>(namespace)
            .get_opt(name)
            .await
            .map_err(map_kube_error)?;
        Ok(found.map(|obj| meta_state(kind, &obj)))
    }

    async fn delete_as<K>(&self, namespace: &str, name: &str) -> Result<DeleteAck, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Debug
            + DeserializeOwned,
    {
        match self
            .api::<K>(namespace)
            .delete(name, &DeleteParams::default())
            .await
        {
            Ok(_) => Ok(DeleteAck::Deleted),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                debug!("{}/{} already deleted", namespace, name);
                Ok(DeleteAck::NotFound)
            }
            Err(e) => Err(map_kube_error(e)),
        }
    }
}

#[async_trait]
impl ClusterGateway for KubeGateway {
    async fn create(
        &self,
        namespace: &str,
        object: &ClusterObject,
    ) -> Result<ObjectHandle, ClusterError> {
        let kind = object.kind();
        let value = object
            .to_api_json()
            .map_err(|e| ClusterError::Invalid(format!("{} serialization failed: {}", kind, e)))?;
        match kind {
            ObjectKind::Pod => self.create_as::<Pod>(namespace, kind, value).await,
            ObjectKind::PersistentVolumeClaim => {
                self.create_as::<PersistentVolumeClaim>(namespace, kind, value)
                    .await
            }
            ObjectKind::Service => self.create_as::<Service>(namespace, kind, value).await,
            ObjectKind::Secret => self.create_as::<Secret>(namespace, kind, value).await,
        }
    }

    async fn get(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<Option<ObjectState>, ClusterError> {
        match kind {
            ObjectKind::Pod => {
                let pod = self
                    .api::<Pod>(namespace)
                    .get_opt(name)
                    .await
                    .map_err(map_kube_error)?;
                Ok(pod.as_ref().map(pod_state))
            }
            ObjectKind::PersistentVolumeClaim => {
                self.get_as::<PersistentVolumeClaim>(namespace, kind, name)
                    .await
            }
            ObjectKind::Service => self.get_as::<Service>(namespace, kind, name).await,
            ObjectKind::Secret => self.get_as::<Secret>(namespace, kind, name).await,
        }
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ObjectState>, ClusterError> {
        let pods = self
            .api::<Pod>(namespace)
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(map_kube_error)?;
        Ok(pods.items.iter().map(pod_state).collect())
    }

    async fn delete(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<DeleteAck, ClusterError> {
        match kind {
            ObjectKind::Pod => self.delete_as::<Pod>(namespace, name).await,
            ObjectKind::PersistentVolumeClaim => {
                self.delete_as::<PersistentVolumeClaim>(namespace, name)
                    .await
            }
            ObjectKind::Service => self.delete_as::<Service>(namespace, name).await,
            ObjectKind::Secret => self.delete_as::<Secret>(namespace, name).await,
        }
    }
}

fn map_kube_error(e: kube::Error) -> ClusterError {
    match e {
        kube::Error::Api(ae) => match ae.code {
            404 => ClusterError::NotFound,
            409 => ClusterError::Conflict,
            400 | 422 => ClusterError::Invalid(ae.message),
            code => ClusterError::Unavailable(format!("{} ({}): {}", ae.reason, code, ae.message)),
        },
        other => ClusterError::Unavailable(other.to_string()),
    }
}

fn meta_state<K: Resource>(kind: ObjectKind, obj: &K) -> ObjectState {
    let meta = obj.meta();
    let mut state = ObjectState::new(
        kind,
        meta.namespace.as_deref().unwrap_or_default(),
        meta.name.as_deref().unwrap_or_default(),
    );
    state.labels = meta.labels.clone().unwrap_or_default();
    state.annotations = meta.annotations.clone().unwrap_or_default();
    state.created_at = meta.creation_timestamp.as_ref().map(|t| t.0);
    state
}

fn pod_state(pod: &Pod) -> ObjectState {
    let mut state = meta_state(ObjectKind::Pod, pod);
    let total = pod.spec.as_ref().map(|s| s.containers.len()).unwrap_or(0);
    if let Some(status) = pod.status.as_ref() {
        let statuses = status.container_statuses.as_deref().unwrap_or_default();
        let ready = statuses.iter().filter(|c| c.ready).count();
        state.phase = status.phase.clone();
        state.ready = Some(format!("{}/{}", ready, total));
        state.restarts = statuses
            .iter()
            .map(|c| c.restart_count.max(0) as u32)
            .sum();
        state.ip = status.pod_ip.clone();
    }
    state.node = pod.spec.as_ref().and_then(|s| s.node_name.clone());
    state
}
