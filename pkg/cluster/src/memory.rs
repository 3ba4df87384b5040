use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, DashSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::{ClusterError, ClusterGateway, DeleteAck, ObjectHandle};
use pkg_types::object::{ClusterObject, ObjectKind, ObjectState};

type ObjectId = (String, ObjectKind, String);

/// In-process cluster that keeps objects in memory.
///
/// Backs the `memory` cluster mode for local dry-runs and gives tests exact
/// call counts plus failure injection.
#[derive(Default)]
pub struct MemoryCluster {
    objects: DashMap<ObjectId, ObjectState>,
    create_calls: AtomicUsize,
    delete_calls: DashMap<ObjectId, usize>,
    failing_deletes: AtomicUsize,
    failing_creates: DashSet<ObjectKind>,
    latency_ms: AtomicU64,
    next_uid: AtomicU64,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object as if something else had created it.
    pub fn insert(&self, state: ObjectState) {
        let id = (state.namespace.clone(), state.kind, state.name.clone());
        self.objects.insert(id, state);
    }

    pub fn contains(&self, namespace: &str, kind: ObjectKind, name: &str) -> bool {
        self.objects
            .contains_key(&(namespace.to_string(), kind, name.to_string()))
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Delete calls that reached this cluster for one object, failed ones included.
    pub fn delete_calls_for(&self, namespace: &str, kind: ObjectKind, name: &str) -> usize {
        self.delete_calls
            .get(&(namespace.to_string(), kind, name.to_string()))
            .map(|c| *c)
            .unwrap_or(0)
    }

    /// Make the next `n` delete calls fail with `Unavailable`.
    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    /// Make every create of `kind` fail with `Unavailable` until cleared.
    pub fn fail_creates_of(&self, kind: ObjectKind) {
        self.failing_creates.insert(kind);
    }

    pub fn clear_create_failures(&self) {
        self.failing_creates.clear();
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        let ms = self.latency_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    fn take_delete_failure(&self) -> bool {
        self.failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ClusterGateway for MemoryCluster {
    async fn create(
        &self,
        namespace: &str,
        object: &ClusterObject,
    ) -> Result<ObjectHandle, ClusterError> {
        self.simulate_latency().await;
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let kind = object.kind();
        if self.failing_creates.contains(&kind) {
            return Err(ClusterError::Unavailable(format!(
                "injected {} create failure",
                kind
            )));
        }

        let id = (namespace.to_string(), kind, object.name().to_string());
        let mut state = ObjectState::new(kind, namespace, object.name());
        state.labels = object.metadata().labels.clone();
        state.annotations = object.metadata().annotations.clone();
        state.created_at = Some(Utc::now());
        if let ClusterObject::Pod(pod) = object {
            let total = pod.spec.containers.len();
            state.phase = Some("Running".to_string());
            state.ready = Some(format!("{}/{}", total, total));
            state.node = Some("memory-node".to_string());
        }

        match self.objects.entry(id) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(ClusterError::Conflict),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(state);
                let uid = self.next_uid.fetch_add(1, Ordering::SeqCst);
                debug!("memory cluster: created {} {}/{}", kind, namespace, object.name());
                Ok(ObjectHandle {
                    kind,
                    namespace: namespace.to_string(),
                    name: object.name().to_string(),
                    uid: Some(format!("mem-{}", uid)),
                })
            }
        }
    }

    async fn get(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<Option<ObjectState>, ClusterError> {
        self.simulate_latency().await;
        Ok(self
            .objects
            .get(&(namespace.to_string(), kind, name.to_string()))
            .map(|s| s.clone()))
    }

    async fn list(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<ObjectState>, ClusterError> {
        self.simulate_latency().await;
        let wanted = parse_selector(label_selector);
        let mut pods: Vec<ObjectState> = self
            .objects
            .iter()
            .filter(|e| {
                let (ns, kind, _) = e.key();
                ns == namespace
                    && *kind == ObjectKind::Pod
                    && wanted
                        .iter()
                        .all(|(k, v)| e.value().labels.get(k) == Some(v))
            })
            .map(|e| e.value().clone())
            .collect();
        pods.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(pods)
    }

    async fn delete(
        &self,
        namespace: &str,
        kind: ObjectKind,
        name: &str,
    ) -> Result<DeleteAck, ClusterError> {
        self.simulate_latency().await;
        let id = (namespace.to_string(), kind, name.to_string());
        *self.delete_calls.entry(id.clone()).or_insert(0) += 1;

        if self.take_delete_failure() {
            return Err(ClusterError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }
        match self.objects.remove(&id) {
            Some(_) => Ok(DeleteAck::Deleted),
            None => Ok(DeleteAck::NotFound),
        }
    }
}

/// Parse an equality selector (`a=b,c=d`) into key/value pairs.
fn parse_selector(selector: &str) -> BTreeMap<String, String> {
    selector
        .split(',')
        .filter_map(|term| {
            let (k, v) = term.split_once('=')?;
            Some((k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}
