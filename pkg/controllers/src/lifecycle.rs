use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use pkg_cluster::{ClusterError, ClusterGateway, DeleteAck};
use pkg_constants::labels::{
    CREATED_AT_LABEL, MANAGED_BY_LABEL, MANAGED_BY_VALUE, MANAGED_SELECTOR, PRINCIPAL_ANNOTATION,
    PRINCIPAL_LABEL,
};
use pkg_constants::lifecycle::{
    DEFAULT_CLUSTER_TIMEOUT_SECS, DEFAULT_LIFETIME_SECS, DEFAULT_MAX_DELETE_RETRIES,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use pkg_constants::state::DEPLOYMENTS_PREFIX;
use pkg_state::client::StateStore;
use pkg_types::deployment::{
    DeleteOutcome, DeploymentKey, DeploymentRecord, DeploymentStatus, LifecycleState, ObjectRefs,
};
use pkg_types::object::{ClusterObject, ObjectKind, ObjectState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub lifetime: Duration,
    pub sweep_interval: Duration,
    /// Failed delete attempts before a deployment is marked `Failed`.
    pub max_delete_retries: u32,
    /// Upper bound on any single cluster call.
    pub cluster_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            lifetime: Duration::from_secs(DEFAULT_LIFETIME_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            max_delete_retries: DEFAULT_MAX_DELETE_RETRIES,
            cluster_timeout: Duration::from_secs(DEFAULT_CLUSTER_TIMEOUT_SECS),
        }
    }
}

#[derive(Error, Debug)]
pub enum LifecycleError {
    /// A record for this key exists in some state; it must be deleted first.
    #[error("deployment {0} already exists")]
    AlreadyExists(DeploymentKey),

    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// A built manifest ready to be applied for one key.
#[derive(Debug, Clone)]
pub struct Submission {
    pub key: DeploymentKey,
    pub principal: String,
    pub created_at: DateTime<Utc>,
    pub refs: ObjectRefs,
    /// In creation order.
    pub objects: Vec<ClusterObject>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub retrying: usize,
    pub failed: usize,
    /// Stored records that could not be decoded and were left alone.
    pub unreadable: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Active or Deleting records picked up again by the sweep.
    pub resumed: usize,
    /// Pending records whose pod turned out to exist.
    pub confirmed: usize,
    /// Records whose pod was missing and whose leftovers were removed.
    pub cleaned: usize,
    /// Managed pods with no local record.
    pub adopted: usize,
}

enum Expired {
    Deleted,
    Retrying,
    Failed,
    Skipped,
}

/// Owns the expiry record of every deployment and guarantees its teardown.
///
/// Every operation on one `(namespace, name)` key runs inside that key's slot,
/// so create, delete and expire never overlap for the same deployment.
/// Different keys proceed concurrently.
pub struct LifecycleScheduler {
    store: StateStore,
    cluster: Arc<dyn ClusterGateway>,
    config: LifecycleConfig,
    slots: DashMap<DeploymentKey, Arc<Mutex<()>>>,
}

impl LifecycleScheduler {
    pub fn new(store: StateStore, cluster: Arc<dyn ClusterGateway>, config: LifecycleConfig) -> Self {
        Self {
            store,
            cluster,
            config,
            slots: DashMap::new(),
        }
    }

    pub fn config(&self) -> LifecycleConfig {
        self.config
    }

    /// When a deployment created at `created_at` is due for deletion.
    pub fn expiry_for(&self, created_at: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::from_std(self.config.lifetime)
            .ok()
            .and_then(|lifetime| created_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Start the sweep loop. It stops after the pass in flight when `cancel` fires.
    pub fn start(self: Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "LifecycleScheduler started (lifetime={}s, interval={}s)",
                self.config.lifetime.as_secs(),
                self.config.sweep_interval.as_secs()
            );
            let mut interval = tokio::time::interval(self.config.sweep_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = self.sweep(Utc::now()).await {
                            warn!("LifecycleScheduler sweep error: {}", e);
                        }
                    }
                }
            }
            info!("LifecycleScheduler stopped");
        })
    }

    // --- Per-key slots ---

    async fn lock(&self, key: &DeploymentKey) -> OwnedMutexGuard<()> {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        slot.lock_owned().await
    }

    fn release(&self, key: &DeploymentKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        // Only the map holds the slot: nobody is waiting on it.
        self.slots.remove_if(key, |_, slot| Arc::strong_count(slot) == 1);
    }

    // --- Create ---

    /// Persist a `Pending` record, apply the objects in order and mark the
    /// deployment `Active` with its expiry.
    ///
    /// On a failed create the objects already applied are rolled back. A
    /// timeout leaves the record `Active` since the outcome is unknown; the
    /// sweep removes whatever did get created once it expires.
    ///
    /// The work runs on its own task, so dropping the returned future does not
    /// stop it half way with a `Pending` record the sweep never looks at.
    pub async fn create(
        self: &Arc<Self>,
        submission: Submission,
    ) -> Result<DeploymentRecord, LifecycleError> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let key = submission.key.clone();
            let guard = this.lock(&key).await;
            let result = this.create_locked(submission).await;
            this.release(&key, guard);
            result
        })
        .await
        .map_err(|e| LifecycleError::Storage(anyhow::anyhow!("create task failed: {}", e)))?
    }

    async fn create_locked(&self, submission: Submission) -> Result<DeploymentRecord, LifecycleError> {
        let key = submission.key;
        if let Some(existing) = self.load(&key).await? {
            debug!("Refusing to create {}: record exists ({})", key, existing.state);
            return Err(LifecycleError::AlreadyExists(key));
        }
        // An untracked pod under this name is not ours to touch.
        if self
            .bounded(self.cluster.get(&key.namespace, ObjectKind::Pod, &key.name))
            .await?
            .is_some()
        {
            return Err(ClusterError::Conflict.into());
        }

        let mut record = DeploymentRecord {
            uid: uuid::Uuid::new_v4().to_string(),
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            principal: submission.principal,
            state: LifecycleState::Pending,
            created_at: submission.created_at,
            expires_at: self.expiry_for(submission.created_at),
            objects: submission.refs,
            delete_attempts: 0,
            last_error: None,
            foreign_pod: false,
        };
        self.save(&record).await?;

        let mut created: Vec<(ObjectKind, String)> = Vec::new();
        for object in &submission.objects {
            let (kind, name) = (object.kind(), object.name());
            match self.bounded(self.cluster.create(&key.namespace, object)).await {
                Ok(_) => {
                    debug!("Created {} {}/{}", kind, key.namespace, name);
                    created.push((kind, name.to_string()));
                }
                Err(ClusterError::Timeout) => {
                    warn!(
                        "Timed out creating {} {}/{}; outcome unknown, expiry stays armed",
                        kind, key.namespace, name
                    );
                    record.state = LifecycleState::Active;
                    record.last_error = Some(ClusterError::Timeout.to_string());
                    self.save(&record).await?;
                    return Err(ClusterError::Timeout.into());
                }
                Err(e) => {
                    warn!("Creating {} {}/{} failed: {}", kind, key.namespace, name, e);
                    self.roll_back(&mut record, &created, &e).await?;
                    return Err(e.into());
                }
            }
        }

        record.state = LifecycleState::Active;
        self.save(&record).await?;
        info!(
            "Deployment {} active for {}, expires at {}",
            key,
            record.principal,
            record.expires_at.to_rfc3339()
        );
        Ok(record)
    }

    async fn roll_back(
        &self,
        record: &mut DeploymentRecord,
        created: &[(ObjectKind, String)],
        cause: &ClusterError,
    ) -> Result<(), LifecycleError> {
        for (kind, name) in created.iter().rev() {
            if let Err(e) = self
                .bounded(self.cluster.delete(&record.namespace, *kind, name))
                .await
            {
                warn!(
                    "Rollback of {} {}/{} failed: {}; leaving it to the sweep",
                    kind, record.namespace, name, e
                );
                record.objects = created_refs(&record.name, created);
                record.foreign_pod = !created.iter().any(|(k, _)| *k == ObjectKind::Pod);
                record.state = LifecycleState::Deleting;
                record.last_error = Some(cause.to_string());
                self.save(record).await?;
                return Ok(());
            }
        }
        self.store.delete(&record.key().store_key()).await?;
        Ok(())
    }

    // --- Delete ---

    /// Delete a deployment on request.
    ///
    /// A key with no record is reported as already absent without touching the cluster.
    pub async fn delete(&self, key: &DeploymentKey) -> Result<DeleteOutcome, LifecycleError> {
        let guard = self.lock(key).await;
        let result = self.delete_locked(key).await;
        self.release(key, guard);
        result
    }

    async fn delete_locked(&self, key: &DeploymentKey) -> Result<DeleteOutcome, LifecycleError> {
        let Some(mut record) = self.load(key).await? else {
            debug!("Delete of {}: no record, already absent", key);
            return Ok(DeleteOutcome::AlreadyAbsent);
        };
        info!("Deleting {} on request (was {})", key, record.state);
        match self.teardown(&mut record).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(LifecycleError::Cluster(e)) => {
                self.record_failure(&mut record, &e).await?;
                Err(e.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Mark the record `Deleting`, delete every object pod first, then drop the record.
    async fn teardown(&self, record: &mut DeploymentRecord) -> Result<(), LifecycleError> {
        if record.state != LifecycleState::Deleting {
            record.state = LifecycleState::Deleting;
            self.save(record).await?;
        }
        for (kind, name) in record.owned_objects() {
            match self
                .bounded(self.cluster.delete(&record.namespace, kind, name))
                .await?
            {
                DeleteAck::Deleted => debug!("Deleted {} {}/{}", kind, record.namespace, name),
                DeleteAck::NotFound => {
                    debug!("{} {}/{} already gone", kind, record.namespace, name)
                }
            }
        }
        self.store.delete(&record.key().store_key()).await?;
        info!("Deployment {} gone", record.key());
        Ok(())
    }

    async fn record_failure(
        &self,
        record: &mut DeploymentRecord,
        cause: &ClusterError,
    ) -> Result<LifecycleState, LifecycleError> {
        record.delete_attempts += 1;
        record.last_error = Some(cause.to_string());
        if record.delete_attempts >= self.config.max_delete_retries {
            record.state = LifecycleState::Failed;
            error!(
                "Giving up on {} after {} delete attempts ({}); manual cleanup required",
                record.key(),
                record.delete_attempts,
                cause
            );
        } else {
            record.state = LifecycleState::Deleting;
            warn!(
                "Delete of {} failed (attempt {}/{}): {}",
                record.key(),
                record.delete_attempts,
                self.config.max_delete_retries,
                cause
            );
        }
        self.save(record).await?;
        Ok(record.state)
    }

    // --- Sweep ---

    /// Delete every deployment due at `now`: expired `Active` ones and `Deleting`
    /// ones awaiting a retry.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport, LifecycleError> {
        let (records, unreadable) = self.scan().await?;
        let due: Vec<DeploymentRecord> = records.into_iter().filter(|r| is_due(r, now)).collect();
        if due.is_empty() {
            return Ok(SweepReport {
                unreadable,
                ..SweepReport::default()
            });
        }
        debug!("Sweep found {} due deployments", due.len());

        let outcomes = join_all(due.iter().map(|r| self.expire(r.key(), &r.uid, now))).await;
        let mut report = SweepReport {
            unreadable,
            ..SweepReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(Expired::Deleted) => report.deleted += 1,
                Ok(Expired::Retrying) => report.retrying += 1,
                Ok(Expired::Failed) => report.failed += 1,
                Ok(Expired::Skipped) => {}
                Err(e) => warn!("Sweep step failed: {}", e),
            }
        }
        info!(
            "Sweep: {} deleted, {} retrying, {} failed",
            report.deleted, report.retrying, report.failed
        );
        Ok(report)
    }

    async fn expire(
        &self,
        key: DeploymentKey,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Expired, LifecycleError> {
        let guard = self.lock(&key).await;
        let result = self.expire_locked(&key, uid, now).await;
        self.release(&key, guard);
        result
    }

    async fn expire_locked(
        &self,
        key: &DeploymentKey,
        uid: &str,
        now: DateTime<Utc>,
    ) -> Result<Expired, LifecycleError> {
        // Deleted, or deleted and recreated, while this pass waited for the slot.
        let Some(mut record) = self.load(key).await? else {
            return Ok(Expired::Skipped);
        };
        if record.uid != uid || !is_due(&record, now) {
            return Ok(Expired::Skipped);
        }
        if record.state == LifecycleState::Active {
            info!(
                "Deployment {} expired at {}, deleting",
                key,
                record.expires_at.to_rfc3339()
            );
        }
        match self.teardown(&mut record).await {
            Ok(()) => Ok(Expired::Deleted),
            Err(LifecycleError::Cluster(e)) => match self.record_failure(&mut record, &e).await? {
                LifecycleState::Failed => Ok(Expired::Failed),
                _ => Ok(Expired::Retrying),
            },
            Err(e) => Err(e),
        }
    }

    // --- Startup reconciliation ---

    /// Bring persisted records in line with the cluster before sweeping resumes,
    /// then adopt managed pods in `namespaces` that have no record.
    pub async fn reconcile(
        &self,
        namespaces: &[String],
        now: DateTime<Utc>,
    ) -> Result<ReconcileReport, LifecycleError> {
        let mut report = ReconcileReport::default();
        let records = self.records().await?;
        for record in &records {
            let key = record.key();
            let guard = self.lock(&key).await;
            let result = self.reconcile_record(&key, &mut report).await;
            self.release(&key, guard);
            if let Err(e) = result {
                warn!("Reconciling {} failed: {}", key, e);
            }
        }

        let known: HashSet<DeploymentKey> = records.iter().map(|r| r.key()).collect();
        for namespace in namespaces {
            let pods = match self
                .bounded(self.cluster.list(namespace, MANAGED_SELECTOR))
                .await
            {
                Ok(pods) => pods,
                Err(e) => {
                    warn!("Listing managed pods in {} failed: {}", namespace, e);
                    continue;
                }
            };
            for pod in pods {
                if known.contains(&DeploymentKey::new(&pod.namespace, &pod.name)) {
                    continue;
                }
                if self.adopt(&pod, now).await? {
                    report.adopted += 1;
                }
            }
        }

        info!(
            "Reconciled: {} resumed, {} confirmed, {} cleaned, {} adopted",
            report.resumed, report.confirmed, report.cleaned, report.adopted
        );
        Ok(report)
    }

    async fn reconcile_record(
        &self,
        key: &DeploymentKey,
        report: &mut ReconcileReport,
    ) -> Result<(), LifecycleError> {
        let Some(mut record) = self.load(key).await? else {
            return Ok(());
        };
        match record.state {
            LifecycleState::Pending | LifecycleState::Active => {
                let pod = self
                    .bounded(self.cluster.get(&key.namespace, ObjectKind::Pod, &key.name))
                    .await;
                match pod {
                    Ok(Some(_)) if record.state == LifecycleState::Pending => {
                        record.state = LifecycleState::Active;
                        self.save(&record).await?;
                        info!("Confirmed pending deployment {}", key);
                        report.confirmed += 1;
                    }
                    Ok(Some(_)) => report.resumed += 1,
                    Ok(None) => {
                        info!("Pod for {} is missing, removing leftovers", key);
                        match self.teardown(&mut record).await {
                            Ok(()) => report.cleaned += 1,
                            Err(LifecycleError::Cluster(e)) => {
                                self.record_failure(&mut record, &e).await?;
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Err(e) => {
                        // Unknown outcome: keep the expiry armed either way.
                        warn!("Could not check pod for {}: {}", key, e);
                        if record.state == LifecycleState::Pending {
                            record.state = LifecycleState::Active;
                            self.save(&record).await?;
                        }
                        report.resumed += 1;
                    }
                }
            }
            LifecycleState::Deleting => {
                info!("Resuming deletion of {}", key);
                report.resumed += 1;
            }
            LifecycleState::Failed => {
                warn!(
                    "Deployment {} is Failed ({}); awaiting manual deletion",
                    key,
                    record.last_error.as_deref().unwrap_or("unknown error")
                );
            }
            LifecycleState::Gone => self.store.delete(&key.store_key()).await?,
        }
        Ok(())
    }

    /// Track a managed pod that has no record. Its expiry is rebuilt from the
    /// created-at label, falling back to the cluster's creation time.
    async fn adopt(&self, pod: &ObjectState, now: DateTime<Utc>) -> Result<bool, LifecycleError> {
        let key = DeploymentKey::new(&pod.namespace, &pod.name);
        // The label value is sanitized; the annotation keeps the raw id.
        let principal = pod
            .annotations
            .get(PRINCIPAL_ANNOTATION)
            .or_else(|| pod.labels.get(PRINCIPAL_LABEL))
            .cloned()
            .unwrap_or_default();
        let created_at = pod
            .labels
            .get(CREATED_AT_LABEL)
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or(pod.created_at)
            .unwrap_or(now);
        let record = DeploymentRecord {
            uid: uuid::Uuid::new_v4().to_string(),
            namespace: key.namespace.clone(),
            name: key.name.clone(),
            principal,
            state: LifecycleState::Active,
            created_at,
            expires_at: self.expiry_for(created_at),
            objects: ObjectRefs::derived(&pod.name),
            delete_attempts: 0,
            last_error: None,
            foreign_pod: false,
        };

        let guard = self.lock(&key).await;
        let result = self.adopt_locked(&key, &record).await;
        self.release(&key, guard);

        if let Ok(true) = result {
            info!(
                "Adopted orphan pod {}, expires at {}",
                key,
                record.expires_at.to_rfc3339()
            );
        }
        result
    }

    async fn adopt_locked(
        &self,
        key: &DeploymentKey,
        record: &DeploymentRecord,
    ) -> Result<bool, LifecycleError> {
        if self.load(key).await?.is_some() {
            return Ok(false);
        }
        self.save(record).await?;
        Ok(true)
    }

    // --- Queries ---

    /// Local lifecycle plus what the cluster reports for the pod.
    ///
    /// `None` when there is no record and no managed pod under `key`.
    pub async fn status(&self, key: &DeploymentKey) -> Result<Option<DeploymentStatus>, LifecycleError> {
        let record = self.load(key).await?;
        let pod = self
            .bounded(self.cluster.get(&key.namespace, ObjectKind::Pod, &key.name))
            .await?
            .filter(|p| record.is_some() || is_managed(p));
        if record.is_none() && pod.is_none() {
            return Ok(None);
        }
        let mut status = status_of(key, record.as_ref());
        status.pod = pod;
        Ok(Some(status))
    }

    /// Every deployment in `namespace`, merging local records with managed pods
    /// the cluster reports. Sorted by name.
    pub async fn list(&self, namespace: &str) -> Result<Vec<DeploymentStatus>, LifecycleError> {
        let prefix = format!("{}{}/", DEPLOYMENTS_PREFIX, namespace);
        let records: Vec<(String, DeploymentRecord)> = self.store.list_json(&prefix).await?;
        let pods = self
            .bounded(self.cluster.list(namespace, MANAGED_SELECTOR))
            .await?;

        let mut merged: BTreeMap<String, DeploymentStatus> = BTreeMap::new();
        for (_, record) in &records {
            merged.insert(record.name.clone(), status_of(&record.key(), Some(record)));
        }
        for pod in pods {
            let name = pod.name.clone();
            let key = DeploymentKey::new(namespace, &name);
            merged
                .entry(name)
                .or_insert_with(|| status_of(&key, None))
                .pod = Some(pod);
        }
        Ok(merged.into_values().collect())
    }

    /// Every persisted record that decodes.
    pub async fn records(&self) -> Result<Vec<DeploymentRecord>, LifecycleError> {
        Ok(self.scan().await?.0)
    }

    /// Decode every stored record, counting the ones that do not decode.
    /// Those are never expired, so each one is logged as an error.
    async fn scan(&self) -> Result<(Vec<DeploymentRecord>, usize), LifecycleError> {
        let mut records = Vec::new();
        let mut unreadable = 0;
        for (key, bytes) in self.store.list_prefix(DEPLOYMENTS_PREFIX).await? {
            match serde_json::from_slice::<DeploymentRecord>(&bytes) {
                Ok(record) => records.push(record),
                Err(e) => {
                    unreadable += 1;
                    error!(
                        "Deployment record {} is unreadable ({}); it will not expire until fixed or removed",
                        key, e
                    );
                }
            }
        }
        Ok((records, unreadable))
    }

    pub async fn record(&self, key: &DeploymentKey) -> Result<Option<DeploymentRecord>, LifecycleError> {
        Ok(self.load(key).await?)
    }

    // --- Helpers ---

    async fn load(&self, key: &DeploymentKey) -> anyhow::Result<Option<DeploymentRecord>> {
        match self.store.get(&key.store_key()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: &DeploymentRecord) -> anyhow::Result<()> {
        self.store.put_json(&record.key().store_key(), record).await
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ClusterError>>,
    ) -> Result<T, ClusterError> {
        tokio::time::timeout(self.config.cluster_timeout, call)
            .await
            .unwrap_or(Err(ClusterError::Timeout))
    }
}

fn is_due(record: &DeploymentRecord, now: DateTime<Utc>) -> bool {
    match record.state {
        LifecycleState::Active => record.is_expired(now),
        LifecycleState::Deleting => true,
        _ => false,
    }
}

fn is_managed(pod: &ObjectState) -> bool {
    pod.labels.get(MANAGED_BY_LABEL).map(String::as_str) == Some(MANAGED_BY_VALUE)
}

fn status_of(key: &DeploymentKey, record: Option<&DeploymentRecord>) -> DeploymentStatus {
    DeploymentStatus {
        namespace: key.namespace.clone(),
        name: key.name.clone(),
        lifecycle: record.map(|r| r.state),
        principal: record.map(|r| r.principal.clone()),
        created_at: record.map(|r| r.created_at),
        expires_at: record.map(|r| r.expires_at),
        pod: None,
    }
}

/// References limited to the objects that were actually created. The pod name
/// is kept as the record's identity; `foreign_pod` decides whether it is deleted.
fn created_refs(pod: &str, created: &[(ObjectKind, String)]) -> ObjectRefs {
    let find = |kind: ObjectKind| {
        created
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, name)| name.clone())
    };
    ObjectRefs {
        pod: pod.to_string(),
        pvc: find(ObjectKind::PersistentVolumeClaim),
        service: find(ObjectKind::Service),
        secret: find(ObjectKind::Secret),
    }
}
