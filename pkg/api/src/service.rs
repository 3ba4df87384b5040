use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::GatewayError;
use pkg_admission::manifest::ManifestBuilder;
use pkg_admission::policy::ResourcePolicy;
use pkg_admission::quota::{Admission, QuotaGate};
use pkg_admission::validator::Validator;
use pkg_controllers::lifecycle::{LifecycleScheduler, Submission};
use pkg_types::deployment::{DeleteOutcome, DeploymentReceipt, DeploymentStatus};
use pkg_types::principal::Principal;
use pkg_types::request::DeploymentRequest;

/// The four operations the transport layer exposes.
///
/// Submission runs validator, quota gate, manifest builder and scheduler in
/// that order; nothing reaches the quota gate unless it validated, and nothing
/// reaches the cluster unless it was admitted.
pub struct DeploymentService {
    validator: Validator,
    quota: QuotaGate,
    builder: ManifestBuilder,
    scheduler: Arc<LifecycleScheduler>,
}

impl DeploymentService {
    pub fn new(policy: Arc<ResourcePolicy>, quota: QuotaGate, scheduler: Arc<LifecycleScheduler>) -> Self {
        Self {
            validator: Validator::new(policy.clone()),
            quota,
            builder: ManifestBuilder::new(policy),
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &Arc<LifecycleScheduler> {
        &self.scheduler
    }

    pub async fn submit(
        &self,
        principal: &Principal,
        request: &DeploymentRequest,
    ) -> Result<DeploymentReceipt, GatewayError> {
        let validated = self.validator.validate(request, principal)?;

        let now = Utc::now();
        let admission = self.quota.try_admit(&principal.id, now).await.map_err(|e| {
            error!("Quota store failure for {}: {:#}", principal.id, e);
            GatewayError::Storage
        })?;
        if let Admission::Rejected { retry_after } = admission {
            info!(
                "Quota rejected {} for {} (retry in {}s)",
                validated.key(),
                principal.id,
                retry_after.as_secs()
            );
            return Err(GatewayError::QuotaExceeded { retry_after });
        }

        let manifest = self
            .builder
            .build(&validated, now, self.scheduler.expiry_for(now))?;
        let record = self
            .scheduler
            .create(Submission {
                key: validated.key(),
                principal: principal.id.clone(),
                created_at: now,
                refs: manifest.refs(),
                objects: manifest.creation_order(),
            })
            .await?;

        info!(
            "Accepted {} from {} (storage={}, database={})",
            record.key(),
            principal.id,
            validated.wants_storage(),
            validated.wants_database()
        );
        Ok(DeploymentReceipt::from(&record))
    }

    pub async fn status(
        &self,
        principal: &Principal,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentStatus, GatewayError> {
        let key = self.validator.validate_key(namespace, name, principal)?;
        self.scheduler
            .status(&key)
            .await?
            .ok_or(GatewayError::NotFound)
    }

    pub async fn delete(
        &self,
        principal: &Principal,
        namespace: &str,
        name: &str,
    ) -> Result<DeleteOutcome, GatewayError> {
        let key = self.validator.validate_key(namespace, name, principal)?;
        let outcome = self.scheduler.delete(&key).await?;
        info!("Delete of {} by {}: {:?}", key, principal.id, outcome);
        Ok(outcome)
    }

    pub async fn list(
        &self,
        principal: &Principal,
        namespace: &str,
    ) -> Result<Vec<DeploymentStatus>, GatewayError> {
        let namespace = self.validator.validate_scope(namespace, principal)?;
        Ok(self.scheduler.list(&namespace).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkg_admission::error::ValidationError;
    use pkg_admission::quota::QuotaLimits;
    use pkg_cluster::memory::MemoryCluster;
    use pkg_controllers::lifecycle::LifecycleConfig;
    use pkg_state::client::StateStore;
    use pkg_types::object::ObjectKind;

    async fn service() -> (DeploymentService, Arc<MemoryCluster>) {
        let cluster = Arc::new(MemoryCluster::new());
        let store = StateStore::in_memory().await.unwrap();
        let scheduler = Arc::new(LifecycleScheduler::new(
            store,
            cluster.clone(),
            LifecycleConfig::default(),
        ));
        let service = DeploymentService::new(
            Arc::new(ResourcePolicy::default()),
            QuotaGate::new(QuotaLimits::default()),
            scheduler,
        );
        (service, cluster)
    }

    fn alice() -> Principal {
        Principal::new("alice", ["dev"])
    }

    fn request(name: &str, image: &str) -> DeploymentRequest {
        DeploymentRequest {
            pod_name: name.to_string(),
            namespace: "dev".to_string(),
            image: image.to_string(),
            storage: false,
            database: false,
        }
    }

    #[tokio::test]
    async fn submit_creates_pod_and_service() {
        let (service, cluster) = service().await;
        let receipt = service
            .submit(&alice(), &request("my-app", "nginx:1.25-alpine"))
            .await
            .unwrap();
        assert_eq!(receipt.name, "my-app");
        assert!(cluster.contains("dev", ObjectKind::Pod, "my-app"));
        assert!(cluster.contains("dev", ObjectKind::Service, "my-app"));
        assert!(!cluster.contains("dev", ObjectKind::Secret, "my-app-db-secret"));

        let status = service.status(&alice(), "dev", "my-app").await.unwrap();
        assert!(status.pod.is_some());
    }

    #[tokio::test]
    async fn invalid_requests_do_not_consume_quota() {
        let (service, cluster) = service().await;
        for _ in 0..5 {
            let err = service
                .submit(&alice(), &request("Bad_Name", "nginx:1.25-alpine"))
                .await
                .unwrap_err();
            assert_eq!(err.reason(), "invalid_name");
            let err = service
                .submit(&alice(), &request("app", "evil.io/miner:1"))
                .await
                .unwrap_err();
            assert_eq!(err.reason(), "image_not_allowed");
        }
        assert_eq!(cluster.create_calls(), 0);
        assert_eq!(service.quota.usage("alice", Utc::now()).await, 0);
    }

    #[tokio::test]
    async fn fourth_submission_hits_quota() {
        let (service, _) = service().await;
        for name in ["a1", "a2", "a3"] {
            service
                .submit(&alice(), &request(name, "nginx:1.25-alpine"))
                .await
                .unwrap();
        }
        let err = service
            .submit(&alice(), &request("a4", "nginx:1.25-alpine"))
            .await
            .unwrap_err();
        match err {
            GatewayError::QuotaExceeded { retry_after } => {
                assert!(retry_after <= service.quota.limits().window)
            }
            other => panic!("expected quota rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_a_conflict() {
        let (service, _) = service().await;
        service
            .submit(&alice(), &request("my-app", "nginx:1.25-alpine"))
            .await
            .unwrap();
        let err = service
            .submit(&alice(), &request("my-app", "nginx:1.25-alpine"))
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "cluster_conflict");
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_scoped() {
        let (service, _) = service().await;
        service
            .submit(&alice(), &request("my-app", "nginx:1.25-alpine"))
            .await
            .unwrap();

        let bob = Principal::new("bob", ["prod"]);
        let err = service.delete(&bob, "dev", "my-app").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::NamespaceForbidden(_))
        ));

        assert_eq!(
            service.delete(&alice(), "dev", "my-app").await.unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            service.delete(&alice(), "dev", "my-app").await.unwrap(),
            DeleteOutcome::AlreadyAbsent
        );
        assert!(matches!(
            service.status(&alice(), "dev", "my-app").await,
            Err(GatewayError::NotFound)
        ));
    }
}
