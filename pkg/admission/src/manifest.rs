use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::InvariantViolation;
use crate::policy::ResourcePolicy;
use crate::validator::ValidatedRequest;
use pkg_constants::labels::{
    APP_LABEL, CREATED_AT_ANNOTATION, CREATED_AT_LABEL, EXPIRES_AT_ANNOTATION, MANAGED_BY_LABEL,
    MANAGED_BY_VALUE, PRINCIPAL_ANNOTATION, PRINCIPAL_LABEL,
};
use pkg_constants::network::DATABASE_PORT;
use pkg_constants::paths::{
    DATABASE_DATA_PATH, DATABASE_RUN_PATH, STORAGE_MOUNT_PATH, TMP_MOUNT_PATH,
};
use pkg_types::deployment::{ObjectRefs, db_secret_name, storage_name};
use pkg_types::object::{ClusterObject, ObjectMeta};
use pkg_types::pod::{
    Capabilities, Container, ContainerPort, EnvVar, Pod, PodSecurityContext, PodSpec,
    ResourceRequirements, SeccompProfile, SecurityContext,
};
use pkg_types::secret::Secret;
use pkg_types::service::{Service, ServicePort, ServiceSpec};
use pkg_types::validate::{sanitize_label_value, validate_name};
use pkg_types::volume::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, StorageRequest, Volume, VolumeMount,
};

const APP_CONTAINER: &str = "app";
const DB_CONTAINER: &str = "database";
const DB_USER: &str = "app";
const PASSWORD_LEN: usize = 32;

/// Everything submitted to the cluster for one deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSet {
    pub pod: Pod,
    pub pvc: Option<PersistentVolumeClaim>,
    pub service: Option<Service>,
    pub secret: Option<Secret>,
}

impl ManifestSet {
    /// Objects in the order they must be created: dependencies before the pod.
    pub fn creation_order(&self) -> Vec<ClusterObject> {
        let mut objects = Vec::with_capacity(4);
        if let Some(ref secret) = self.secret {
            objects.push(ClusterObject::Secret(secret.clone()));
        }
        if let Some(ref pvc) = self.pvc {
            objects.push(ClusterObject::PersistentVolumeClaim(pvc.clone()));
        }
        objects.push(ClusterObject::Pod(self.pod.clone()));
        if let Some(ref svc) = self.service {
            objects.push(ClusterObject::Service(svc.clone()));
        }
        objects
    }

    pub fn refs(&self) -> ObjectRefs {
        ObjectRefs {
            pod: self.pod.metadata.name.clone(),
            pvc: self.pvc.as_ref().map(|p| p.metadata.name.clone()),
            service: self.service.as_ref().map(|s| s.metadata.name.clone()),
            secret: self.secret.as_ref().map(|s| s.metadata.name.clone()),
        }
    }
}

/// Turns a validated request into hardened cluster objects. No I/O.
#[derive(Clone)]
pub struct ManifestBuilder {
    policy: Arc<ResourcePolicy>,
}

impl ManifestBuilder {
    pub fn new(policy: Arc<ResourcePolicy>) -> Self {
        Self { policy }
    }

    /// Build the manifest for `request`, stamping `created_at`/`expires_at` on every object.
    ///
    /// Fails only when `request` contradicts the policy this builder holds, which
    /// means it was validated against a different policy snapshot.
    pub fn build(
        &self,
        request: &ValidatedRequest,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ManifestSet, InvariantViolation> {
        if !self.policy.is_image_allowed(request.image()) {
            return Err(InvariantViolation(format!(
                "image '{}' reached the builder but is not whitelisted",
                request.image()
            )));
        }
        validate_name(request.pod_name()).map_err(|e| InvariantViolation(e.to_string()))?;

        let pod_name = request.pod_name();
        let meta = |name: String| ObjectMeta {
            name,
            namespace: request.namespace().to_string(),
            labels: labels(request, created_at),
            annotations: annotations(request, created_at, expires_at),
        };

        let pvc = request.wants_storage().then(|| PersistentVolumeClaim {
            metadata: meta(storage_name(pod_name)),
            spec: PersistentVolumeClaimSpec {
                access_modes: vec!["ReadWriteOnce".to_string()],
                resources: StorageRequest {
                    requests: BTreeMap::from([(
                        "storage".to_string(),
                        self.policy.storage_size.clone(),
                    )]),
                },
            },
        });

        let secret = request.wants_database().then(|| Secret {
            metadata: meta(db_secret_name(pod_name)),
            secret_type: "Opaque".to_string(),
            string_data: database_credentials(pod_name),
        });

        let service = self.policy.service.map(|svc| Service {
            metadata: meta(pod_name.to_string()),
            spec: ServiceSpec {
                selector: BTreeMap::from([(APP_LABEL.to_string(), pod_name.to_string())]),
                ports: vec![ServicePort {
                    port: svc.port,
                    target_port: svc.target_port,
                    protocol: "TCP".to_string(),
                }],
                service_type: "ClusterIP".to_string(),
            },
        });

        let mut volumes = vec![Volume::empty_dir("tmp")];
        let mut containers = vec![self.app_container(request)];
        if let Some(ref pvc) = pvc {
            volumes.push(Volume::claim("data", &pvc.metadata.name));
        }
        if request.wants_database() {
            volumes.push(Volume::empty_dir("db-data"));
            volumes.push(Volume::empty_dir("db-run"));
            containers.push(self.database_container(pod_name));
        }

        let pod = Pod {
            metadata: meta(pod_name.to_string()),
            spec: PodSpec {
                containers,
                volumes,
                security_context: PodSecurityContext {
                    run_as_non_root: true,
                    run_as_user: self.policy.run_as_user,
                    run_as_group: self.policy.run_as_user,
                    fs_group: self.policy.run_as_user,
                    seccomp_profile: SeccompProfile {
                        profile_type: "RuntimeDefault".to_string(),
                    },
                },
                host_network: false,
                host_pid: false,
                host_ipc: false,
                automount_service_account_token: false,
                restart_policy: "Always".to_string(),
            },
        };

        Ok(ManifestSet {
            pod,
            pvc,
            service,
            secret,
        })
    }

    fn app_container(&self, request: &ValidatedRequest) -> Container {
        let mut env = vec![
            EnvVar::literal("ENVIRONMENT", "demo"),
            EnvVar::from_field("POD_NAME", "metadata.name"),
            EnvVar::from_field("POD_NAMESPACE", "metadata.namespace"),
        ];
        let mut mounts = vec![mount("tmp", TMP_MOUNT_PATH)];

        if request.wants_storage() {
            mounts.push(mount("data", STORAGE_MOUNT_PATH));
        }
        if request.wants_database() {
            let secret = db_secret_name(request.pod_name());
            for (var, key) in [
                ("DB_HOST", "host"),
                ("DB_PORT", "port"),
                ("DB_NAME", "database"),
                ("DB_USER", "username"),
                ("DB_PASSWORD", "password"),
            ] {
                env.push(EnvVar::from_secret(var, &secret, key));
            }
        }

        Container {
            name: APP_CONTAINER.to_string(),
            image: request.image().to_string(),
            ports: self
                .policy
                .service
                .map(|svc| {
                    vec![ContainerPort {
                        container_port: svc.target_port,
                        protocol: "TCP".to_string(),
                    }]
                })
                .unwrap_or_default(),
            env,
            resources: self.resources(),
            security_context: self.security_context(),
            volume_mounts: mounts,
        }
    }

    fn database_container(&self, pod_name: &str) -> Container {
        let secret = db_secret_name(pod_name);
        Container {
            name: DB_CONTAINER.to_string(),
            image: self.policy.database_image.clone(),
            ports: vec![ContainerPort {
                container_port: i32::from(DATABASE_PORT),
                protocol: "TCP".to_string(),
            }],
            env: vec![
                EnvVar::from_secret("POSTGRES_USER", &secret, "username"),
                EnvVar::from_secret("POSTGRES_PASSWORD", &secret, "password"),
                EnvVar::from_secret("POSTGRES_DB", &secret, "database"),
                EnvVar::literal("PGDATA", &format!("{}/pgdata", DATABASE_DATA_PATH)),
            ],
            resources: self.resources(),
            security_context: self.security_context(),
            volume_mounts: vec![
                mount("tmp", TMP_MOUNT_PATH),
                mount("db-data", DATABASE_DATA_PATH),
                mount("db-run", DATABASE_RUN_PATH),
            ],
        }
    }

    fn resources(&self) -> ResourceRequirements {
        let r = &self.policy.resources;
        ResourceRequirements {
            requests: BTreeMap::from([
                ("cpu".to_string(), r.cpu_request.clone()),
                ("memory".to_string(), r.memory_request.clone()),
            ]),
            limits: BTreeMap::from([
                ("cpu".to_string(), r.cpu_limit.clone()),
                ("memory".to_string(), r.memory_limit.clone()),
            ]),
        }
    }

    fn security_context(&self) -> SecurityContext {
        SecurityContext {
            run_as_non_root: true,
            run_as_user: self.policy.run_as_user,
            allow_privilege_escalation: false,
            privileged: false,
            read_only_root_filesystem: true,
            capabilities: Capabilities {
                drop: vec!["ALL".to_string()],
            },
        }
    }
}

fn mount(name: &str, path: &str) -> VolumeMount {
    VolumeMount {
        name: name.to_string(),
        mount_path: path.to_string(),
        read_only: false,
    }
}

fn labels(request: &ValidatedRequest, created_at: DateTime<Utc>) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_string(), request.pod_name().to_string()),
        (MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string()),
        (
            PRINCIPAL_LABEL.to_string(),
            sanitize_label_value(request.principal()),
        ),
        (
            CREATED_AT_LABEL.to_string(),
            created_at.timestamp().to_string(),
        ),
    ])
}

fn annotations(
    request: &ValidatedRequest,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            PRINCIPAL_ANNOTATION.to_string(),
            request.principal().to_string(),
        ),
        (CREATED_AT_ANNOTATION.to_string(), created_at.to_rfc3339()),
        (EXPIRES_AT_ANNOTATION.to_string(), expires_at.to_rfc3339()),
    ])
}

/// Fresh credentials for one deployment. Never reused, never logged.
fn database_credentials(pod_name: &str) -> BTreeMap<String, String> {
    let password = Alphanumeric.sample_string(&mut rand::rng(), PASSWORD_LEN);
    BTreeMap::from([
        ("host".to_string(), "localhost".to_string()),
        ("port".to_string(), DATABASE_PORT.to_string()),
        ("database".to_string(), format!("{}_db", pod_name.replace('-', "_"))),
        ("username".to_string(), DB_USER.to_string()),
        ("password".to_string(), password),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use chrono::TimeDelta;
    use pkg_types::principal::Principal;
    use pkg_types::request::DeploymentRequest;

    fn build(storage: bool, database: bool) -> ManifestSet {
        let policy = Arc::new(ResourcePolicy::default());
        let request = DeploymentRequest {
            pod_name: "my-app".into(),
            namespace: "dev".into(),
            image: "nginx:1.25-alpine".into(),
            storage,
            database,
        };
        let validated = Validator::new(policy.clone())
            .validate(&request, &Principal::new("alice", ["dev"]))
            .unwrap();
        let now = Utc::now();
        ManifestBuilder::new(policy)
            .build(&validated, now, now + TimeDelta::minutes(5))
            .unwrap()
    }

    fn assert_hardened(c: &Container) {
        let sc = &c.security_context;
        assert!(sc.run_as_non_root);
        assert!(!sc.allow_privilege_escalation);
        assert!(!sc.privileged);
        assert!(sc.read_only_root_filesystem);
        assert_eq!(sc.capabilities.drop, vec!["ALL".to_string()]);
        assert_eq!(c.resources.requests["memory"], "256Mi");
        assert_eq!(c.resources.limits["memory"], "512Mi");
        assert_eq!(c.resources.requests["cpu"], "100m");
        assert_eq!(c.resources.limits["cpu"], "500m");
    }

    #[test]
    fn minimal_request_yields_single_hardened_container() {
        let set = build(false, false);
        let spec = &set.pod.spec;
        assert_eq!(spec.containers.len(), 1);
        assert_eq!(spec.containers[0].image, "nginx:1.25-alpine");
        assert_hardened(&spec.containers[0]);
        assert!(spec.security_context.run_as_non_root);
        assert!(!spec.host_network && !spec.host_pid && !spec.host_ipc);
        assert!(!spec.automount_service_account_token);
        assert!(set.pvc.is_none());
        assert!(set.secret.is_none());
        assert_eq!(set.refs().pvc, None);
    }

    #[test]
    fn storage_adds_claim_and_mount() {
        let set = build(true, false);
        let pvc = set.pvc.as_ref().unwrap();
        assert_eq!(pvc.metadata.name, "my-app-storage");
        assert_eq!(pvc.spec.resources.requests["storage"], "10Gi");
        let app = &set.pod.spec.containers[0];
        assert!(app
            .volume_mounts
            .iter()
            .any(|m| m.name == "data" && m.mount_path == "/data"));
        assert!(set
            .pod
            .spec
            .volumes
            .iter()
            .any(|v| v == &Volume::claim("data", "my-app-storage")));
    }

    #[test]
    fn database_adds_sidecar_and_fresh_secret() {
        let first = build(false, true);
        let second = build(false, true);

        let containers = &first.pod.spec.containers;
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[1].image, "postgres:16-alpine");
        containers.iter().for_each(assert_hardened);

        let secret = first.secret.as_ref().unwrap();
        assert_eq!(secret.metadata.name, "my-app-db-secret");
        assert_eq!(secret.string_data["database"], "my_app_db");
        assert_eq!(secret.string_data["password"].len(), PASSWORD_LEN);
        assert_ne!(
            secret.string_data["password"],
            second.secret.as_ref().unwrap().string_data["password"]
        );
    }

    #[test]
    fn no_host_volumes_are_emitted() {
        let set = build(true, true);
        let json = serde_json::to_string(&set.pod).unwrap();
        assert!(!json.contains("hostPath"));
    }

    #[test]
    fn every_object_is_labeled() {
        let set = build(true, true);
        for object in set.creation_order() {
            let labels = &object.metadata().labels;
            assert_eq!(labels[MANAGED_BY_LABEL], MANAGED_BY_VALUE);
            assert_eq!(labels[PRINCIPAL_LABEL], "alice");
            assert!(labels.contains_key(CREATED_AT_LABEL));
            assert!(object.metadata().annotations.contains_key(EXPIRES_AT_ANNOTATION));
        }
    }

    #[test]
    fn creation_order_puts_dependencies_first() {
        let kinds: Vec<_> = build(true, true)
            .creation_order()
            .iter()
            .map(|o| o.kind().to_string())
            .collect();
        assert_eq!(kinds, ["Secret", "PersistentVolumeClaim", "Pod", "Service"]);
    }

    #[test]
    fn mismatched_policy_is_an_invariant_violation() {
        let request = DeploymentRequest {
            pod_name: "my-app".into(),
            namespace: "dev".into(),
            image: "nginx:1.25-alpine".into(),
            storage: false,
            database: false,
        };
        let validated = Validator::new(Arc::new(ResourcePolicy::default()))
            .validate(&request, &Principal::new("alice", ["dev"]))
            .unwrap();
        let strict = ResourcePolicy {
            allowed_images: ["busybox:1.36".to_string()].into(),
            ..Default::default()
        };
        let now = Utc::now();
        assert!(ManifestBuilder::new(Arc::new(strict))
            .build(&validated, now, now)
            .is_err());
    }
}
