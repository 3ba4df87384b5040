use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::policy::ResourcePolicy;
use pkg_types::deployment::DeploymentKey;
use pkg_types::principal::Principal;
use pkg_types::request::DeploymentRequest;
use pkg_types::validate::validate_name;

/// A request that passed validation.
///
/// Only [`Validator::validate`] can produce one, so the manifest builder never
/// sees unchecked input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest {
    principal: String,
    pod_name: String,
    namespace: String,
    image: String,
    storage: bool,
    database: bool,
}

impl ValidatedRequest {
    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn pod_name(&self) -> &str {
        &self.pod_name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn wants_storage(&self) -> bool {
        self.storage
    }

    pub fn wants_database(&self) -> bool {
        self.database
    }

    pub fn key(&self) -> DeploymentKey {
        DeploymentKey::new(&self.namespace, &self.pod_name)
    }
}

pub type ValidationResult = Result<ValidatedRequest, ValidationError>;

/// Stateless request checker bound to one policy snapshot.
#[derive(Clone)]
pub struct Validator {
    policy: Arc<ResourcePolicy>,
}

impl Validator {
    pub fn new(policy: Arc<ResourcePolicy>) -> Self {
        Self { policy }
    }

    /// Check name syntax, namespace membership and image whitelist, in that order.
    pub fn validate(&self, request: &DeploymentRequest, principal: &Principal) -> ValidationResult {
        let pod_name = self.validate_pod_name(&request.pod_name)?;
        let namespace = validate_namespace(&request.namespace, principal)?;

        // Byte-exact: no trimming, no tag or registry inference.
        if !self.policy.is_image_allowed(&request.image) {
            warn!(
                "Rejected unlisted image '{}' from principal {}",
                request.image, principal.id
            );
            return Err(ValidationError::ImageNotAllowed(request.image.clone()));
        }

        debug!(
            "Validated request {}/{} for principal {}",
            namespace, pod_name, principal.id
        );
        Ok(ValidatedRequest {
            principal: principal.id.clone(),
            pod_name,
            namespace,
            image: request.image.clone(),
            storage: request.storage,
            database: request.database,
        })
    }

    /// Resolve the namespace a principal wants to read or delete in.
    pub fn validate_scope(&self, namespace: &str, principal: &Principal) -> Result<String, ValidationError> {
        validate_namespace(namespace, principal)
    }

    /// Resolve `(namespace, name)` for a lookup or delete. Names get the same
    /// normalization and syntax check as on submission.
    pub fn validate_key(
        &self,
        namespace: &str,
        name: &str,
        principal: &Principal,
    ) -> Result<DeploymentKey, ValidationError> {
        let name = normalize(name);
        validate_name(&name).map_err(|e| ValidationError::InvalidName(e.to_string()))?;
        let namespace = validate_namespace(namespace, principal)?;
        Ok(DeploymentKey::new(namespace, name))
    }

    fn validate_pod_name(&self, raw: &str) -> Result<String, ValidationError> {
        let name = normalize(raw);
        validate_name(&name).map_err(|e| ValidationError::InvalidName(e.to_string()))?;
        // The Service shares the pod's name and must be a DNS-1035 label.
        if self.policy.service.is_some() && !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(ValidationError::InvalidName(format!(
                "name '{}' must start with a letter",
                name
            )));
        }
        if let Some(fragment) = self
            .policy
            .reserved_name_fragments
            .iter()
            .find(|f| name.contains(f.as_str()))
        {
            return Err(ValidationError::InvalidName(format!(
                "name '{}' contains reserved word '{}'",
                name, fragment
            )));
        }
        Ok(name)
    }
}

fn validate_namespace(raw: &str, principal: &Principal) -> Result<String, ValidationError> {
    let namespace = normalize(raw);
    validate_name(&namespace).map_err(|e| ValidationError::InvalidNamespace(e.to_string()))?;
    if !principal.can_act_in(&namespace) {
        warn!(
            "Principal {} denied access to namespace {}",
            principal.id, namespace
        );
        return Err(ValidationError::NamespaceForbidden(namespace));
    }
    Ok(namespace)
}

fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> Validator {
        Validator::new(Arc::new(ResourcePolicy::default()))
    }

    fn alice() -> Principal {
        Principal::new("alice", ["dev"])
    }

    fn request(pod: &str, ns: &str, image: &str) -> DeploymentRequest {
        DeploymentRequest {
            pod_name: pod.to_string(),
            namespace: ns.to_string(),
            image: image.to_string(),
            storage: false,
            database: false,
        }
    }

    #[test]
    fn accepts_and_normalizes() {
        let ok = validator()
            .validate(&request("  My-App ", "DEV", "nginx:1.25-alpine"), &alice())
            .unwrap();
        assert_eq!(ok.pod_name(), "my-app");
        assert_eq!(ok.namespace(), "dev");
        assert_eq!(ok.principal(), "alice");
        assert_eq!(ok.key(), DeploymentKey::new("dev", "my-app"));
    }

    #[test]
    fn rejects_bad_names() {
        let v = validator();
        for name in ["", "-app", "app-", "my_app", "app!", &"a".repeat(64)] {
            let err = v
                .validate(&request(name, "dev", "nginx:1.25-alpine"), &alice())
                .unwrap_err();
            assert_eq!(err.reason(), "invalid_name", "name {:?}", name);
        }
    }

    #[test]
    fn leading_digit_needs_service_off() {
        let err = validator()
            .validate(&request("1app", "dev", "nginx:1.25-alpine"), &alice())
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_name");

        let no_service = Validator::new(Arc::new(ResourcePolicy {
            service: None,
            ..Default::default()
        }));
        let ok = no_service
            .validate(&request("1app", "dev", "nginx:1.25-alpine"), &alice())
            .unwrap();
        assert_eq!(ok.pod_name(), "1app");
    }

    #[test]
    fn rejects_reserved_fragments() {
        let err = validator()
            .validate(&request("my-kube-app", "dev", "nginx:1.25-alpine"), &alice())
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidName(_)));
    }

    #[test]
    fn rejects_foreign_namespace() {
        let err = validator()
            .validate(&request("my-app", "prod", "nginx:1.25-alpine"), &alice())
            .unwrap_err();
        assert_eq!(err, ValidationError::NamespaceForbidden("prod".into()));
    }

    #[test]
    fn rejects_malformed_namespace() {
        let err = validator()
            .validate(&request("my-app", "dev_ns", "nginx:1.25-alpine"), &alice())
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_namespace");
    }

    #[test]
    fn image_match_is_byte_exact() {
        let v = validator();
        for image in [
            "nginx",
            "nginx:latest",
            "nginx:1.25-alpine ",
            "docker.io/library/nginx:1.25-alpine",
            "NGINX:1.25-alpine",
            "evil.io/miner:1",
        ] {
            let err = v
                .validate(&request("my-app", "dev", image), &alice())
                .unwrap_err();
            assert_eq!(err, ValidationError::ImageNotAllowed(image.to_string()));
        }
    }

    #[test]
    fn name_is_checked_before_image() {
        let err = validator()
            .validate(&request("Bad Name", "prod", "evil:1"), &alice())
            .unwrap_err();
        assert_eq!(err.reason(), "invalid_name");
    }

    #[test]
    fn lookup_keys_are_normalized_and_scoped() {
        let v = validator();
        assert_eq!(
            v.validate_key("Dev", " My-App", &alice()).unwrap(),
            DeploymentKey::new("dev", "my-app")
        );
        assert_eq!(
            v.validate_key("prod", "my-app", &alice()).unwrap_err().reason(),
            "namespace_forbidden"
        );
        assert_eq!(v.validate_scope("DEV", &alice()).unwrap(), "dev");
    }

    #[test]
    fn alternate_policy_is_honored() {
        let policy = ResourcePolicy {
            allowed_images: ["busybox:1.36".to_string()].into(),
            ..Default::default()
        };
        let v = Validator::new(Arc::new(policy));
        assert!(v.validate(&request("app", "dev", "busybox:1.36"), &alice()).is_ok());
        assert!(v
            .validate(&request("app", "dev", "nginx:1.25-alpine"), &alice())
            .is_err());
    }
}
