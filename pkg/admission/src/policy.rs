use std::collections::BTreeSet;

use pkg_constants::network::{SERVICE_PORT, SERVICE_TARGET_PORT};
use pkg_constants::policy::{
    CPU_LIMIT, CPU_REQUEST, DEFAULT_ALLOWED_IMAGES, DEFAULT_DATABASE_IMAGE, MEMORY_LIMIT,
    MEMORY_REQUEST, RESERVED_NAME_FRAGMENTS, RUN_AS_USER, STORAGE_SIZE,
};
use pkg_types::config::PolicyConfigFile;

/// Requests and limits applied to every container, whatever the client asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedResources {
    pub cpu_request: String,
    pub cpu_limit: String,
    pub memory_request: String,
    pub memory_limit: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServicePolicy {
    pub port: i32,
    pub target_port: i32,
}

/// Process-wide admission policy.
///
/// Built once at startup and shared behind an `Arc`; changing it requires a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub allowed_images: BTreeSet<String>,
    pub database_image: String,
    pub resources: FixedResources,
    pub storage_size: String,
    pub run_as_user: i64,
    pub reserved_name_fragments: Vec<String>,
    /// `None` disables the per-deployment Service.
    pub service: Option<ServicePolicy>,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            allowed_images: DEFAULT_ALLOWED_IMAGES.iter().map(|s| s.to_string()).collect(),
            database_image: DEFAULT_DATABASE_IMAGE.to_string(),
            resources: FixedResources {
                cpu_request: CPU_REQUEST.to_string(),
                cpu_limit: CPU_LIMIT.to_string(),
                memory_request: MEMORY_REQUEST.to_string(),
                memory_limit: MEMORY_LIMIT.to_string(),
            },
            storage_size: STORAGE_SIZE.to_string(),
            run_as_user: RUN_AS_USER,
            reserved_name_fragments: RESERVED_NAME_FRAGMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            service: Some(ServicePolicy {
                port: SERVICE_PORT,
                target_port: SERVICE_TARGET_PORT,
            }),
        }
    }
}

impl ResourcePolicy {
    /// Overlay the config file's policy section onto the defaults.
    pub fn from_config(file: &PolicyConfigFile) -> anyhow::Result<Self> {
        let mut policy = Self::default();
        if let Some(ref images) = file.allowed_images {
            policy.allowed_images = images.iter().cloned().collect();
        }
        if let Some(ref image) = file.database_image {
            policy.database_image = image.clone();
        }
        if let Some(ref size) = file.storage_size {
            policy.storage_size = size.clone();
        }
        if let Some(ref fragments) = file.reserved_name_fragments {
            policy.reserved_name_fragments = fragments.clone();
        }
        if file.service == Some(false) {
            policy.service = None;
        }

        if policy.allowed_images.is_empty() {
            anyhow::bail!("policy.allowed-images must list at least one image");
        }
        if policy.allowed_images.iter().any(|i| i.trim() != i || i.is_empty()) {
            anyhow::bail!("policy.allowed-images entries must be non-empty and untrimmed");
        }
        if policy.database_image.trim().is_empty() {
            anyhow::bail!("policy.database-image must not be empty");
        }
        Ok(policy)
    }

    pub fn is_image_allowed(&self, image: &str) -> bool {
        self.allowed_images.contains(image)
    }
}
