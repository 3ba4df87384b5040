use serde::{Deserialize, Serialize};

/// Raw deployment request as submitted by a user.
///
/// There are deliberately no resource fields: anything else the client sends
/// is dropped during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRequest {
    pub pod_name: String,
    pub namespace: String,
    #[serde(alias = "docker_image")]
    pub image: String,
    #[serde(default, alias = "has_storage")]
    pub storage: bool,
    #[serde(default, alias = "has_database")]
    pub database: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_fields_are_ignored() {
        let req: DeploymentRequest = serde_json::from_str(
            r#"{
                "pod_name": "my-app",
                "namespace": "dev",
                "docker_image": "nginx:1.25-alpine",
                "has_storage": true,
                "memory_limit": 99999,
                "cpu_limit": 64000
            }"#,
        )
        .unwrap();
        assert_eq!(req.pod_name, "my-app");
        assert_eq!(req.image, "nginx:1.25-alpine");
        assert!(req.storage);
        assert!(!req.database);
    }
}
