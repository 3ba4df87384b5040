use serde::{Deserialize, Serialize};

/// Gateway configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// port: 8000
/// data-dir: /var/lib/paved-roads
/// cluster: kube
/// lifetime-secs: 300
/// sweep-interval-secs: 10
/// quota:
///   max-deployments: 3
///   window-secs: 3600
/// policy:
///   allowed-images: ["nginx:1.25-alpine"]
/// principals:
///   - token: alice-token
///     id: alice
///     namespaces: [dev]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigFile {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    /// Cluster backend: `kube` (default) or `memory`.
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default, alias = "lifetime-secs")]
    pub lifetime_secs: Option<u64>,
    #[serde(default, alias = "sweep-interval-secs")]
    pub sweep_interval_secs: Option<u64>,
    #[serde(default, alias = "max-delete-retries")]
    pub max_delete_retries: Option<u32>,
    #[serde(default, alias = "cluster-timeout-secs")]
    pub cluster_timeout_secs: Option<u64>,
    #[serde(default, alias = "log-json")]
    pub log_json: Option<bool>,
    #[serde(default)]
    pub quota: QuotaConfigFile,
    #[serde(default)]
    pub policy: PolicyConfigFile,
    #[serde(default)]
    pub principals: Vec<PrincipalEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaConfigFile {
    #[serde(default, alias = "max-deployments")]
    pub max_deployments: Option<usize>,
    #[serde(default, alias = "window-secs")]
    pub window_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfigFile {
    #[serde(default, alias = "allowed-images")]
    pub allowed_images: Option<Vec<String>>,
    #[serde(default, alias = "database-image")]
    pub database_image: Option<String>,
    #[serde(default, alias = "storage-size")]
    pub storage_size: Option<String>,
    #[serde(default, alias = "reserved-name-fragments")]
    pub reserved_name_fragments: Option<Vec<String>>,
    /// Create a ClusterIP Service for each deployment.
    #[serde(default)]
    pub service: Option<bool>,
}

/// Static bearer token → principal mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrincipalEntry {
    pub token: String,
    pub id: String,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}
