use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::object::ObjectMeta;

/// Opaque secret submitted through `stringData`; the API server does the base64 encoding.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub metadata: ObjectMeta,
    #[serde(rename = "type")]
    pub secret_type: String,
    pub string_data: BTreeMap<String, String>,
}

// Values never reach logs through `{:?}`.
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("metadata", &self.metadata)
            .field("secret_type", &self.secret_type)
            .field("keys", &self.string_data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_hides_values() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: "app-db-secret".into(),
                namespace: "dev".into(),
                ..Default::default()
            },
            secret_type: "Opaque".into(),
            string_data: BTreeMap::from([("password".into(), "hunter2".into())]),
        };
        let rendered = format!("{:?}", secret);
        assert!(rendered.contains("password"));
        assert!(!rendered.contains("hunter2"));
    }
}
