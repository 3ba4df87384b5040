use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The authenticated caller as handed over by the authentication layer.
///
/// The gateway never inspects tokens; it trusts whatever resolved this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    /// Namespaces this principal may deploy into.
    #[serde(default)]
    pub namespaces: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(id: impl Into<String>, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            namespaces: namespaces.into_iter().map(Into::into).collect(),
        }
    }

    pub fn can_act_in(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }
}
