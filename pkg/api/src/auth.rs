use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::ErrorBody;
use pkg_types::config::PrincipalEntry;
use pkg_types::principal::Principal;

/// Static bearer token → principal table, loaded once from configuration.
///
/// Token issuance and verification live outside the gateway; this is only
/// the lookup that turns an already-issued token into a [`Principal`].
#[derive(Debug, Default)]
pub struct PrincipalDirectory {
    by_token: HashMap<String, Principal>,
}

impl PrincipalDirectory {
    pub fn new(entries: &[PrincipalEntry]) -> Self {
        let by_token = entries
            .iter()
            .map(|e| {
                (
                    e.token.clone(),
                    Principal::new(&e.id, e.namespaces.iter().map(|ns| ns.to_lowercase())),
                )
            })
            .collect();
        Self { by_token }
    }

    pub fn resolve(&self, token: &str) -> Option<&Principal> {
        self.by_token.get(token)
    }

    pub fn len(&self) -> usize {
        self.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    /// Union of every namespace some principal may act in.
    pub fn namespaces(&self) -> Vec<String> {
        let mut all: Vec<String> = self
            .by_token
            .values()
            .flat_map(|p| p.namespaces.iter().cloned())
            .collect();
        all.sort();
        all.dedup();
        all
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            reason: "unauthorized".to_string(),
            message: "missing or unknown bearer token".to_string(),
        }),
    )
        .into_response()
}

/// Middleware: resolve the Bearer token to a [`Principal`] and inject it into
/// the request extensions.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        debug!("Request without bearer token");
        return unauthorized();
    };
    let Some(principal) = state.principals.resolve(token).cloned() else {
        warn!("Unknown bearer token presented");
        return unauthorized();
    };

    req.extensions_mut().insert(principal);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_resolves_tokens() {
        let dir = PrincipalDirectory::new(&[
            PrincipalEntry {
                token: "t-alice".into(),
                id: "alice".into(),
                namespaces: vec!["Dev".into()],
            },
            PrincipalEntry {
                token: "t-bob".into(),
                id: "bob".into(),
                namespaces: vec!["dev".into(), "staging".into()],
            },
        ]);
        let alice = dir.resolve("t-alice").unwrap();
        assert_eq!(alice.id, "alice");
        assert!(alice.can_act_in("dev"));
        assert!(dir.resolve("nope").is_none());
        assert_eq!(dir.namespaces(), vec!["dev".to_string(), "staging".to_string()]);
    }
}
