use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use pkg_constants::quota::{DEFAULT_MAX_DEPLOYMENTS, DEFAULT_WINDOW_SECS};
use pkg_constants::state::QUOTA_PREFIX;
use pkg_state::client::StateStore;

/// Capacity of the per-principal rolling window. Configuration only, never user-supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub max_deployments: usize,
    pub window: Duration,
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            max_deployments: DEFAULT_MAX_DEPLOYMENTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Rejected { retry_after: Duration },
}

type Window = Arc<Mutex<VecDeque<DateTime<Utc>>>>;

/// Rolling-window deployment limiter.
///
/// Each principal's window sits behind its own lock, so the check-and-append in
/// [`QuotaGate::try_admit`] is atomic per principal while different principals
/// never contend.
pub struct QuotaGate {
    limits: QuotaLimits,
    windows: DashMap<String, Window>,
    store: Option<StateStore>,
}

impl QuotaGate {
    pub fn new(limits: QuotaLimits) -> Self {
        Self {
            limits,
            windows: DashMap::new(),
            store: None,
        }
    }

    /// Persist every window change under `/registry/quota/`.
    pub fn with_store(limits: QuotaLimits, store: StateStore) -> Self {
        Self {
            store: Some(store),
            ..Self::new(limits)
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    /// Reload persisted windows. Returns the number of principals restored.
    pub async fn restore(&self) -> anyhow::Result<usize> {
        let Some(ref store) = self.store else {
            return Ok(0);
        };
        let entries: Vec<(String, Vec<DateTime<Utc>>)> = store.list_json(QUOTA_PREFIX).await?;
        let count = entries.len();
        for (key, mut stamps) in entries {
            let principal = key.strip_prefix(QUOTA_PREFIX).unwrap_or(&key).to_string();
            stamps.sort();
            self.windows
                .insert(principal, Arc::new(Mutex::new(stamps.into())));
        }
        info!("Restored quota windows for {} principals", count);
        Ok(count)
    }

    fn window_for(&self, principal: &str) -> Window {
        self.windows
            .entry(principal.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }

    fn window_delta(&self) -> TimeDelta {
        TimeDelta::from_std(self.limits.window).unwrap_or(TimeDelta::MAX)
    }

    /// Admit one deployment for `principal` at `now`, or report when a slot frees up.
    pub async fn try_admit(&self, principal: &str, now: DateTime<Utc>) -> anyhow::Result<Admission> {
        let window = self.window_for(principal);
        let mut stamps = window.lock().await;

        prune(&mut stamps, now, self.window_delta());

        if stamps.len() >= self.limits.max_deployments {
            let oldest = stamps.front().copied().unwrap_or(now);
            let retry_after = self
                .window_delta()
                .checked_sub(&(now - oldest))
                .map(|d| d.to_std().unwrap_or_default())
                .unwrap_or(self.limits.window)
                .min(self.limits.window);
            debug!(
                "Quota exhausted for {} ({} in window), retry after {}s",
                principal,
                stamps.len(),
                retry_after.as_secs()
            );
            return Ok(Admission::Rejected { retry_after });
        }

        let at = stamps.partition_point(|t| *t <= now);
        stamps.insert(at, now);

        if let Some(ref store) = self.store {
            let key = format!("{}{}", QUOTA_PREFIX, principal);
            let snapshot: Vec<DateTime<Utc>> = stamps.iter().copied().collect();
            if let Err(e) = store.put_json(&key, &snapshot).await {
                stamps.remove(at);
                return Err(e);
            }
        }
        Ok(Admission::Admitted)
    }

    /// Deployments counted against `principal` at `now`.
    pub async fn usage(&self, principal: &str, now: DateTime<Utc>) -> usize {
        let Some(window) = self.windows.get(principal).map(|w| w.clone()) else {
            return 0;
        };
        let stamps = window.lock().await;
        let horizon = horizon(now, self.window_delta());
        stamps.iter().filter(|t| **t > horizon).count()
    }
}

fn horizon(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Drop every stamp at or before `now - window`.
fn prune(stamps: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>, window: TimeDelta) {
    let horizon = horizon(now, window);
    while stamps.front().is_some_and(|t| *t <= horizon) {
        stamps.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 24, 12, 0, 0).unwrap()
    }

    fn gate() -> QuotaGate {
        QuotaGate::new(QuotaLimits::default())
    }

    #[tokio::test]
    async fn fourth_request_in_window_is_rejected() {
        let gate = gate();
        for i in 0..3 {
            let now = t0() + TimeDelta::minutes(i);
            assert_eq!(gate.try_admit("alice", now).await.unwrap(), Admission::Admitted);
        }
        let now = t0() + TimeDelta::minutes(10);
        match gate.try_admit("alice", now).await.unwrap() {
            Admission::Rejected { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(50 * 60));
                assert!(retry_after <= gate.limits().window);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(gate.usage("alice", now).await, 3);
    }

    #[tokio::test]
    async fn window_elapse_frees_slots() {
        let gate = gate();
        for _ in 0..3 {
            gate.try_admit("alice", t0()).await.unwrap();
        }
        assert!(matches!(
            gate.try_admit("alice", t0() + TimeDelta::minutes(59)).await.unwrap(),
            Admission::Rejected { .. }
        ));
        assert_eq!(
            gate.try_admit("alice", t0() + TimeDelta::hours(1)).await.unwrap(),
            Admission::Admitted
        );
    }

    #[tokio::test]
    async fn principals_are_independent() {
        let gate = gate();
        for _ in 0..3 {
            gate.try_admit("alice", t0()).await.unwrap();
        }
        assert_eq!(gate.try_admit("bob", t0()).await.unwrap(), Admission::Admitted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_at_boundary_admit_exactly_one() {
        for _ in 0..50 {
            let gate = Arc::new(gate());
            gate.try_admit("alice", t0()).await.unwrap();
            gate.try_admit("alice", t0()).await.unwrap();

            let a = tokio::spawn({
                let gate = gate.clone();
                async move { gate.try_admit("alice", t0()).await.unwrap() }
            });
            let b = tokio::spawn({
                let gate = gate.clone();
                async move { gate.try_admit("alice", t0()).await.unwrap() }
            });
            let results = [a.await.unwrap(), b.await.unwrap()];
            let admitted = results
                .iter()
                .filter(|r| **r == Admission::Admitted)
                .count();
            assert_eq!(admitted, 1);
        }
    }

    #[tokio::test]
    async fn windows_survive_restart() {
        let store = StateStore::in_memory().await.unwrap();
        let gate = QuotaGate::with_store(QuotaLimits::default(), store.clone());
        for _ in 0..3 {
            gate.try_admit("alice", t0()).await.unwrap();
        }

        let restarted = QuotaGate::with_store(QuotaLimits::default(), store);
        assert_eq!(restarted.restore().await.unwrap(), 1);
        assert!(matches!(
            restarted.try_admit("alice", t0()).await.unwrap(),
            Admission::Rejected { .. }
        ));
    }
}
