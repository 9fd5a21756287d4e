//! Display state for the current snapshot.
//!
//! The dashboard is the only writer of the current [`Snapshot`]. Every update
//! replaces the whole state through a `watch` channel, so readers always see
//! either the previous state or the new one.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::Snapshot;
use crate::errors::AirError;
use crate::orchestrator::Orchestrator;

/// How overlapping refreshes are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RacePolicy {
    /// Every completion commits; a slow stale query can overwrite a newer one.
    #[default]
    LastCompletedWins,
    /// A completion commits only if no newer request has committed already.
    LatestRequestWins,
}

impl RacePolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LastCompletedWins => "last-completed",
            Self::LatestRequestWins => "latest-request",
        }
    }
}

impl std::str::FromStr for RacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "last-completed" => Ok(Self::LastCompletedWins),
            "latest-request" => Ok(Self::LatestRequestWins),
            _ => Err(format!(
                "unknown race policy: {s} (expected: last-completed, latest-request)"
            )),
        }
    }
}

/// What the display shows right now.
#[derive(Debug, Clone, Default)]
pub struct DisplayState {
    pub snapshot: Option<Arc<Snapshot>>,
    /// Message from the most recent failed refresh, cleared on success
    pub error: Option<String>,
    /// Ticket of the refresh that last changed this state
    pub committed_ticket: u64,
}

/// Outcome of one refresh.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// The new snapshot is now displayed
    Committed(Arc<Snapshot>),
    /// The refresh failed; the previous snapshot is still displayed
    Failed(AirError),
    /// A newer request already committed; this result was dropped
    Superseded,
}

/// Owner of the display state.
pub struct Dashboard {
    orchestrator: Orchestrator,
    policy: RacePolicy,
    tickets: AtomicU64,
    state: watch::Sender<DisplayState>,
}

impl Dashboard {
    #[must_use]
    pub fn new(orchestrator: Orchestrator, policy: RacePolicy) -> Self {
        let (state, _rx) = watch::channel(DisplayState::default());
        Self {
            orchestrator,
            policy,
            tickets: AtomicU64::new(0),
            state,
        }
    }

    #[must_use]
    pub fn policy(&self) -> RacePolicy {
        self.policy
    }

    /// Clone of the current display state.
    #[must_use]
    pub fn current(&self) -> DisplayState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every committed update.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DisplayState> {
        self.state.subscribe()
    }

    /// Resolve `query` and commit the result according to the race policy.
    pub async fn refresh(&self, query: &str) -> RefreshOutcome {
        let ticket = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.orchestrator.resolve(query).await;
        self.commit(ticket, query, result)
    }

    fn commit(
        &self,
        ticket: u64,
        query: &str,
        result: Result<Snapshot, AirError>,
    ) -> RefreshOutcome {
        let policy = self.policy;
        let mut outcome = RefreshOutcome::Superseded;

        self.state.send_if_modified(|state| {
            if policy == RacePolicy::LatestRequestWins && ticket < state.committed_ticket {
                return false;
            }
            state.committed_ticket = state.committed_ticket.max(ticket);
            match result {
                Ok(snapshot) => {
                    let snapshot = Arc::new(snapshot);
                    state.snapshot = Some(Arc::clone(&snapshot));
                    state.error = None;
                    outcome = RefreshOutcome::Committed(snapshot);
                }
                Err(err) => {
                    state.error = Some(err.to_string());
                    outcome = RefreshOutcome::Failed(err);
                }
            }
            true
        });

        match &outcome {
            RefreshOutcome::Committed(snapshot) => {
                info!("refresh #{ticket} for {:?} committed: AQI {}", query, snapshot.aqi);
            }
            RefreshOutcome::Failed(err) => {
                warn!("refresh #{ticket} for {:?} failed: {}", query, err);
            }
            RefreshOutcome::Superseded => {
                info!("refresh #{ticket} for {:?} superseded by a newer request", query);
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::errors::Step;
    use crate::testing::StubProvider;

    fn stub() -> StubProvider {
        StubProvider::new()
            .with_city("A", 10.0, 10.0, 5.0)
            .with_city("B", 20.0, 20.0, 80.0)
    }

    fn dashboard(stub: StubProvider, policy: RacePolicy) -> Arc<Dashboard> {
        Arc::new(Dashboard::new(Orchestrator::new(Arc::new(stub)), policy))
    }

    fn displayed_name(dashboard: &Dashboard) -> Option<String> {
        dashboard
            .current()
            .snapshot
            .map(|s| s.location.resolved_name.clone())
    }

    #[tokio::test]
    async fn test_success_replaces_snapshot() {
        let dashboard = dashboard(stub(), RacePolicy::default());
        assert!(dashboard.current().snapshot.is_none());

        assert!(matches!(dashboard.refresh("A").await, RefreshOutcome::Committed(_)));
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("A"));

        dashboard.refresh("B").await;
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("B"));
        assert!(dashboard.current().error.is_none());
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_snapshot() {
        let dashboard = dashboard(stub(), RacePolicy::default());
        dashboard.refresh("A").await;
        let before = dashboard.current().snapshot.unwrap();

        let outcome = dashboard.refresh("Atlantis-Nowhere-XYZ").await;
        assert!(matches!(outcome, RefreshOutcome::Failed(AirError::NotFound(_))));

        let state = dashboard.current();
        assert!(Arc::ptr_eq(&before, state.snapshot.as_ref().unwrap()));
        assert!(state.error.unwrap().contains("Atlantis-Nowhere-XYZ"));

        // Next success clears the error
        dashboard.refresh("B").await;
        assert!(dashboard.current().error.is_none());
    }

    #[tokio::test]
    async fn test_weather_failure_keeps_previous_snapshot() {
        let dashboard = dashboard(stub().failing_at_for("B", Step::Weather), RacePolicy::default());
        dashboard.refresh("A").await;
        let before = dashboard.current().snapshot.unwrap();

        let outcome = dashboard.refresh("B").await;
        assert!(matches!(
            outcome,
            RefreshOutcome::Failed(AirError::UpstreamUnavailable { step: Step::Weather, .. })
        ));

        let state = dashboard.current();
        assert!(Arc::ptr_eq(&before, state.snapshot.as_ref().unwrap()));
        assert!(state.error.unwrap().contains("weather"));

        // A later success on the same dashboard replaces it
        assert!(matches!(dashboard.refresh("A").await, RefreshOutcome::Committed(_)));
        assert!(dashboard.current().error.is_none());
    }

    #[tokio::test]
    async fn test_sequential_refreshes_show_last() {
        let dashboard = dashboard(
            stub().with_delay("A", Duration::from_millis(50)),
            RacePolicy::LastCompletedWins,
        );
        dashboard.refresh("A").await;
        dashboard.refresh("B").await;
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("B"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_completed_wins_lets_stale_query_clobber() {
        let dashboard = dashboard(
            stub().with_delay("A", Duration::from_secs(10)),
            RacePolicy::LastCompletedWins,
        );

        let slow = tokio::spawn({
            let dashboard = Arc::clone(&dashboard);
            async move { dashboard.refresh("A").await }
        });
        // Let the slow refresh take the first ticket
        tokio::time::sleep(Duration::from_millis(1)).await;
        let fast = dashboard.refresh("B").await;
        assert!(matches!(fast, RefreshOutcome::Committed(_)));
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("B"));

        let stale = slow.await.unwrap();
        assert!(matches!(stale, RefreshOutcome::Committed(_)));
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins_drops_stale_query() {
        let dashboard = dashboard(
            stub().with_delay("A", Duration::from_secs(10)),
            RacePolicy::LatestRequestWins,
        );

        let slow = tokio::spawn({
            let dashboard = Arc::clone(&dashboard);
            async move { dashboard.refresh("A").await }
        });
        // Let the slow refresh take the first ticket
        tokio::time::sleep(Duration::from_millis(1)).await;
        dashboard.refresh("B").await;

        let stale = slow.await.unwrap();
        assert!(matches!(stale, RefreshOutcome::Superseded));
        assert_eq!(displayed_name(&dashboard).as_deref(), Some("B"));
        assert_eq!(dashboard.current().committed_ticket, 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let dashboard = dashboard(stub(), RacePolicy::default());
        let mut rx = dashboard.subscribe();

        dashboard.refresh("B").await;
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update().clone();
        assert_eq!(state.snapshot.unwrap().location.resolved_name, "B");
    }

    #[test]
    fn test_race_policy_parse() {
        assert_eq!(
            "latest-request".parse::<RacePolicy>().unwrap(),
            RacePolicy::LatestRequestWins
        );
        assert_eq!(
            "Last-Completed".parse::<RacePolicy>().unwrap(),
            RacePolicy::LastCompletedWins
        );
        assert!("newest".parse::<RacePolicy>().is_err());
    }
}
