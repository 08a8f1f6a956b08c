//! Demographics Query Engine.
//!
//! Filters detection records for one camera and summarizes them per
//! category. Remote results are preferred; an empty remote answer or a
//! remote failure falls back to synthetic records filtered the same way.
//!
//! Every call to [`DemographicsQueryEngine::query`] takes a sequence number
//! when it is made. The visible result only moves forward: a response whose
//! sequence is older than the one already shown is discarded, so a slow
//! earlier query cannot overwrite a newer one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use camwatch_client::DemographicsService;
use camwatch_core::analytics::DistributionSummary;
use camwatch_core::demographics::DemographicsResult;
use camwatch_core::filters::{ActiveFilters, DemographicsFilter, FilterState};

use crate::fixtures::FixtureProvider;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Where a query's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// The query did not run (no camera selected or invalid filter).
    Disabled,
    Remote,
    Synthetic,
}

/// Records plus their distribution summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemographicsQueryResult {
    pub results: Vec<DemographicsResult>,
    pub analytics: DistributionSummary,
    /// False only when the query did not run. Not an error state.
    pub is_success: bool,
    pub source: ResultSource,
}

impl DemographicsQueryResult {
    pub fn disabled() -> Self {
        Self {
            results: Vec::new(),
            analytics: DistributionSummary::default(),
            is_success: false,
            source: ResultSource::Disabled,
        }
    }

    fn from_results(results: Vec<DemographicsResult>, source: ResultSource) -> Self {
        let analytics = DistributionSummary::from_results(&results);
        Self {
            results,
            analytics,
            is_success: true,
            source,
        }
    }
}

/// The result currently shown and the sequence number of the call that
/// produced it. Sequence 0 is the initial empty state.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleQuery {
    pub seq: u64,
    pub result: DemographicsQueryResult,
}

/// What happened to one call's response.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The response became the visible result.
    Applied {
        seq: u64,
        result: DemographicsQueryResult,
    },
    /// A newer call's response was already visible; this one was dropped.
    Stale { seq: u64, superseded_by: u64 },
}

impl QueryOutcome {
    pub fn seq(&self) -> u64 {
        match self {
            QueryOutcome::Applied { seq, .. } | QueryOutcome::Stale { seq, .. } => *seq,
        }
    }

    /// The applied result, or `None` for a stale response.
    pub fn into_result(self) -> Option<DemographicsQueryResult> {
        match self {
            QueryOutcome::Applied { result, .. } => Some(result),
            QueryOutcome::Stale { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct DemographicsQueryEngine {
    remote: Arc<dyn DemographicsService>,
    fixtures: Arc<FixtureProvider>,
    next_seq: AtomicU64,
    visible: watch::Sender<VisibleQuery>,
}

impl DemographicsQueryEngine {
    pub fn new(remote: Arc<dyn DemographicsService>, fixtures: Arc<FixtureProvider>) -> Self {
        let (visible, _) = watch::channel(VisibleQuery {
            seq: 0,
            result: DemographicsQueryResult::disabled(),
        });
        Self {
            remote,
            fixtures,
            next_seq: AtomicU64::new(0),
            visible,
        }
    }

    /// Run a query for `filter`.
    ///
    /// The sequence number is taken when this method is called, before the
    /// returned future is first polled. A blank `camera_id` makes no remote
    /// call and yields an empty, unsuccessful (but not failed) result.
    pub fn query(
        &self,
        filter: &DemographicsFilter,
    ) -> impl Future<Output = QueryOutcome> + Send + '_ {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let filter = filter.clone();
        async move {
            let result = match filter.normalize() {
                Ok(FilterState::Active(filters)) => self.execute(&filters).await,
                Ok(FilterState::Disabled) => {
                    tracing::debug!(seq, "Demographics query disabled, no camera selected");
                    DemographicsQueryResult::disabled()
                }
                Err(e) => {
                    tracing::warn!(seq, error = %e, "Invalid demographics filter");
                    DemographicsQueryResult::disabled()
                }
            };
            self.publish(seq, result)
        }
    }

    /// Watch the visible result.
    pub fn subscribe(&self) -> watch::Receiver<VisibleQuery> {
        self.visible.subscribe()
    }

    /// Snapshot of the visible result.
    pub fn latest(&self) -> VisibleQuery {
        self.visible.borrow().clone()
    }

    async fn execute(&self, filters: &ActiveFilters) -> DemographicsQueryResult {
        match self.remote.query_results(filters).await {
            Ok(response) => {
                let results: Vec<DemographicsResult> = response
                    .results
                    .into_iter()
                    .filter(|r| filters.matches(r))
                    .collect();
                if results.is_empty() {
                    tracing::info!(
                        camera_id = %filters.camera_id,
                        "No remote demographics results, using synthetic records",
                    );
                    return self.synthetic(filters);
                }
                DemographicsQueryResult::from_results(results, ResultSource::Remote)
            }
            Err(e) => {
                tracing::warn!(
                    camera_id = %filters.camera_id,
                    error = %e,
                    "Remote demographics query failed, using synthetic records",
                );
                self.synthetic(filters)
            }
        }
    }

    fn synthetic(&self, filters: &ActiveFilters) -> DemographicsQueryResult {
        DemographicsQueryResult::from_results(
            self.fixtures.demographics(filters),
            ResultSource::Synthetic,
        )
    }

    fn publish(&self, seq: u64, result: DemographicsQueryResult) -> QueryOutcome {
        let mut superseded_by = 0;
        let shown = result.clone();
        let applied = self.visible.send_if_modified(|visible| {
            if seq > visible.seq {
                *visible = VisibleQuery { seq, result: shown };
                true
            } else {
                superseded_by = visible.seq;
                false
            }
        });

        if applied {
            QueryOutcome::Applied { seq, result }
        } else {
            tracing::debug!(seq, superseded_by, "Discarding stale demographics response");
            QueryOutcome::Stale { seq, superseded_by }
        }
    }
}
