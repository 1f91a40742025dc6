//! Canned workers so the CLI runs without any external service.
//!
//! Each [`DemoWorker`] answers with a small JSON document shaped like a real worker's
//! result, built from the criteria it receives. `--fail <kind>` swaps a worker for one
//! that always fails transiently, to show retries and degraded sections.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tripgraph::graph::StepId;
use tripgraph::worker::Criteria;
use tripgraph::{Worker, WorkerError, WorkerKind, WorkerRegistry};

/// Names accepted by `--fail`, with the worker kind each one stands for.
pub const DEMO_KINDS: [(&str, WorkerKind); 7] = [
    ("orchestrator", WorkerKind::Orchestrator),
    ("research", WorkerKind::DestinationResearch),
    ("flights", WorkerKind::FlightSearch),
    ("accommodation", WorkerKind::Accommodation),
    ("transportation", WorkerKind::Transportation),
    ("activities", WorkerKind::ActivityPlanning),
    ("budget", WorkerKind::BudgetManagement),
];

/// Looks up a `--fail` name.
pub fn demo_kind(name: &str) -> Option<WorkerKind> {
    DEMO_KINDS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
        .map(|(_, kind)| *kind)
}

/// Canned worker of one kind.
pub struct DemoWorker {
    kind: WorkerKind,
    failing: bool,
}

impl DemoWorker {
    pub fn new(kind: WorkerKind) -> Self {
        Self {
            kind,
            failing: false,
        }
    }

    /// Worker that always reports a transient failure.
    pub fn failing(kind: WorkerKind) -> Self {
        Self {
            kind,
            failing: true,
        }
    }
}

#[async_trait]
impl Worker for DemoWorker {
    fn name(&self) -> &str {
        DEMO_KINDS
            .iter()
            .find(|(_, k)| *k == self.kind)
            .map(|(n, _)| *n)
            .unwrap_or("demo")
    }

    async fn perform(&self, criteria: &Criteria) -> Result<Value, WorkerError> {
        if self.failing {
            return Err(WorkerError::Transient(format!(
                "{} service unavailable",
                self.name()
            )));
        }
        let destination = destination_name(criteria);
        let travelers = criteria.query.travelers.max(1);
        let answer = match (self.kind, criteria.step) {
            (WorkerKind::Orchestrator, StepId::FinalizePlan) => json!({
                "headline": format!("{} for {} traveler(s)", destination, travelers),
                "missing": criteria.context.get("degraded").cloned().unwrap_or(json!([])),
            }),
            (WorkerKind::Orchestrator, _) => json!({
                "intent": "plan_trip",
                "travelers": travelers,
                "origin": criteria.query.origin,
            }),
            (WorkerKind::DestinationResearch, _) => json!({
                "name": destination,
                "highlights": ["old town walk", "local market", "museum quarter"],
                "best_season": "autumn",
            }),
            (WorkerKind::FlightSearch, _) => json!([{
                "carrier": "Demo Air",
                "from": criteria.query.origin.as_deref().unwrap_or("HOME"),
                "to": destination,
                "price": 420 * travelers,
            }]),
            (WorkerKind::Accommodation, _) => json!([{
                "name": format!("Hotel Central {}", destination),
                "nightly_rate": 110,
                "rating": 4.3,
            }]),
            (WorkerKind::Transportation, _) => json!({
                "pass": format!("{} transit pass", destination),
                "daily_cost": 12 * travelers,
            }),
            (WorkerKind::ActivityPlanning, _) => json!({
                "days": [
                    { "day": 1, "plan": "arrival and old town walk" },
                    { "day": 2, "plan": "museum quarter" },
                    { "day": 3, "plan": "local market and departure" },
                ],
            }),
            (WorkerKind::BudgetManagement, _) => {
                let partial = criteria.context.contains_key("degraded");
                json!({
                    "tier": "standard",
                    "total": 1450 * travelers,
                    "currency": criteria
                        .query
                        .budget
                        .as_ref()
                        .map(|b| b.currency.clone())
                        .unwrap_or_else(|| "USD".to_string()),
                    "estimate_incomplete": partial,
                })
            }
        };
        Ok(answer)
    }
}

/// Destination as the step sees it: researched or explicit, then the analysis candidate.
fn destination_name(criteria: &Criteria) -> String {
    let from_context = criteria.context.get("destination").and_then(|d| match d {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    });
    from_context
        .or_else(|| {
            criteria
                .context
                .get("candidate_destination")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| criteria.query.destination.clone())
        .unwrap_or_else(|| "Lisbon".to_string())
}

/// Registry with a demo worker for every kind; kinds in `failing` always fail.
///
/// Workers are registered through factories so construction is logged on first use.
pub fn demo_registry(failing: &[WorkerKind]) -> WorkerRegistry {
    let mut registry = WorkerRegistry::new();
    for kind in WorkerKind::ALL {
        let fail = failing.contains(&kind);
        registry.register_fn(kind, move || async move {
            tracing::debug!(?kind, fail, "constructing demo worker");
            let worker: Arc<dyn Worker> = if fail {
                Arc::new(DemoWorker::failing(kind))
            } else {
                Arc::new(DemoWorker::new(kind))
            };
            Ok(worker)
        });
    }
    registry
}
