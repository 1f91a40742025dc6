//! Query descriptors: what the traveler asked for.
//!
//! Set once when a run starts. No patch can touch them.

use serde::{Deserialize, Serialize};

/// Budget bounds in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BudgetRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: String,
}

/// The traveler's request.
///
/// `destination` is the *explicit* destination. When it is set, destination research is
/// skipped; a destination merely mentioned in `raw_query` does not count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TravelQuery {
    pub raw_query: String,
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// ISO-8601 date, e.g. `2026-11-02`.
    pub departure_date: Option<String>,
    /// ISO-8601 date.
    pub return_date: Option<String>,
    pub travelers: u32,
    pub budget: Option<BudgetRange>,
}

impl TravelQuery {
    pub fn new(raw_query: impl Into<String>) -> Self {
        Self {
            raw_query: raw_query.into(),
            travelers: 1,
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    pub fn with_dates(mut self, departure: impl Into<String>, ret: impl Into<String>) -> Self {
        self.departure_date = Some(departure.into());
        self.return_date = Some(ret.into());
        self
    }

    pub fn with_travelers(mut self, travelers: u32) -> Self {
        self.travelers = travelers;
        self
    }

    pub fn with_budget(mut self, budget: BudgetRange) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Explicit destination, ignoring blank strings.
    pub fn explicit_destination(&self) -> Option<&str> {
        self.destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

const LEAD_INS: [&str; 7] = [
    "visit ",
    "go to ",
    "travel to ",
    "trip to ",
    "fly to ",
    "heading to ",
    "explore ",
];
const STOP_WORDS: [&str; 3] = [" for ", " in ", " from "];

/// Pulls a candidate destination out of free text ("Visit Tokyo for a week" -> "Tokyo").
///
/// Case-insensitive on the lead-in phrase; the candidate ends at the first of
/// " for ", " in ", " from " or the end of the text. Returns `None` if no lead-in matches.
pub fn extract_destination(raw_query: &str) -> Option<String> {
    let lower = raw_query.to_ascii_lowercase();
    let (start, lead) = LEAD_INS
        .iter()
        .filter_map(|lead| lower.find(lead).map(|pos| (pos, *lead)))
        .min_by_key(|(pos, _)| *pos)?;
    let rest_start = start + lead.len();
    let rest_lower = &lower[rest_start..];
    let end = STOP_WORDS
        .iter()
        .filter_map(|w| rest_lower.find(w))
        .min()
        .unwrap_or(rest_lower.len());
    let candidate = raw_query
        .get(rest_start..rest_start + end)?
        .trim()
        .trim_end_matches('.')
        .trim();
    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}
