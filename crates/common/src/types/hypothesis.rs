use serde::{Deserialize, Serialize};

use crate::ids::{CaseId, HypothesisId};

/// A candidate root cause with a running confidence estimate.
///
/// Invariants: active probabilities trend toward a sum of 100 after
/// normalization; a probability at or below 10 deactivates the hypothesis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hypothesis {
    pub id: HypothesisId,
    pub case_id: CaseId,
    pub label: String,
    /// 0–100.
    pub probability: i32,
    pub active: bool,
}

impl Hypothesis {
    pub fn new(case_id: CaseId, label: impl Into<String>, probability: i32) -> Self {
        Self {
            id: HypothesisId::new(),
            case_id,
            label: label.into(),
            probability,
            active: true,
        }
    }
}
