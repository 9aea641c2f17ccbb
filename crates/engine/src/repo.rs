use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;

use triage_common::ids::CaseId;
use triage_common::types::{Answer, Case, CaseStatus};
use triage_common::{Result, TriageError};

/// In-memory case repository.
///
/// Persistence is the calling layer's responsibility by design; this keeps
/// the engine boundary honest while staying swappable for a real store.
/// Answers are append-only per case.
pub struct CaseRepo {
    cases: RwLock<HashMap<CaseId, Case>>,
    answers: RwLock<HashMap<CaseId, Vec<Answer>>>,
}

/// Daily triage counters for the operations dashboard.
#[derive(Clone, Debug, serde::Serialize)]
pub struct TriageStats {
    pub total_cases: u64,
    pub diy_resolved: u64,
    pub technician_dispatched: u64,
    pub average_handling_minutes: f64,
}

impl CaseRepo {
    pub fn new() -> Self {
        Self {
            cases: RwLock::new(HashMap::new()),
            answers: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_case(&self, case: Case) -> Case {
        let mut cases = self.cases.write().expect("case repo poisoned");
        cases.insert(case.id, case.clone());
        metrics::counter!("cases.created").increment(1);
        case
    }

    pub fn get_case(&self, id: CaseId) -> Result<Case> {
        let cases = self.cases.read().expect("case repo poisoned");
        cases
            .get(&id)
            .cloned()
            .ok_or_else(|| TriageError::NotFound(format!("case {}", id)))
    }

    pub fn update_case(&self, case: &Case) {
        let mut cases = self.cases.write().expect("case repo poisoned");
        cases.insert(case.id, case.clone());
    }

    pub fn list_cases(&self) -> Vec<Case> {
        let cases = self.cases.read().expect("case repo poisoned");
        let mut all: Vec<Case> = cases.values().cloned().collect();
        all.sort_by_key(|c| c.created_at);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.cases.read().expect("case repo poisoned").is_empty()
    }

    pub fn append_answer(&self, answer: Answer) {
        let mut answers = self.answers.write().expect("case repo poisoned");
        answers.entry(answer.case_id).or_default().push(answer);
    }

    pub fn answers_for(&self, case_id: CaseId) -> Vec<Answer> {
        let answers = self.answers.read().expect("case repo poisoned");
        answers.get(&case_id).cloned().unwrap_or_default()
    }

    /// Counters over today's cases.
    pub fn daily_stats(&self) -> TriageStats {
        let today = Utc::now().date_naive();
        let cases = self.cases.read().expect("case repo poisoned");

        let todays: Vec<&Case> = cases
            .values()
            .filter(|c| c.created_at.date_naive() == today)
            .collect();

        let diy_resolved = todays
            .iter()
            .filter(|c| c.status == CaseStatus::ResolvedDiy)
            .count() as u64;
        let technician_dispatched = todays
            .iter()
            .filter(|c| c.status == CaseStatus::NeedsTechnician)
            .count() as u64;

        let estimates: Vec<i32> = todays
            .iter()
            .filter_map(|c| c.diagnosis.as_ref())
            .map(|d| d.time_estimate_minutes)
            .collect();
        let average_handling_minutes = if estimates.is_empty() {
            0.0
        } else {
            f64::from(estimates.iter().sum::<i32>()) / estimates.len() as f64
        };

        TriageStats {
            total_cases: todays.len() as u64,
            diy_resolved,
            technician_dispatched,
            average_handling_minutes,
        }
    }
}

impl Default for CaseRepo {
    fn default() -> Self {
        Self::new()
    }
}
