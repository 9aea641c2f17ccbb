use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use triage_common::ids::CaseId;
use triage_common::types::AnswerMap;

use crate::rules::DiagnosticRule;

/// Traversal phase of a diagnosis session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Questions are still being asked.
    Questioning,
    /// The rule returned no further question; finalize may run.
    ReadyToFinalize,
}

/// Per-case mutable state for one diagnosis session: the active rule, the
/// latest answer per stable question code, and the last question asked.
pub struct Session {
    pub rule: Arc<dyn DiagnosticRule>,
    pub answers: AnswerMap,
    pub last_question: Option<String>,
    pub phase: SessionPhase,
    touched_at: Instant,
}

/// Session table keyed by case id, with an idle-TTL sweep on insert and an
/// explicit eviction on finalize.
///
/// The caller serializes operations per case id; distinct cases may proceed
/// fully in parallel. Critical sections here are short and never await.
pub struct SessionTable {
    entries: Mutex<HashMap<CaseId, Session>>,
    idle_ttl: Duration,
}

impl SessionTable {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            idle_ttl,
        }
    }

    /// Starts a session for a case, sweeping idle entries first.
    pub fn start(&self, case_id: CaseId, rule: Arc<dyn DiagnosticRule>) {
        let mut entries = self.entries.lock().expect("session table poisoned");

        let before = entries.len();
        entries.retain(|_, s| s.touched_at.elapsed() < self.idle_ttl);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::info!(evicted = evicted, "Swept idle sessions");
            metrics::counter!("sessions.evicted_idle").increment(evicted as u64);
        }

        entries.insert(
            case_id,
            Session {
                rule,
                answers: AnswerMap::new(),
                last_question: None,
                phase: SessionPhase::Questioning,
                touched_at: Instant::now(),
            },
        );
        metrics::counter!("sessions.started").increment(1);
    }

    pub fn contains(&self, case_id: CaseId) -> bool {
        let entries = self.entries.lock().expect("session table poisoned");
        entries
            .get(&case_id)
            .is_some_and(|s| s.touched_at.elapsed() < self.idle_ttl)
    }

    /// Runs a closure against the session, refreshing its idle clock.
    /// Returns None when no live session exists for the case.
    pub fn with<R>(&self, case_id: CaseId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut entries = self.entries.lock().expect("session table poisoned");
        let session = entries.get_mut(&case_id)?;
        if session.touched_at.elapsed() >= self.idle_ttl {
            entries.remove(&case_id);
            metrics::counter!("sessions.evicted_idle").increment(1);
            return None;
        }
        session.touched_at = Instant::now();
        Some(f(session))
    }

    /// Evicts the session. Called exactly once per case, by finalize.
    pub fn remove(&self, case_id: CaseId) -> Option<Session> {
        let mut entries = self.entries.lock().expect("session table poisoned");
        entries.remove(&case_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RefrigeratorNoCoolingRule;
    use triage_common::types::AnswerValue;

    fn rule() -> Arc<dyn DiagnosticRule> {
        Arc::new(RefrigeratorNoCoolingRule::new())
    }

    #[test]
    fn test_start_and_answer_last_write_wins() {
        let table = SessionTable::new(Duration::from_secs(3600));
        let case_id = CaseId::new();
        table.start(case_id, rule());

        table.with(case_id, |s| {
            s.answers
                .insert("h_ne_p1".to_string(), AnswerValue::Bool(true));
        });
        table.with(case_id, |s| {
            s.answers
                .insert("h_ne_p1".to_string(), AnswerValue::Bool(false));
        });

        let latest = table
            .with(case_id, |s| s.answers.get("h_ne_p1").cloned())
            .flatten();
        assert_eq!(latest, Some(AnswerValue::Bool(false)));
    }

    #[test]
    fn test_remove_frees_session() {
        let table = SessionTable::new(Duration::from_secs(3600));
        let case_id = CaseId::new();
        table.start(case_id, rule());
        assert!(table.contains(case_id));

        assert!(table.remove(case_id).is_some());
        assert!(!table.contains(case_id));
        assert!(table.with(case_id, |_| ()).is_none());
    }

    #[test]
    fn test_idle_session_expires() {
        let table = SessionTable::new(Duration::from_millis(1));
        let case_id = CaseId::new();
        table.start(case_id, rule());

        std::thread::sleep(Duration::from_millis(10));
        assert!(!table.contains(case_id));
        assert!(table.with(case_id, |_| ()).is_none());
    }
}
