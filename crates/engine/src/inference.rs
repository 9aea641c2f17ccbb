use std::sync::Arc;
use std::time::Duration;

use triage_common::config::SystemConfig;
use triage_common::ids::CaseId;
use triage_common::types::{Answer, AnswerValue, Case, CaseStatus, Diagnosis, Hypothesis, Question};
use triage_common::{Result, TriageError};

use crate::hypotheses::HypothesisTracker;
use crate::reasoner::ReasonerAdapter;
use crate::rules::RuleRegistry;
use crate::session::{SessionPhase, SessionTable};

/// The diagnostic inference engine: drives the question/answer traversal
/// against the session table and hypothesis tracker, and produces the
/// authoritative diagnosis on finalize.
///
/// The engine never performs storage I/O. The calling layer supplies the
/// case record and the persisted answers, persists whatever comes back, and
/// serializes operations per case id.
pub struct InferenceEngine {
    registry: RuleRegistry,
    sessions: SessionTable,
    hypotheses: HypothesisTracker,
    reasoner: ReasonerAdapter,
}

impl InferenceEngine {
    pub fn new(config: &SystemConfig) -> Self {
        Self::with_registry(config, RuleRegistry::with_builtin_rules())
    }

    pub fn with_registry(config: &SystemConfig, registry: RuleRegistry) -> Self {
        Self {
            registry,
            sessions: SessionTable::new(Duration::from_secs(
                config.sessions.idle_ttl_minutes * 60,
            )),
            hypotheses: HypothesisTracker::new(),
            reasoner: ReasonerAdapter::new(config.reasoner.clone()),
        }
    }

    /// Next question for the case, or None once the traversal is done.
    ///
    /// The first call selects the rule, seeds the hypothesis set, and starts
    /// the session. Repeated calls before any answer re-return the first
    /// question.
    pub fn next_question(&self, case: &Case) -> Result<Option<Question>> {
        if !self.sessions.contains(case.id) {
            let rule = self
                .registry
                .select_rule(case.appliance, &case.symptom)
                .ok_or_else(|| {
                    TriageError::NoApplicableRule(case.appliance.as_fact_str().to_string())
                })?;

            tracing::info!(
                case_id = %case.id,
                rule = rule.id(),
                priority = rule.priority(),
                "Rule selected"
            );

            self.hypotheses.seed(case.id, rule.id());
            let first = rule.first_question();
            self.sessions.start(case.id, rule);
            return Ok(Some(first));
        }

        self.sessions
            .with(case.id, |session| {
                let Some(last) = session.last_question.clone() else {
                    return Some(session.rule.first_question());
                };

                let rule = Arc::clone(&session.rule);
                let next = rule.next_question(&last, session.answers.get(&last), &session.answers);
                if next.is_none() {
                    session.phase = SessionPhase::ReadyToFinalize;
                    tracing::info!(case_id = %case.id, "No further questions, ready to finalize");
                }
                next
            })
            .ok_or_else(|| TriageError::NotFound(format!("no session for case {}", case.id)))
    }

    /// Records an operator answer: coerces the raw value, stores it under
    /// the rule's stable question code (last write wins), and re-scores the
    /// hypothesis set.
    pub fn record_answer(&self, case: &Case, question_id: i64, raw_value: &str) -> Result<()> {
        let answers = self
            .sessions
            .with(case.id, |session| {
                let code = session.rule.question_code(question_id);
                let value = AnswerValue::coerce(raw_value);
                tracing::debug!(case_id = %case.id, code = %code, "Answer recorded");

                session.answers.insert(code.clone(), value);
                session.last_question = Some(code);
                // Re-answering after the traversal ended re-opens it; the
                // next question is re-derived from the new answer.
                session.phase = SessionPhase::Questioning;
                session.answers.clone()
            })
            .ok_or_else(|| TriageError::NotFound(format!("no session for case {}", case.id)))?;

        self.hypotheses.rescore(case.id, &answers);
        Ok(())
    }

    /// Current hypothesis set for the case, most probable first.
    pub fn hypotheses(&self, case_id: CaseId) -> Vec<Hypothesis> {
        self.hypotheses.snapshot(case_id)
    }

    /// Produces the authoritative diagnosis for the case.
    ///
    /// The external reasoner is tried first; any failure there is logged and
    /// recovered via the active rule's deterministic evaluator — the only
    /// retry in the system. Afterwards the case is marked diagnosed, the
    /// hypothesis set is reconciled, and the session is evicted: a second
    /// finalize fails because the session is gone, even though the case and
    /// diagnosis persist.
    pub async fn finalize(&self, case: &mut Case, persisted: &[Answer]) -> Result<Diagnosis> {
        let start = std::time::Instant::now();

        let (rule, answers) = self
            .sessions
            .with(case.id, |session| {
                (Arc::clone(&session.rule), session.answers.clone())
            })
            .ok_or_else(|| TriageError::NotFound(format!("no session for case {}", case.id)))?;

        if answers.is_empty() {
            return Err(TriageError::NoAnswers(case.id.to_string()));
        }

        let diagnosis = match self.reasoner.diagnose(case, persisted).await {
            Ok(diagnosis) => {
                tracing::info!(case_id = %case.id, "Diagnosis produced by external reasoner");
                metrics::counter!("diagnoses.reasoner").increment(1);
                diagnosis
            }
            Err(e) => {
                tracing::warn!(
                    case_id = %case.id,
                    error = %e,
                    "Reasoner path failed, falling back to rule evaluator"
                );
                metrics::counter!("diagnoses.fallback").increment(1);
                rule.evaluate(&answers, case)
            }
        };

        case.status = CaseStatus::Diagnosed;
        case.diagnosis = Some(diagnosis.clone());

        self.hypotheses.reconcile(case.id, &diagnosis);
        self.sessions.remove(case.id);
        metrics::counter!("sessions.finalized").increment(1);
        metrics::histogram!("finalize.latency").record(start.elapsed().as_secs_f64());

        tracing::info!(
            case_id = %case.id,
            cause = %diagnosis.probable_cause,
            confidence = diagnosis.confidence,
            urgency = diagnosis.urgency.as_fact_str(),
            "Diagnosis finalized"
        );

        Ok(diagnosis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_common::config::ReasonerConfig;
    use triage_common::types::ApplianceKind;

    fn engine_without_reasoner() -> InferenceEngine {
        InferenceEngine::new(&SystemConfig {
            reasoner: ReasonerConfig {
                enabled: false,
                ..ReasonerConfig::default()
            },
            ..SystemConfig::default()
        })
    }

    #[test]
    fn test_next_question_is_idempotent_before_answers() {
        let engine = engine_without_reasoner();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");

        let q1 = engine.next_question(&case).unwrap().unwrap();
        let q2 = engine.next_question(&case).unwrap().unwrap();
        assert_eq!(q1.id, q2.id);
        assert_eq!(q1.prompt, q2.prompt);
    }

    #[test]
    fn test_record_answer_without_session_is_not_found() {
        let engine = engine_without_reasoner();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        let err = engine.record_answer(&case, 1, "no").unwrap_err();
        assert!(matches!(err, TriageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_finalize_without_answers_fails() {
        let engine = engine_without_reasoner();
        let mut case = Case::new(ApplianceKind::Refrigerator, "no enfría");

        engine.next_question(&case).unwrap();
        let err = engine.finalize(&mut case, &[]).await.unwrap_err();
        assert!(matches!(err, TriageError::NoAnswers(_)));
    }

    #[test]
    fn test_last_write_wins_and_rescores() {
        let engine = engine_without_reasoner();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        engine.next_question(&case).unwrap();

        engine.record_answer(&case, 1, "si").unwrap();
        let electrical = engine
            .hypotheses(case.id)
            .into_iter()
            .find(|h| h.label == "Problema eléctrico")
            .unwrap();
        assert!(!electrical.active);

        engine.record_answer(&case, 1, "no").unwrap();
        let electrical = engine
            .hypotheses(case.id)
            .into_iter()
            .find(|h| h.label == "Problema eléctrico")
            .unwrap();
        assert!(electrical.active);
    }
}
