mod microwave;
mod refrigerator;
mod washer;

pub use microwave::MicrowaveSparksRule;
pub use refrigerator::RefrigeratorNoCoolingRule;
pub use washer::WasherNoWaterRule;

use std::collections::HashMap;
use std::sync::Arc;

use triage_common::types::{AnswerMap, AnswerValue, ApplianceKind, Case, Diagnosis, Question};

/// A diagnostic rule: one fixed decision tree for an (appliance type,
/// symptom pattern) pair.
///
/// Rules are stateless and shared across all cases. Per-case progress lives
/// in the session table, never here.
pub trait DiagnosticRule: Send + Sync {
    /// Stable rule identifier. Also keys the hypothesis starter set.
    fn id(&self) -> &'static str;

    fn appliance(&self) -> ApplianceKind;

    /// Whether the free-text symptom matches this rule's vocabulary.
    fn matches(&self, symptom: &str) -> bool;

    /// Higher value wins selection ties.
    fn priority(&self) -> i32;

    fn questions(&self) -> Vec<Question>;

    fn first_question(&self) -> Question;

    /// Next question after answering `current_code`, or None when the
    /// traversal is done.
    fn next_question(
        &self,
        current_code: &str,
        answer: Option<&AnswerValue>,
        all_answers: &AnswerMap,
    ) -> Option<Question>;

    /// Deterministic evaluation of the full answer set into a diagnosis.
    fn evaluate(&self, answers: &AnswerMap, case: &Case) -> Diagnosis;

    /// Maps the numeric question id exposed over the boundary to the stable
    /// string code answers are stored under. UI-level renumbering never
    /// invalidates stored answers.
    fn question_code(&self, question_id: i64) -> String;
}

/// Where a traversal goes after an answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Ask(&'static str),
    Done,
}

type Transition = fn(Option<&AnswerValue>, &AnswerMap) -> Step;

/// A rule's question set plus transition table, kept as plain data so the
/// graph is testable without the engine.
pub struct QuestionGraph {
    first: &'static str,
    questions: HashMap<&'static str, Question>,
    transitions: HashMap<&'static str, Transition>,
}

impl QuestionGraph {
    pub fn new(first: &'static str) -> Self {
        Self {
            first,
            questions: HashMap::new(),
            transitions: HashMap::new(),
        }
    }

    pub fn node(mut self, code: &'static str, question: Question, transition: Transition) -> Self {
        self.questions.insert(code, question);
        self.transitions.insert(code, transition);
        self
    }

    pub fn first(&self) -> Question {
        self.questions[self.first].clone()
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.values().cloned().collect()
    }

    pub fn next(
        &self,
        current: &str,
        answer: Option<&AnswerValue>,
        all_answers: &AnswerMap,
    ) -> Option<Question> {
        let step = self
            .transitions
            .get(current)
            .map(|t| t(answer, all_answers))
            .unwrap_or(Step::Done);
        match step {
            Step::Ask(code) => self.questions.get(code).cloned(),
            Step::Done => None,
        }
    }
}

/// True iff the answer for `code` is an explicit boolean true.
pub(crate) fn is_true(answers: &AnswerMap, code: &str) -> bool {
    matches!(answers.get(code), Some(AnswerValue::Bool(true)))
}

/// True iff the answer for `code` is an explicit boolean false.
pub(crate) fn is_false(answers: &AnswerMap, code: &str) -> bool {
    matches!(answers.get(code), Some(AnswerValue::Bool(false)))
}

/// True iff the answer for `code` is exactly the given choice text.
pub(crate) fn is_choice(answers: &AnswerMap, code: &str, choice: &str) -> bool {
    matches!(answers.get(code), Some(AnswerValue::Text(t)) if t == choice)
}

/// Registry of all diagnostic rules, the single source of rule selection.
pub struct RuleRegistry {
    rules: Vec<Arc<dyn DiagnosticRule>>,
}

impl RuleRegistry {
    pub fn new(rules: Vec<Arc<dyn DiagnosticRule>>) -> Self {
        Self { rules }
    }

    /// All rules shipped with the engine.
    pub fn with_builtin_rules() -> Self {
        Self::new(vec![
            Arc::new(RefrigeratorNoCoolingRule::new()),
            Arc::new(WasherNoWaterRule::new()),
            Arc::new(MicrowaveSparksRule::new()),
        ])
    }

    /// Selects the best rule for a reported symptom: filter by appliance,
    /// prefer matching predicates, break ties by descending priority, and
    /// fall back to the highest-priority rule for the appliance. Returns
    /// None only when the appliance has no rules at all.
    pub fn select_rule(
        &self,
        appliance: ApplianceKind,
        symptom: &str,
    ) -> Option<Arc<dyn DiagnosticRule>> {
        let mut compatible: Vec<&Arc<dyn DiagnosticRule>> = self
            .rules
            .iter()
            .filter(|r| r.appliance() == appliance)
            .collect();
        compatible.sort_by(|a, b| b.priority().cmp(&a.priority()));

        if let Some(rule) = compatible.iter().find(|r| r.matches(symptom)) {
            return Some(Arc::clone(*rule));
        }

        // Uncontrolled free text often matches nothing; the most specific
        // rule for the appliance is still the best starting point.
        compatible.first().map(|r| Arc::clone(*r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_deterministic() {
        let registry = RuleRegistry::with_builtin_rules();
        let a = registry
            .select_rule(ApplianceKind::Refrigerator, "no enfría nada")
            .unwrap();
        let b = registry
            .select_rule(ApplianceKind::Refrigerator, "no enfría nada")
            .unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.id(), "heladera_no_enfria");
    }

    #[test]
    fn test_fallback_when_no_predicate_matches() {
        let registry = RuleRegistry::with_builtin_rules();
        let rule = registry
            .select_rule(ApplianceKind::Washer, "hace un ruido raro")
            .unwrap();
        // Falls back to the highest-priority washer rule.
        assert_eq!(rule.id(), "lavarropas_no_carga_agua");
    }

    #[test]
    fn test_symptom_match_routes_to_specific_rule() {
        let registry = RuleRegistry::with_builtin_rules();
        let rule = registry
            .select_rule(ApplianceKind::Microwave, "hace chispas adentro")
            .unwrap();
        assert_eq!(rule.id(), "microondas_hace_chispas");
        assert_eq!(rule.priority(), 200);
    }
}
