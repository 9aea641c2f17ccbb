use std::collections::HashMap;
use std::sync::Mutex;

use triage_common::ids::CaseId;
use triage_common::types::{AnswerMap, AnswerValue, Diagnosis, Hypothesis};

/// Probability floor: at or below this a hypothesis is deactivated.
const ACTIVE_FLOOR: i32 = 10;

/// Starter hypothesis sets, keyed by rule family.
fn starter_set(rule_id: &str) -> Vec<(&'static str, i32)> {
    if rule_id.contains("no_enfria") {
        vec![
            ("Problema eléctrico", 30),
            ("Falla del compresor", 25),
            ("Termostato defectuoso", 20),
            ("Fuga de gas refrigerante", 15),
            ("Sistema de desescarche", 10),
        ]
    } else if rule_id.contains("no_carga_agua") {
        vec![
            ("Canilla cerrada", 35),
            ("Filtro obstruido", 30),
            ("Electroválvula defectuosa", 25),
            ("Problema de presión", 10),
        ]
    } else if rule_id.contains("hace_chispas") {
        vec![
            ("Objeto metálico dentro", 50),
            ("Mica protectora dañada", 30),
            ("Magnetrón defectuoso", 15),
            ("Plato mal colocado", 5),
        ]
    } else {
        Vec::new()
    }
}

/// Signed probability adjustment for one hypothesis given the answers so far.
/// The only calibrated signal is the interior-light question: a working
/// light argues against an electrical fault, a dead one argues strongly for
/// it.
fn adjustment(label: &str, answers: &AnswerMap) -> i32 {
    if label.contains("eléctrico") {
        match answers.get("h_ne_p1") {
            Some(AnswerValue::Bool(true)) => return -20,
            Some(AnswerValue::Bool(false)) => return 40,
            _ => {}
        }
    }
    0
}

/// Scales active probabilities so they sum to 100, nearest-integer rounding.
/// Inactive hypotheses are left untouched.
fn normalize(hypotheses: &mut [Hypothesis]) {
    let total: i32 = hypotheses
        .iter()
        .filter(|h| h.active)
        .map(|h| h.probability)
        .sum();

    if total > 0 && total != 100 {
        let factor = 100.0 / f64::from(total);
        for h in hypotheses.iter_mut().filter(|h| h.active) {
            h.probability = (f64::from(h.probability) * factor).round() as i32;
        }
    }
}

/// Maintains the running candidate-cause display per case.
///
/// This is a confidence display, not the diagnosis authority: finalize
/// re-derives the authoritative result and reconciles this set afterward.
pub struct HypothesisTracker {
    entries: Mutex<HashMap<CaseId, Vec<Hypothesis>>>,
}

impl HypothesisTracker {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces any existing set for the case with the rule's starter set.
    pub fn seed(&self, case_id: CaseId, rule_id: &str) {
        let seeded: Vec<Hypothesis> = starter_set(rule_id)
            .into_iter()
            .map(|(label, probability)| Hypothesis::new(case_id, label, probability))
            .collect();

        tracing::debug!(case_id = %case_id, rule = rule_id, count = seeded.len(), "Seeded hypotheses");

        let mut entries = self.entries.lock().expect("hypothesis tracker poisoned");
        entries.insert(case_id, seeded);
    }

    /// Re-scores every hypothesis from the current answers: apply the
    /// adjustment, clamp to [0, 100], deactivate anything at or below the
    /// floor, then normalize the active set.
    pub fn rescore(&self, case_id: CaseId, answers: &AnswerMap) {
        let mut entries = self.entries.lock().expect("hypothesis tracker poisoned");
        let Some(hypotheses) = entries.get_mut(&case_id) else {
            return;
        };

        for h in hypotheses.iter_mut() {
            let adjusted = (h.probability + adjustment(&h.label, answers)).clamp(0, 100);
            h.probability = adjusted;
            h.active = adjusted > ACTIVE_FLOOR;
        }

        normalize(hypotheses);
    }

    /// Current hypothesis set, most probable first.
    pub fn snapshot(&self, case_id: CaseId) -> Vec<Hypothesis> {
        let entries = self.entries.lock().expect("hypothesis tracker poisoned");
        let mut hypotheses = entries.get(&case_id).cloned().unwrap_or_default();
        hypotheses.sort_by(|a, b| b.probability.cmp(&a.probability));
        hypotheses
    }

    /// Back-fills the set against the authoritative diagnosis: the
    /// hypothesis matching the affected component (text before any "/",
    /// case-insensitive containment) stays active at the diagnosis
    /// confidence; every other one is deactivated.
    pub fn reconcile(&self, case_id: CaseId, diagnosis: &Diagnosis) {
        let component = diagnosis
            .affected_component
            .to_lowercase()
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut entries = self.entries.lock().expect("hypothesis tracker poisoned");
        let Some(hypotheses) = entries.get_mut(&case_id) else {
            return;
        };

        for h in hypotheses.iter_mut() {
            if !component.is_empty() && h.label.to_lowercase().contains(&component) {
                h.probability = diagnosis.confidence;
                h.active = true;
            } else {
                h.active = false;
            }
        }
    }
}

impl Default for HypothesisTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_common::types::SolutionKind;

    #[test]
    fn test_seed_replaces_previous_set() {
        let tracker = HypothesisTracker::new();
        let case_id = CaseId::new();

        tracker.seed(case_id, "heladera_no_enfria");
        assert_eq!(tracker.snapshot(case_id).len(), 5);

        tracker.seed(case_id, "microondas_hace_chispas");
        let set = tracker.snapshot(case_id);
        assert_eq!(set.len(), 4);
        assert_eq!(set[0].label, "Objeto metálico dentro");
    }

    #[test]
    fn test_unknown_rule_family_seeds_empty() {
        let tracker = HypothesisTracker::new();
        let case_id = CaseId::new();
        tracker.seed(case_id, "some_future_rule");
        assert!(tracker.snapshot(case_id).is_empty());
    }

    #[test]
    fn test_dead_light_boosts_electrical_hypothesis() {
        let tracker = HypothesisTracker::new();
        let case_id = CaseId::new();
        tracker.seed(case_id, "heladera_no_enfria");

        let mut answers = AnswerMap::new();
        answers.insert("h_ne_p1".to_string(), AnswerValue::Bool(false));
        tracker.rescore(case_id, &answers);

        let set = tracker.snapshot(case_id);
        assert_eq!(set[0].label, "Problema eléctrico");
        assert!(set[0].active);
        assert!(set[0].probability > 30);
    }

    #[test]
    fn test_working_light_weakens_electrical_hypothesis() {
        let tracker = HypothesisTracker::new();
        let case_id = CaseId::new();
        tracker.seed(case_id, "heladera_no_enfria");

        let mut answers = AnswerMap::new();
        answers.insert("h_ne_p1".to_string(), AnswerValue::Bool(true));
        tracker.rescore(case_id, &answers);

        let electrical = tracker
            .snapshot(case_id)
            .into_iter()
            .find(|h| h.label == "Problema eléctrico")
            .unwrap();
        // 30 - 20 = 10, at the floor: deactivated.
        assert!(!electrical.active);
    }

    #[test]
    fn test_normalize_active_sum_near_100() {
        let case_id = CaseId::new();
        let mut hypotheses = vec![
            Hypothesis::new(case_id, "a", 40),
            Hypothesis::new(case_id, "b", 20),
            Hypothesis::new(case_id, "c", 15),
        ];
        normalize(&mut hypotheses);

        let sum: i32 = hypotheses
            .iter()
            .filter(|h| h.active)
            .map(|h| h.probability)
            .sum();
        assert!((sum - 100).abs() <= hypotheses.len() as i32);
    }

    #[test]
    fn test_normalize_skips_inactive() {
        let case_id = CaseId::new();
        let mut hypotheses = vec![
            Hypothesis::new(case_id, "a", 40),
            Hypothesis::new(case_id, "b", 5),
        ];
        hypotheses[1].active = false;
        normalize(&mut hypotheses);

        assert_eq!(hypotheses[1].probability, 5);
        assert_eq!(hypotheses[0].probability, 100);
    }

    #[test]
    fn test_reconcile_keeps_matching_hypothesis() {
        let tracker = HypothesisTracker::new();
        let case_id = CaseId::new();
        tracker.seed(case_id, "heladera_no_enfria");

        let mut diagnosis = Diagnosis::new(case_id);
        diagnosis.affected_component = "Compresor / Relé de arranque".to_string();
        diagnosis.confidence = 75;
        diagnosis.solution = SolutionKind::ComplexTechnician;
        tracker.reconcile(case_id, &diagnosis);

        let set = tracker.snapshot(case_id);
        let active: Vec<_> = set.iter().filter(|h| h.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].label, "Falla del compresor");
        assert_eq!(active[0].probability, 75);
    }
}
