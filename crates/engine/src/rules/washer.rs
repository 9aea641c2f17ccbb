use regex::Regex;

use triage_common::types::{
    AnswerMap, AnswerValue, ApplianceKind, Case, Diagnosis, Question, SolutionKind, Urgency,
};

use super::{is_false, is_true, DiagnosticRule, QuestionGraph, Step};

const RULE_ID: &str = "lavarropas_no_carga_agua";

/// Washing machine does not fill with water. Usually a supply-side problem
/// the customer can fix in minutes, so the tree checks the cheap causes
/// first.
pub struct WasherNoWaterRule {
    pattern: Regex,
    graph: QuestionGraph,
}

impl WasherNoWaterRule {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"(?i)no\s+(carga|entra|llena|toma)\s+agua|sin\s+agua|no\s+hay\s+agua",
        )
        .expect("symptom pattern");

        let graph = QuestionGraph::new("l_nca_p1")
            .node(
                "l_nca_p1",
                Question::yes_no(
                    10,
                    "¿La canilla de paso de agua al lavarropas está completamente abierta?",
                )
                .critical()
                .with_help("Verificar la canilla ubicada detrás o debajo del lavarropas"),
                |answer, _| match answer {
                    // Closed tap: immediate DIY fix, nothing else to ask.
                    Some(AnswerValue::Bool(false)) => Step::Done,
                    _ => Step::Ask("l_nca_p2"),
                },
            )
            .node(
                "l_nca_p2",
                Question::yes_no(11, "¿Hay presión de agua normal en otras canillas de la casa?")
                    .critical()
                    .with_help("Abrir otra canilla para verificar que haya presión normal"),
                |answer, _| match answer {
                    // No pressure anywhere: supply problem, not the machine.
                    Some(AnswerValue::Bool(false)) => Step::Done,
                    _ => Step::Ask("l_nca_p3"),
                },
            )
            .node(
                "l_nca_p3",
                Question::yes_no(12, "¿La manguera de entrada de agua está doblada o aplastada?")
                    .with_help("Revisar toda la manguera desde la canilla hasta el lavarropas"),
                |_, _| Step::Done,
            );

        Self { pattern, graph }
    }
}

impl Default for WasherNoWaterRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for WasherNoWaterRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn appliance(&self) -> ApplianceKind {
        ApplianceKind::Washer
    }

    fn matches(&self, symptom: &str) -> bool {
        self.pattern.is_match(symptom)
    }

    fn priority(&self) -> i32 {
        95
    }

    fn questions(&self) -> Vec<Question> {
        self.graph.questions()
    }

    fn first_question(&self) -> Question {
        self.graph.first()
    }

    fn next_question(
        &self,
        current_code: &str,
        answer: Option<&AnswerValue>,
        all_answers: &AnswerMap,
    ) -> Option<Question> {
        self.graph.next(current_code, answer, all_answers)
    }

    fn evaluate(&self, answers: &AnswerMap, case: &Case) -> Diagnosis {
        // Branch 1: the tap is closed.
        if is_false(answers, "l_nca_p1") {
            return Diagnosis {
                probable_cause: "Canilla de paso cerrada o semi-cerrada".to_string(),
                confidence: 95,
                affected_component: "Canilla de paso".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::Low,
                cost_min: 0.0,
                cost_max: 0.0,
                time_estimate_minutes: 2,
                diy_instructions: vec![
                    "1. Abrir completamente la canilla de paso de agua".to_string(),
                    "2. Verificar que gire hasta el tope".to_string(),
                    "3. Iniciar un ciclo de lavado para verificar".to_string(),
                ],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 2: no water pressure anywhere in the house.
        if is_true(answers, "l_nca_p1") && is_false(answers, "l_nca_p2") {
            return Diagnosis {
                probable_cause: "Problema de suministro de agua general".to_string(),
                confidence: 90,
                affected_component: "Suministro de agua de la vivienda".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::Medium,
                cost_min: 0.0,
                cost_max: 0.0,
                time_estimate_minutes: 5,
                diy_instructions: vec![
                    "1. Verificar si hay un corte de agua en la zona".to_string(),
                    "2. Revisar la bomba de agua si tiene".to_string(),
                    "3. Contactar con el administrador del edificio".to_string(),
                    "4. Esperar a que se restablezca el servicio".to_string(),
                ],
                customer_messages: vec![
                    "El problema no es del lavarropas sino del suministro de agua".to_string(),
                ],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 3: kinked or crushed inlet hose.
        if is_true(answers, "l_nca_p3") {
            return Diagnosis {
                probable_cause: "Manguera de entrada obstruida o doblada".to_string(),
                confidence: 85,
                affected_component: "Manguera de entrada".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::Low,
                cost_min: 0.0,
                cost_max: 5000.0,
                time_estimate_minutes: 10,
                diy_instructions: vec![
                    "1. Desconectar el lavarropas de la corriente".to_string(),
                    "2. Cerrar la canilla de paso de agua".to_string(),
                    "3. Mover el lavarropas para acceder a la parte trasera".to_string(),
                    "4. Enderezar la manguera y verificar que no esté aplastada".to_string(),
                    "5. Si la manguera está dañada, considerar reemplazo".to_string(),
                    "6. Abrir la canilla y reconectar el lavarropas".to_string(),
                ],
                probable_parts: vec!["Manguera de entrada (si está dañada)".to_string()],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 4: supply and hose are fine but water still does not come
        // in — inlet filter or solenoid valve, which needs tools and a
        // technician.
        if is_true(answers, "l_nca_p1")
            && is_true(answers, "l_nca_p2")
            && is_false(answers, "l_nca_p3")
        {
            return Diagnosis {
                probable_cause: "Filtro de entrada obstruido o electroválvula defectuosa"
                    .to_string(),
                confidence: 75,
                affected_component: "Filtro de entrada / Electroválvula".to_string(),
                technician_required: true,
                solution: SolutionKind::SimpleTechnician,
                urgency: Urgency::Medium,
                cost_min: 15000.0,
                cost_max: 35000.0,
                time_estimate_minutes: 45,
                probable_parts: vec!["Electroválvula".to_string(), "Filtro".to_string()],
                customer_messages: vec![
                    "Probablemente sea una limpieza de filtro o cambio de electroválvula"
                        .to_string(),
                    "Reparación sencilla".to_string(),
                ],
                work_order: true,
                work_order_priority: Some("media".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        Diagnosis {
            probable_cause:
                "Requiere diagnóstico técnico (posible problema de electroválvula o control)"
                    .to_string(),
            confidence: 60,
            affected_component: "Sistema de carga de agua".to_string(),
            technician_required: true,
            solution: SolutionKind::SimpleTechnician,
            urgency: Urgency::Medium,
            cost_min: 20000.0,
            cost_max: 45000.0,
            time_estimate_minutes: 60,
            work_order: true,
            work_order_priority: Some("media".to_string()),
            ..Diagnosis::new(case.id)
        }
    }

    fn question_code(&self, question_id: i64) -> String {
        match question_id {
            10 => "l_nca_p1".to_string(),
            11 => "l_nca_p2".to_string(),
            12 => "l_nca_p3".to_string(),
            other => format!("l_nca_p{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_common::types::AnswerValue;

    fn answers(pairs: &[(&str, AnswerValue)]) -> AnswerMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_symptom_pattern() {
        let rule = WasherNoWaterRule::new();
        assert!(rule.matches("no carga agua"));
        assert!(rule.matches("el lavarropas no toma agua"));
        assert!(rule.matches("queda sin agua"));
        assert!(!rule.matches("no centrifuga"));
    }

    #[test]
    fn test_closed_tap_ends_traversal() {
        let rule = WasherNoWaterRule::new();
        assert_eq!(rule.first_question().id, 10);

        let all = answers(&[("l_nca_p1", AnswerValue::Bool(false))]);
        assert!(rule
            .next_question("l_nca_p1", all.get("l_nca_p1"), &all)
            .is_none());
    }

    #[test]
    fn test_open_tap_walks_to_hose_check() {
        let rule = WasherNoWaterRule::new();
        let all = answers(&[
            ("l_nca_p1", AnswerValue::Bool(true)),
            ("l_nca_p2", AnswerValue::Bool(true)),
        ]);
        let next = rule
            .next_question("l_nca_p1", all.get("l_nca_p1"), &all)
            .unwrap();
        assert_eq!(next.id, 11);
        let next = rule
            .next_question("l_nca_p2", all.get("l_nca_p2"), &all)
            .unwrap();
        assert_eq!(next.id, 12);
        assert!(rule.next_question("l_nca_p3", None, &all).is_none());
    }

    #[test]
    fn test_evaluate_closed_tap_branch() {
        let rule = WasherNoWaterRule::new();
        let case = Case::new(ApplianceKind::Washer, "no carga agua");
        let all = answers(&[("l_nca_p1", AnswerValue::Bool(false))]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.probable_cause, "Canilla de paso cerrada o semi-cerrada");
        assert_eq!(d.solution, SolutionKind::Diy);
        assert_eq!(d.urgency, Urgency::Low);
        assert_eq!(d.cost_min, 0.0);
        assert_eq!(d.cost_max, 0.0);
        assert!(!d.technician_required);
    }

    #[test]
    fn test_evaluate_valve_branch_dispatches_technician() {
        let rule = WasherNoWaterRule::new();
        let case = Case::new(ApplianceKind::Washer, "no carga agua");
        let all = answers(&[
            ("l_nca_p1", AnswerValue::Bool(true)),
            ("l_nca_p2", AnswerValue::Bool(true)),
            ("l_nca_p3", AnswerValue::Bool(false)),
        ]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.solution, SolutionKind::SimpleTechnician);
        assert!(d.technician_required);
        assert!(d.work_order);
        assert_eq!(d.work_order_priority.as_deref(), Some("media"));
    }

    #[test]
    fn test_evaluate_default_branch() {
        let rule = WasherNoWaterRule::new();
        let case = Case::new(ApplianceKind::Washer, "no carga agua");
        // Open tap answered, nothing else: no branch matches fully.
        let all = answers(&[("l_nca_p1", AnswerValue::Bool(true))]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.confidence, 60);
        assert!(d.work_order);
    }
}
