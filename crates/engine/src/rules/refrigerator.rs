use regex::Regex;

use triage_common::types::{
    AnswerMap, AnswerValue, ApplianceKind, Case, Diagnosis, Question, SolutionKind, Urgency,
};

use super::{is_choice, is_false, is_true, DiagnosticRule, QuestionGraph, Step};

const RULE_ID: &str = "heladera_no_enfria";

const RUNS_CONSTANTLY: &str = "Constantemente sin parar";
const RUNS_IN_CYCLES: &str = "Hace ciclos (prende/apaga)";

/// Refrigerator not cooling. The most common report for the appliance, and
/// urgent: food spoils while the case sits.
pub struct RefrigeratorNoCoolingRule {
    pattern: Regex,
    graph: QuestionGraph,
}

impl RefrigeratorNoCoolingRule {
    pub fn new() -> Self {
        let pattern =
            Regex::new(r"(?i)no\s+(enfr[ií]a|fr[ií]o|congela|funciona)|temperatura|caliente|tibio")
                .expect("symptom pattern");

        let graph = QuestionGraph::new("h_ne_p1")
            .node(
                "h_ne_p1",
                Question::yes_no(
                    1,
                    "¿La luz interior de la heladera funciona cuando abre la puerta?",
                )
                .critical()
                .with_help("Esta pregunta verifica si hay alimentación eléctrica correcta"),
                |answer, _| match answer {
                    // No light means no power: nothing else is worth asking.
                    Some(AnswerValue::Bool(false)) => Step::Done,
                    _ => Step::Ask("h_ne_p2"),
                },
            )
            .node(
                "h_ne_p2",
                Question::yes_no(
                    2,
                    "¿Escucha algún sonido del motor/compresor en la parte trasera?",
                )
                .critical()
                .with_help("El motor debe hacer un sonido de zumbido periódicamente"),
                |answer, _| match answer {
                    Some(AnswerValue::Bool(false)) => Step::Ask("h_ne_p3"),
                    _ => Step::Ask("h_ne_p4"),
                },
            )
            .node(
                "h_ne_p3",
                Question::yes_no(3, "Con cuidado, ¿el motor está caliente al tacto?").with_help(
                    "⚠️ ADVERTENCIA: El motor puede estar muy caliente, tocar con precaución",
                ),
                |_, _| Step::Done,
            )
            .node(
                "h_ne_p4",
                Question::multiple_choice(
                    4,
                    "¿El motor funciona constantemente o hace ciclos (prende y apaga)?",
                    vec![
                        RUNS_CONSTANTLY.to_string(),
                        RUNS_IN_CYCLES.to_string(),
                        "No sé".to_string(),
                    ],
                )
                .with_help("Un funcionamiento normal implica ciclos de encendido y apagado"),
                |_, _| Step::Ask("h_ne_p5"),
            )
            .node(
                "h_ne_p5",
                Question::yes_no(
                    5,
                    "¿Hay acumulación excesiva de hielo en el freezer o en las paredes?",
                )
                .with_help("Una capa gruesa de hielo puede indicar problemas de desescarche"),
                |_, _| Step::Done,
            );

        Self { pattern, graph }
    }

    /// No branch matched, or the traversal was cut short: an on-site visit
    /// decides, and an old unit gets a replacement evaluation instead.
    fn default_diagnosis(&self, case: &Case) -> Diagnosis {
        if case.age_years.is_some_and(|age| age > 10) {
            return Diagnosis {
                probable_cause: "Requiere diagnóstico técnico presencial (evaluar reemplazo)"
                    .to_string(),
                confidence: 50,
                affected_component: "Por determinar".to_string(),
                technician_required: true,
                solution: SolutionKind::Replacement,
                urgency: Urgency::Medium,
                cost_min: 30000.0,
                cost_max: 80000.0,
                time_estimate_minutes: 120,
                customer_messages: vec![
                    "Dado que el electrodoméstico tiene más de 10 años,".to_string(),
                    "el técnico evaluará si es conveniente reparar o reemplazar".to_string(),
                ],
                work_order: true,
                work_order_priority: Some("media".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        Diagnosis {
            probable_cause: "Requiere diagnóstico técnico presencial".to_string(),
            confidence: 50,
            affected_component: "Por determinar".to_string(),
            technician_required: true,
            solution: SolutionKind::ComplexTechnician,
            urgency: Urgency::Medium,
            cost_min: 30000.0,
            cost_max: 80000.0,
            time_estimate_minutes: 120,
            work_order: true,
            work_order_priority: Some("media".to_string()),
            ..Diagnosis::new(case.id)
        }
    }
}

impl Default for RefrigeratorNoCoolingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for RefrigeratorNoCoolingRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn appliance(&self) -> ApplianceKind {
        ApplianceKind::Refrigerator
    }

    fn matches(&self, symptom: &str) -> bool {
        self.pattern.is_match(symptom)
    }

    fn priority(&self) -> i32 {
        100
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
        // Branch 1: no interior light — no power reaches the unit.
        if is_false(answers, "h_ne_p1") {
            return Diagnosis {
                probable_cause: "Sin alimentación eléctrica".to_string(),
                confidence: 85,
                affected_component: "Circuito eléctrico / Enchufe".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::High,
                cost_min: 0.0,
                cost_max: 5000.0,
                time_estimate_minutes: 10,
                diy_instructions: vec![
                    "1. Verificar que el enchufe esté correctamente conectado".to_string(),
                    "2. Probar con otro electrodoméstico en el mismo tomacorriente".to_string(),
                    "3. Revisar los fusibles del tablero eléctrico".to_string(),
                    "4. Si nada funciona, llamar a un electricista".to_string(),
                ],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 2: powered but the compressor is silent.
        if is_true(answers, "h_ne_p1") && is_false(answers, "h_ne_p2") {
            if is_true(answers, "h_ne_p3") {
                // Hot motor that never starts: compressor or start relay.
                return Diagnosis {
                    probable_cause: "Compresor defectuoso o relé de arranque dañado".to_string(),
                    confidence: 75,
                    affected_component: "Compresor / Relé de arranque".to_string(),
                    technician_required: true,
                    solution: SolutionKind::ComplexTechnician,
                    urgency: Urgency::High,
                    cost_min: 80000.0,
                    cost_max: 150000.0,
                    time_estimate_minutes: 180,
                    probable_parts: vec![
                        "Compresor".to_string(),
                        "Relé de arranque".to_string(),
                        "Capacitor".to_string(),
                    ],
                    customer_messages: vec![
                        "Trasladar alimentos perecederos a otro lugar".to_string(),
                        "Mantener la puerta cerrada mientras tanto".to_string(),
                        "Se programará visita técnica en 24hs".to_string(),
                    ],
                    safety_alerts: vec![
                        "Desconectar la heladera si el motor está muy caliente".to_string()
                    ],
                    work_order: true,
                    work_order_priority: Some("urgente".to_string()),
                    ..Diagnosis::new(case.id)
                };
            }

            return Diagnosis {
                probable_cause: "Problema eléctrico del compresor o termostato".to_string(),
                confidence: 70,
                affected_component: "Sistema eléctrico del compresor".to_string(),
                technician_required: true,
                solution: SolutionKind::SimpleTechnician,
                urgency: Urgency::High,
                cost_min: 25000.0,
                cost_max: 50000.0,
                time_estimate_minutes: 90,
                probable_parts: vec!["Relé de arranque".to_string(), "Termostato".to_string()],
                work_order: true,
                work_order_priority: Some("alta".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 3: compressor never stops.
        if is_true(answers, "h_ne_p2") && is_choice(answers, "h_ne_p4", RUNS_CONSTANTLY) {
            if is_false(answers, "h_ne_p5") {
                return Diagnosis {
                    probable_cause: "Termostato defectuoso (no corta el ciclo)".to_string(),
                    confidence: 80,
                    affected_component: "Termostato".to_string(),
                    technician_required: true,
                    solution: SolutionKind::SimpleTechnician,
                    urgency: Urgency::Medium,
                    cost_min: 20000.0,
                    cost_max: 35000.0,
                    time_estimate_minutes: 45,
                    probable_parts: vec!["Termostato".to_string()],
                    work_order: true,
                    work_order_priority: Some("media".to_string()),
                    ..Diagnosis::new(case.id)
                };
            }

            return Diagnosis {
                probable_cause: "Sistema de desescarche automático defectuoso".to_string(),
                confidence: 75,
                affected_component: "Resistencia de desescarche / Timer".to_string(),
                technician_required: true,
                solution: SolutionKind::SimpleTechnician,
                urgency: Urgency::Medium,
                cost_min: 25000.0,
                cost_max: 45000.0,
                time_estimate_minutes: 60,
                probable_parts: vec![
                    "Resistencia de desescarche".to_string(),
                    "Timer".to_string(),
                    "Termostato de desescarche".to_string(),
                ],
                diy_instructions: vec![
                    "Mientras espera al técnico, puede descongelar manualmente".to_string()
                ],
                work_order: true,
                work_order_priority: Some("media".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 4: normal on/off cycling but still warm.
        if is_true(answers, "h_ne_p2") && is_choice(answers, "h_ne_p4", RUNS_IN_CYCLES) {
            if is_true(answers, "h_ne_p5") {
                return Diagnosis {
                    probable_cause: "Obstrucción del flujo de aire por exceso de hielo".to_string(),
                    confidence: 70,
                    affected_component: "Sistema de ventilación / Circulación".to_string(),
                    technician_required: false,
                    solution: SolutionKind::Diy,
                    urgency: Urgency::Medium,
                    cost_min: 0.0,
                    cost_max: 15000.0,
                    time_estimate_minutes: 30,
                    diy_instructions: vec![
                        "1. Desconectar la heladera completamente".to_string(),
                        "2. Vaciar y limpiar el interior".to_string(),
                        "3. Dejar descongelar por 6-8 horas con puertas abiertas".to_string(),
                        "4. Secar completamente antes de reconectar".to_string(),
                        "5. Si el problema persiste, llamar técnico".to_string(),
                    ],
                    work_order: false,
                    ..Diagnosis::new(case.id)
                };
            }

            return Diagnosis {
                probable_cause: "Posible fuga de gas refrigerante".to_string(),
                confidence: 65,
                affected_component: "Sistema de refrigeración sellado".to_string(),
                technician_required: true,
                solution: SolutionKind::ComplexTechnician,
                urgency: Urgency::High,
                cost_min: 50000.0,
                cost_max: 120000.0,
                time_estimate_minutes: 150,
                customer_messages: vec![
                    "Requiere técnico especializado en refrigeración".to_string(),
                    "Se necesita equipo especializado para detectar fugas".to_string(),
                ],
                work_order: true,
                work_order_priority: Some("alta".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        self.default_diagnosis(case)
    }

    fn question_code(&self, question_id: i64) -> String {
        match question_id {
            1 => "h_ne_p1".to_string(),
            2 => "h_ne_p2".to_string(),
            3 => "h_ne_p3".to_string(),
            4 => "h_ne_p4".to_string(),
            5 => "h_ne_p5".to_string(),
            other => format!("h_ne_p{}", other),
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
        let rule = RefrigeratorNoCoolingRule::new();
        assert!(rule.matches("la heladera no enfría"));
        assert!(rule.matches("No Enfria para nada"));
        assert!(rule.matches("no mantiene la temperatura"));
        assert!(rule.matches("está tibio adentro"));
        assert!(!rule.matches("hace un ruido fuerte"));
    }

    #[test]
    fn test_no_light_ends_traversal() {
        let rule = RefrigeratorNoCoolingRule::new();
        assert_eq!(rule.first_question().id, 1);

        let all = answers(&[("h_ne_p1", AnswerValue::Bool(false))]);
        let next = rule.next_question("h_ne_p1", all.get("h_ne_p1"), &all);
        assert!(next.is_none());
    }

    #[test]
    fn test_silent_compressor_asks_motor_temperature() {
        let rule = RefrigeratorNoCoolingRule::new();
        let all = answers(&[
            ("h_ne_p1", AnswerValue::Bool(true)),
            ("h_ne_p2", AnswerValue::Bool(false)),
        ]);
        let next = rule
            .next_question("h_ne_p2", all.get("h_ne_p2"), &all)
            .unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_running_compressor_asks_cycles_then_ice() {
        let rule = RefrigeratorNoCoolingRule::new();
        let all = answers(&[
            ("h_ne_p1", AnswerValue::Bool(true)),
            ("h_ne_p2", AnswerValue::Bool(true)),
        ]);
        let next = rule
            .next_question("h_ne_p2", all.get("h_ne_p2"), &all)
            .unwrap();
        assert_eq!(next.id, 4);

        let next = rule.next_question("h_ne_p4", None, &all).unwrap();
        assert_eq!(next.id, 5);
        let done = rule.next_question("h_ne_p5", None, &all);
        assert!(done.is_none());
    }

    #[test]
    fn test_evaluate_no_power_branch() {
        let rule = RefrigeratorNoCoolingRule::new();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        let all = answers(&[("h_ne_p1", AnswerValue::Bool(false))]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.probable_cause, "Sin alimentación eléctrica");
        assert_eq!(d.solution, SolutionKind::Diy);
        assert_eq!(d.urgency, Urgency::High);
        assert!(!d.technician_required);
        assert!(!d.work_order);
        assert!(!d.diy_instructions.is_empty());
    }

    #[test]
    fn test_evaluate_hot_silent_compressor_branch() {
        let rule = RefrigeratorNoCoolingRule::new();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        let all = answers(&[
            ("h_ne_p1", AnswerValue::Bool(true)),
            ("h_ne_p2", AnswerValue::Bool(false)),
            ("h_ne_p3", AnswerValue::Bool(true)),
        ]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.solution, SolutionKind::ComplexTechnician);
        assert!(d.technician_required);
        assert_eq!(d.work_order_priority.as_deref(), Some("urgente"));
        assert!(d.probable_parts.contains(&"Compresor".to_string()));
    }

    #[test]
    fn test_evaluate_defrost_branch() {
        let rule = RefrigeratorNoCoolingRule::new();
        let case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        let all = answers(&[
            ("h_ne_p1", AnswerValue::Bool(true)),
            ("h_ne_p2", AnswerValue::Bool(true)),
            ("h_ne_p4", AnswerValue::Text(RUNS_CONSTANTLY.to_string())),
            ("h_ne_p5", AnswerValue::Bool(true)),
        ]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(
            d.probable_cause,
            "Sistema de desescarche automático defectuoso"
        );
        assert_eq!(d.solution, SolutionKind::SimpleTechnician);
    }

    #[test]
    fn test_old_unit_defaults_to_replacement_evaluation() {
        let rule = RefrigeratorNoCoolingRule::new();
        let mut case = Case::new(ApplianceKind::Refrigerator, "no enfría");
        case.age_years = Some(12);
        // Answers that match no branch.
        let all = answers(&[("h_ne_p1", AnswerValue::Bool(true))]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.solution, SolutionKind::Replacement);
        assert_eq!(d.confidence, 50);
    }
}
