use regex::Regex;

use triage_common::types::{
    AnswerMap, AnswerValue, ApplianceKind, Case, Diagnosis, Question, SolutionKind, Urgency,
};

use super::{is_false, is_true, DiagnosticRule, QuestionGraph, Step};

const RULE_ID: &str = "microondas_hace_chispas";

/// Microwave arcing/sparking. Highest priority in the registry: this is a
/// safety report and must preempt any generic microwave rule.
pub struct MicrowaveSparksRule {
    pattern: Regex,
    graph: QuestionGraph,
}

impl MicrowaveSparksRule {
    pub fn new() -> Self {
        let pattern = Regex::new(
            r"(?i)chispa|chispazo|centella|arco\s+eléctrico|destello|luz.*interior",
        )
        .expect("symptom pattern");

        let graph = QuestionGraph::new("m_hc_p1")
            .node(
                "m_hc_p1",
                Question::yes_no(
                    20,
                    "⚠️ IMPORTANTE: ¿Había algún objeto metálico dentro del microondas? \
                     (cubiertos, papel aluminio, recipientes con bordes dorados)",
                )
                .critical()
                .with_help(
                    "El metal causa chispas peligrosas en el microondas. Verificar también \
                     decoraciones doradas en platos.",
                ),
                |answer, _| match answer {
                    // Metal inside explains the arcing on its own.
                    Some(AnswerValue::Bool(true)) => Step::Done,
                    _ => Step::Ask("m_hc_p2"),
                },
            )
            .node(
                "m_hc_p2",
                Question::yes_no(
                    21,
                    "¿El plato giratorio está correctamente colocado sobre el eje?",
                )
                .with_help("Un plato mal colocado puede causar fricción y chispas"),
                |_, _| Step::Done,
            );

        Self { pattern, graph }
    }
}

impl Default for MicrowaveSparksRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticRule for MicrowaveSparksRule {
    fn id(&self) -> &'static str {
        RULE_ID
    }

    fn appliance(&self) -> ApplianceKind {
        ApplianceKind::Microwave
    }

    fn matches(&self, symptom: &str) -> bool {
        self.pattern.is_match(symptom)
    }

    fn priority(&self) -> i32 {
        200
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
        // Branch 1: metal was inside. DIY recovery, but critical urgency —
        // the safety alerts must reach the customer regardless of the
        // technician flag.
        if is_true(answers, "m_hc_p1") {
            return Diagnosis {
                probable_cause: "Objeto metálico dentro del microondas".to_string(),
                confidence: 95,
                affected_component: "Ninguno (uso incorrecto)".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::Critical,
                cost_min: 0.0,
                cost_max: 0.0,
                time_estimate_minutes: 5,
                diy_instructions: vec![
                    "1. NO volver a usar metal en el microondas".to_string(),
                    "2. Verificar que no haya daños en las paredes interiores".to_string(),
                    "3. Si hay manchas negras o perforaciones → NO USAR y llamar técnico"
                        .to_string(),
                    "4. Si está intacto, probar con un vaso de agua por 30 segundos".to_string(),
                    "5. Si funciona normal, el problema está resuelto".to_string(),
                ],
                safety_alerts: vec![
                    "⚠️ NUNCA usar objetos metálicos en el microondas".to_string(),
                    "⚠️ Incluye papel aluminio, cubiertos, recipientes con decoración metálica"
                        .to_string(),
                    "⚠️ Si detecta olor a quemado o daños, NO USAR el microondas".to_string(),
                ],
                customer_messages: vec![
                    "El metal causa arcos eléctricos peligrosos".to_string(),
                    "Siempre usar recipientes aptos para microondas".to_string(),
                ],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 2: no metal, turntable off its axis.
        if is_false(answers, "m_hc_p1") && is_false(answers, "m_hc_p2") {
            return Diagnosis {
                probable_cause: "Plato giratorio mal colocado causa fricción".to_string(),
                confidence: 80,
                affected_component: "Plato giratorio / Eje".to_string(),
                technician_required: false,
                solution: SolutionKind::Diy,
                urgency: Urgency::Medium,
                cost_min: 0.0,
                cost_max: 8000.0,
                time_estimate_minutes: 5,
                diy_instructions: vec![
                    "1. Retirar el plato giratorio".to_string(),
                    "2. Verificar que el eje central gire libremente".to_string(),
                    "3. Limpiar el eje y la base del plato".to_string(),
                    "4. Colocar el plato correctamente centrado".to_string(),
                    "5. Debe girar suavemente sin trabarse".to_string(),
                    "6. Probar con un vaso de agua".to_string(),
                ],
                probable_parts: vec!["Plato giratorio (si está roto)".to_string()],
                work_order: false,
                ..Diagnosis::new(case.id)
            };
        }

        // Branch 3: no metal and the turntable is fine — internal arcing.
        if is_false(answers, "m_hc_p1") && is_true(answers, "m_hc_p2") {
            return Diagnosis {
                probable_cause: "Mica protectora perforada o magnetrón defectuoso".to_string(),
                confidence: 85,
                affected_component: "Mica protectora / Magnetrón".to_string(),
                technician_required: true,
                solution: SolutionKind::ComplexTechnician,
                urgency: Urgency::Critical,
                cost_min: 25000.0,
                cost_max: 80000.0,
                time_estimate_minutes: 90,
                probable_parts: vec!["Mica protectora".to_string(), "Magnetrón".to_string()],
                safety_alerts: vec![
                    "🚨 NO USAR EL MICROONDAS hasta que sea revisado por un técnico".to_string(),
                    "🚨 Las chispas internas pueden causar incendio".to_string(),
                    "🚨 Desenchufar el microondas inmediatamente".to_string(),
                    "🚨 El magnetrón defectuoso puede emitir radiación peligrosa".to_string(),
                ],
                customer_messages: vec![
                    "⚠️ POR SEGURIDAD: No usar el microondas".to_string(),
                    "La mica protectora evita que las ondas dañen el magnetrón".to_string(),
                    "Si está perforada, se requiere reemplazo urgente".to_string(),
                    "Técnico especializado visitará en 24hs".to_string(),
                ],
                work_order: true,
                work_order_priority: Some("critica".to_string()),
                ..Diagnosis::new(case.id)
            };
        }

        // Sparks with no usable answers are always treated as critical.
        Diagnosis {
            probable_cause: "Requiere revisión técnica urgente por seguridad".to_string(),
            confidence: 70,
            affected_component: "Sistema de microondas".to_string(),
            technician_required: true,
            solution: SolutionKind::ComplexTechnician,
            urgency: Urgency::Critical,
            cost_min: 20000.0,
            cost_max: 70000.0,
            time_estimate_minutes: 90,
            safety_alerts: vec![
                "🚨 NO USAR el microondas hasta revisión técnica".to_string(),
                "🚨 Desenchufar inmediatamente".to_string(),
            ],
            customer_messages: vec![
                "Por seguridad, se requiere revisión técnica urgente".to_string()
            ],
            work_order: true,
            work_order_priority: Some("critica".to_string()),
            ..Diagnosis::new(case.id)
        }
    }

    fn question_code(&self, question_id: i64) -> String {
        match question_id {
            20 => "m_hc_p1".to_string(),
            21 => "m_hc_p2".to_string(),
            other => format!("m_hc_p{}", other),
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
        let rule = MicrowaveSparksRule::new();
        assert!(rule.matches("hace chispas"));
        assert!(rule.matches("vi un chispazo adentro"));
        assert!(rule.matches("sale un destello"));
        assert!(!rule.matches("no calienta la comida"));
    }

    #[test]
    fn test_metal_ends_traversal() {
        let rule = MicrowaveSparksRule::new();
        assert_eq!(rule.first_question().id, 20);

        let all = answers(&[("m_hc_p1", AnswerValue::Bool(true))]);
        assert!(rule
            .next_question("m_hc_p1", all.get("m_hc_p1"), &all)
            .is_none());

        let all = answers(&[("m_hc_p1", AnswerValue::Bool(false))]);
        let next = rule
            .next_question("m_hc_p1", all.get("m_hc_p1"), &all)
            .unwrap();
        assert_eq!(next.id, 21);
    }

    #[test]
    fn test_evaluate_metal_branch_keeps_safety_alerts() {
        let rule = MicrowaveSparksRule::new();
        let case = Case::new(ApplianceKind::Microwave, "hace chispas");
        let all = answers(&[("m_hc_p1", AnswerValue::Bool(true))]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.urgency, Urgency::Critical);
        // Critical urgency without a technician: the alerts carry the
        // warning, so they must be present.
        assert!(!d.technician_required);
        assert!(!d.safety_alerts.is_empty());
        assert_eq!(d.solution, SolutionKind::Diy);
    }

    #[test]
    fn test_evaluate_internal_arcing_branch() {
        let rule = MicrowaveSparksRule::new();
        let case = Case::new(ApplianceKind::Microwave, "hace chispas");
        let all = answers(&[
            ("m_hc_p1", AnswerValue::Bool(false)),
            ("m_hc_p2", AnswerValue::Bool(true)),
        ]);

        let d = rule.evaluate(&all, &case);
        assert!(d.technician_required);
        assert_eq!(d.urgency, Urgency::Critical);
        assert_eq!(d.work_order_priority.as_deref(), Some("critica"));
        assert!(d.probable_parts.contains(&"Magnetrón".to_string()));
    }

    #[test]
    fn test_evaluate_turntable_branch() {
        let rule = MicrowaveSparksRule::new();
        let case = Case::new(ApplianceKind::Microwave, "hace chispas");
        let all = answers(&[
            ("m_hc_p1", AnswerValue::Bool(false)),
            ("m_hc_p2", AnswerValue::Bool(false)),
        ]);

        let d = rule.evaluate(&all, &case);
        assert_eq!(d.solution, SolutionKind::Diy);
        assert_eq!(d.urgency, Urgency::Medium);
        assert!(!d.work_order);
    }
}
