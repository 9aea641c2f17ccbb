use triage_common::types::{Answer, Case};

/// Serializes a case, its appliance attributes, its reported symptom, and
/// every persisted answer into the line-oriented fact notation the reasoner
/// asserts before running.
pub fn case_facts(case: &Case, answers: &[Answer]) -> Vec<String> {
    let mut facts = Vec::with_capacity(3 + answers.len());
    facts.push(case_fact(case));
    facts.push(appliance_fact(case));
    facts.push(symptom_fact(case));
    facts.extend(answers.iter().map(answer_fact));
    facts
}

fn case_fact(case: &Case) -> String {
    format!(
        "(caso (id \"{}\") (fecha \"{}\") (cliente \"{}\") (telefono \"{}\") (direccion \"\") (estado {}))",
        case.id,
        case.created_at.format("%Y-%m-%d"),
        escape(&case.customer_name),
        escape(&case.customer_phone),
        case.status.as_fact_str(),
    )
}

fn appliance_fact(case: &Case) -> String {
    format!(
        "(electrodomestico (tipo {}) (marca \"{}\") (modelo \"{}\") (antiguedad {}) (en-garantia no))",
        case.appliance.as_fact_str(),
        escape(&case.brand),
        escape(&case.model),
        case.age_years.unwrap_or(0),
    )
}

fn symptom_fact(case: &Case) -> String {
    format!(
        "(sintoma (caso-id \"{}\") (descripcion \"{}\") (gravedad {}))",
        case.id,
        escape(&case.symptom),
        severity(&case.symptom),
    )
}

fn answer_fact(answer: &Answer) -> String {
    format!(
        "(respuesta (caso-id \"{}\") (pregunta \"{}\") (valor {}))",
        answer.case_id,
        answer.question_id,
        answer_value(&answer.raw_value),
    )
}

/// Severity the rule templates key on, derived from the symptom text.
fn severity(symptom: &str) -> &'static str {
    let lowered = symptom.to_lowercase();
    if lowered.contains("chispas") || lowered.contains("incendio") {
        "critica"
    } else if lowered.contains("no enfría") || lowered.contains("no funciona") {
        "alta"
    } else {
        "media"
    }
}

/// Normalizes an answer to the si/no symbol vocabulary; anything outside it
/// is emitted as a quoted string so multi-word choices stay one slot value.
fn answer_value(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "sí" | "si" | "yes" | "true" | "1" => "si".to_string(),
        "no" | "not" | "false" | "0" => "no".to_string(),
        _ => format!("\"{}\"", escape(&lowered)),
    }
}

fn escape(s: &str) -> String {
    s.replace('"', "\\\"").replace('\n', " ").replace('\r', "")
}
