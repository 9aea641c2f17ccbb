//! Adapter around the external rule-based reasoner.
//!
//! The engine talks to the reasoner through a plain-text fact protocol: the
//! case and its answers are serialized into facts, a generated script loads
//! the shared template file, asserts the facts, runs the rule base, and
//! dumps the resulting fact base, which is parsed back into a diagnosis.
//! Schema compatibility is implicit in the shared template — there is no
//! versioning field.

mod facts;
mod parse;
mod runner;

pub use parse::{FactBase, SlotValue};

use std::fmt::Write as _;

use triage_common::config::ReasonerConfig;
use triage_common::ids::CaseId;
use triage_common::types::{Answer, Case, Diagnosis, SolutionKind, Urgency};
use triage_common::{Result, TriageError};

use runner::ReasonerRunner;

pub struct ReasonerAdapter {
    config: ReasonerConfig,
    runner: ReasonerRunner,
}

impl ReasonerAdapter {
    pub fn new(config: ReasonerConfig) -> Self {
        let runner = ReasonerRunner::new(config.clone());
        Self { config, runner }
    }

    /// One full inference attempt. Every failure comes back as a reasoner
    /// error, which the caller recovers from via the deterministic fallback.
    pub async fn diagnose(&self, case: &Case, answers: &[Answer]) -> Result<Diagnosis> {
        if !self.config.enabled {
            return Err(TriageError::ReasonerUnavailable(
                "disabled by configuration".to_string(),
            ));
        }
        if !self.runner.probe().await {
            return Err(TriageError::ReasonerUnavailable(format!(
                "'{}' did not answer the version probe",
                self.config.command
            )));
        }

        let facts = facts::case_facts(case, answers);
        let script = build_script(&self.config.template_path, &facts);

        tracing::debug!(case_id = %case.id, facts = facts.len(), "Running external reasoner");
        let output = self.runner.run_script(&script).await?;

        let base = FactBase::parse(&output);
        diagnosis_from_facts(case.id, &base)
    }
}

/// Generates the script one run executes: load the template, assert the
/// case facts, run, dump the fact base, exit.
fn build_script(template_path: &str, facts: &[String]) -> String {
    let mut script = String::new();
    let _ = writeln!(script, "(load \"{}\")", template_path);
    for fact in facts {
        let _ = writeln!(script, "(assert {})", fact);
    }
    let _ = writeln!(script, "(run)");
    let _ = writeln!(script, "(printout t \"DIAGNOSTICOS:\" crlf)");
    let _ = writeln!(script, "(facts)");
    let _ = writeln!(script, "(exit)");
    script
}

/// Reconstructs a diagnosis from the well-known output facts. Scalar slots
/// of the `diagnostico` fact are required; controlled-vocabulary slots
/// default to a safe middle value instead of failing.
fn diagnosis_from_facts(case_id: CaseId, base: &FactBase) -> Result<Diagnosis> {
    if !base.contains("diagnostico") {
        return Err(TriageError::ReasonerOutput(
            "no diagnostico fact in output".to_string(),
        ));
    }

    let probable_cause = base
        .slot_str("diagnostico", "causa-probable")
        .ok_or_else(|| TriageError::ReasonerOutput("diagnostico missing causa-probable".into()))?
        .to_string();
    let confidence = base
        .slot_i64("diagnostico", "probabilidad")
        .ok_or_else(|| TriageError::ReasonerOutput("diagnostico missing probabilidad".into()))?
        as i32;
    let affected_component = base
        .slot_str("diagnostico", "componente-afectado")
        .ok_or_else(|| {
            TriageError::ReasonerOutput("diagnostico missing componente-afectado".into())
        })?
        .to_string();

    let mut diagnosis = Diagnosis {
        probable_cause,
        confidence,
        affected_component,
        ..Diagnosis::new(case_id)
    };

    if base.contains("decision") {
        diagnosis.technician_required = base.slot_str("decision", "requiere-tecnico") == Some("si");
        diagnosis.solution =
            SolutionKind::parse_fact(base.slot_str("decision", "tipo").unwrap_or_default());
        diagnosis.urgency =
            Urgency::parse_fact(base.slot_str("decision", "urgencia").unwrap_or_default());
    }

    if base.contains("solucion") {
        diagnosis.time_estimate_minutes =
            base.slot_i64("solucion", "tiempo-estimado").unwrap_or(0) as i32;
        diagnosis.cost_max = base.slot_f64("solucion", "costo-estimado").unwrap_or(0.0);
        diagnosis.cost_min = 0.0;
        if let Some(steps) = base.slot_str("solucion", "pasos") {
            diagnosis.diy_instructions = steps.split('|').map(str::to_string).collect();
        }
    }

    if base.contains("orden-trabajo") {
        diagnosis.work_order = true;
        diagnosis.work_order_priority = base
            .slot_str("orden-trabajo", "prioridad")
            .map(str::to_string);
        if let Some(parts) = base.slot_str("orden-trabajo", "repuestos-probables") {
            diagnosis.probable_parts = parts.split(',').map(str::to_string).collect();
        }
    }

    Ok(diagnosis)
}
