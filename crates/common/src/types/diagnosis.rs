use serde::{Deserialize, Serialize};

use crate::ids::{CaseId, DiagnosisId};

/// Who fixes it, and how involved the fix is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionKind {
    Diy,
    SimpleTechnician,
    ComplexTechnician,
    Replacement,
}

impl SolutionKind {
    pub fn as_fact_str(&self) -> &'static str {
        match self {
            Self::Diy => "diy",
            Self::SimpleTechnician => "tecnico-simple",
            Self::ComplexTechnician => "tecnico-complejo",
            Self::Replacement => "reemplazo",
        }
    }

    /// Parses the fact-protocol vocabulary. Unknown values default to the
    /// safe middle: a complex technician visit.
    pub fn parse_fact(s: &str) -> Self {
        match s {
            "diy" => Self::Diy,
            "tecnico-simple" => Self::SimpleTechnician,
            "tecnico-complejo" => Self::ComplexTechnician,
            "reemplazo" => Self::Replacement,
            _ => Self::ComplexTechnician,
        }
    }
}

/// How urgently the failure needs attention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn as_fact_str(&self) -> &'static str {
        match self {
            Self::Low => "baja",
            Self::Medium => "media",
            Self::High => "alta",
            Self::Critical => "critica",
        }
    }

    /// Parses the fact-protocol vocabulary. Unknown values default to Medium.
    pub fn parse_fact(s: &str) -> Self {
        match s {
            "baja" => Self::Low,
            "media" => Self::Medium,
            "alta" => Self::High,
            "critica" => Self::Critical,
            _ => Self::Medium,
        }
    }
}

/// The authoritative result of one finalize call. Produced exactly once per
/// case, attached 1:1, immutable afterward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnosis {
    pub id: DiagnosisId,
    pub case_id: CaseId,
    pub probable_cause: String,
    /// 0–100.
    pub confidence: i32,
    pub affected_component: String,
    pub technician_required: bool,
    pub solution: SolutionKind,
    pub urgency: Urgency,
    pub cost_min: f64,
    pub cost_max: f64,
    pub time_estimate_minutes: i32,
    /// Ordered steps the customer can follow themselves.
    #[serde(default)]
    pub diy_instructions: Vec<String>,
    #[serde(default)]
    pub safety_alerts: Vec<String>,
    #[serde(default)]
    pub customer_messages: Vec<String>,
    #[serde(default)]
    pub probable_parts: Vec<String>,
    pub work_order: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_order_priority: Option<String>,
}

impl Diagnosis {
    /// Empty diagnosis for a case; rules and the fact mapper fill it in via
    /// struct-update syntax.
    pub fn new(case_id: CaseId) -> Self {
        Self {
            id: DiagnosisId::new(),
            case_id,
            probable_cause: String::new(),
            confidence: 0,
            affected_component: String::new(),
            technician_required: false,
            solution: SolutionKind::ComplexTechnician,
            urgency: Urgency::Medium,
            cost_min: 0.0,
            cost_max: 0.0,
            time_estimate_minutes: 0,
            diy_instructions: Vec::new(),
            safety_alerts: Vec::new(),
            customer_messages: Vec::new(),
            probable_parts: Vec::new(),
            work_order: false,
            work_order_priority: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_fact_round_trip() {
        for kind in [
            SolutionKind::Diy,
            SolutionKind::SimpleTechnician,
            SolutionKind::ComplexTechnician,
            SolutionKind::Replacement,
        ] {
            assert_eq!(SolutionKind::parse_fact(kind.as_fact_str()), kind);
        }
        for u in [
            Urgency::Low,
            Urgency::Medium,
            Urgency::High,
            Urgency::Critical,
        ] {
            assert_eq!(Urgency::parse_fact(u.as_fact_str()), u);
        }
    }

    #[test]
    fn test_unknown_vocabulary_defaults_to_safe_middle() {
        assert_eq!(
            SolutionKind::parse_fact("??"),
            SolutionKind::ComplexTechnician
        );
        assert_eq!(Urgency::parse_fact("??"), Urgency::Medium);
    }
}
