use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CaseId;
use crate::types::Diagnosis;

/// Appliance families the rule base covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceKind {
    Refrigerator,
    Washer,
    Microwave,
}

impl ApplianceKind {
    /// Returns the controlled-vocabulary name used in the reasoner's fact
    /// protocol. The template file shares this vocabulary.
    pub fn as_fact_str(&self) -> &'static str {
        match self {
            Self::Refrigerator => "heladera",
            Self::Washer => "lavarropas",
            Self::Microwave => "microondas",
        }
    }
}

/// Case lifecycle states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Question/answer traversal in progress.
    InDiagnosis,
    /// A diagnosis has been attached.
    Diagnosed,
    /// Operator confirmed the DIY fix worked. Terminal-adjacent.
    ResolvedDiy,
    /// A technician visit was dispatched.
    NeedsTechnician,
    /// Closed. Immutable from here on.
    Closed,
}

impl CaseStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Fact-protocol name. The reasoner templates only distinguish
    /// in-diagnosis, resolved-remote, requires-technician, and closed, so
    /// Diagnosed maps back onto the in-diagnosis vocabulary entry.
    pub fn as_fact_str(&self) -> &'static str {
        match self {
            Self::InDiagnosis | Self::Diagnosed => "en-diagnostico",
            Self::ResolvedDiy => "resuelto-remoto",
            Self::NeedsTechnician => "requiere-tecnico",
            Self::Closed => "cerrado",
        }
    }
}

/// One customer appliance-failure report being triaged.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Case {
    pub id: CaseId,
    pub description: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub appliance: ApplianceKind,
    pub brand: String,
    pub model: String,
    /// Age in years, when the customer knows it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_years: Option<i32>,
    /// Free-text symptom as reported by a non-expert operator.
    pub symptom: String,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
    /// Attached exactly once, by finalize. Immutable afterward.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<Diagnosis>,
}

impl Case {
    pub fn new(appliance: ApplianceKind, symptom: impl Into<String>) -> Self {
        let symptom = symptom.into();
        Self {
            id: CaseId::new(),
            description: symptom.clone(),
            customer_name: String::new(),
            customer_phone: String::new(),
            appliance,
            brand: String::new(),
            model: String::new(),
            age_years: None,
            symptom,
            status: CaseStatus::InDiagnosis,
            created_at: Utc::now(),
            diagnosis: None,
        }
    }
}
