use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use uuid::Uuid;

use triage_common::ids::CaseId;
use triage_common::types::{Answer, ApplianceKind, Case, Hypothesis, Question};
use triage_common::TriageError;

use crate::inference::InferenceEngine;
use crate::repo::{CaseRepo, TriageStats};

/// Shared application state accessible from axum handlers.
pub struct AppState {
    pub engine: InferenceEngine,
    pub repo: CaseRepo,
    pub metrics_handle: PrometheusHandle,
}

/// Maps engine errors onto HTTP statuses. Reasoner errors never appear here:
/// finalize recovers them internally.
fn error_response(e: TriageError) -> (StatusCode, String) {
    let status = match e {
        TriageError::NotFound(_) => StatusCode::NOT_FOUND,
        TriageError::NoApplicableRule(_) | TriageError::NoAnswers(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

#[derive(Deserialize)]
pub struct CreateCaseRequest {
    pub appliance: ApplianceKind,
    pub symptom: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub age_years: Option<i32>,
}

/// POST /cases — open a new triage case.
pub async fn create_case(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCaseRequest>,
) -> Json<Case> {
    let mut case = Case::new(req.appliance, req.symptom);
    if let Some(description) = req.description {
        case.description = description;
    }
    case.customer_name = req.customer_name;
    case.customer_phone = req.customer_phone;
    case.brand = req.brand;
    case.model = req.model;
    case.age_years = req.age_years;

    tracing::info!(case_id = %case.id, appliance = case.appliance.as_fact_str(), "Case created");
    Json(state.repo.insert_case(case))
}

/// GET /cases — all cases, oldest first.
pub async fn list_cases(State(state): State<Arc<AppState>>) -> Json<Vec<Case>> {
    Json(state.repo.list_cases())
}

/// GET /cases/{id}
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Case>, (StatusCode, String)> {
    let case = state
        .repo
        .get_case(CaseId::from_uuid(id))
        .map_err(error_response)?;
    Ok(Json(case))
}

/// GET /cases/{id}/next-question — null body once questioning is done.
pub async fn next_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<Question>>, (StatusCode, String)> {
    let case = state
        .repo
        .get_case(CaseId::from_uuid(id))
        .map_err(error_response)?;
    let question = state.engine.next_question(&case).map_err(error_response)?;
    Ok(Json(question))
}

#[derive(Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    pub value: String,
}

/// POST /cases/{id}/answers — persist the answer row, then feed the engine.
pub async fn record_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let case_id = CaseId::from_uuid(id);
    let case = state.repo.get_case(case_id).map_err(error_response)?;

    state.repo.append_answer(Answer::new(case_id, req.question_id, req.value.clone()));
    state
        .engine
        .record_answer(&case, req.question_id, &req.value)
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /cases/{id}/hypotheses — current candidate causes, most probable
/// first.
pub async fn hypotheses(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Hypothesis>>, (StatusCode, String)> {
    let case_id = CaseId::from_uuid(id);
    state.repo.get_case(case_id).map_err(error_response)?;
    Ok(Json(state.engine.hypotheses(case_id)))
}

/// POST /cases/{id}/finalize — produce the diagnosis and return the updated
/// case.
pub async fn finalize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Case>, (StatusCode, String)> {
    let case_id = CaseId::from_uuid(id);
    let mut case = state.repo.get_case(case_id).map_err(error_response)?;
    let persisted = state.repo.answers_for(case_id);

    state
        .engine
        .finalize(&mut case, &persisted)
        .await
        .map_err(error_response)?;

    state.repo.update_case(&case);
    Ok(Json(case))
}

/// GET /stats — today's triage counters.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<TriageStats> {
    Json(state.repo.daily_stats())
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /metrics — Prometheus render.
pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}
