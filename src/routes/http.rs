//! HTTP endpoint handlers. These are thin wrappers that forward to core logic
//! and the run registry. Each handler is instrumented and logs its parameters
//! and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::assessment::{Outcome, RunHandle, RunSnapshot};
use crate::catalog::{achievements, assessment_history, student_profile, SUBJECTS};
use crate::error::ApiError;
use crate::logic::*;
use crate::protocol::*;
use crate::results::{build_report, leaderboard, ResultsReport};
use crate::state::AppState;

const DEFAULT_LEADERBOARD_SUBJECT: &str = "General";

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_subjects() -> impl IntoResponse { Json(SUBJECTS) }

#[instrument(level = "info")]
pub async fn http_student() -> impl IntoResponse { Json(student_profile()) }

#[instrument(level = "info")]
pub async fn http_assessment_history() -> impl IntoResponse { Json(assessment_history()) }

#[instrument(level = "info")]
pub async fn http_achievements() -> impl IntoResponse { Json(achievements()) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_questions(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionsQuery>,
) -> Result<Json<QuestionsOut>, ApiError> {
  let subject = q.subject.unwrap_or_default();
  let request = parse_run_request(&subject, q.count, q.difficulty.as_deref(), &state.limits)?;
  let (questions, origin) = fetch_questions(&state, &request).await;
  Ok(Json(QuestionsOut {
    origin,
    questions: questions.into_iter().map(QuestionOut::from).collect(),
  }))
}

#[instrument(level = "info")]
pub async fn http_leaderboard(Query(q): Query<LeaderboardQuery>) -> impl IntoResponse {
  let subject = q.subject.unwrap_or_else(|| DEFAULT_LEADERBOARD_SUBJECT.into());
  let entries = leaderboard(&subject, &mut rand::thread_rng());
  Json(LeaderboardOut { subject, entries })
}

#[instrument(level = "info", skip(state, body), fields(%body.subject, question_len = body.question.len()))]
pub async fn http_post_explanation(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExplanationIn>,
) -> impl IntoResponse {
  let explanation = do_explanation(&state, &body.subject, &body.question, &body.correct_answer).await;
  Json(ExplanationOut { explanation })
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len()))]
pub async fn http_post_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> Result<Json<ChatOut>, ApiError> {
  if body.message.trim().is_empty() {
    return Err(ApiError::BadRequest("message must not be empty".into()));
  }
  let reply = do_chat_reply(&state, &body).await;
  Ok(Json(ChatOut { reply }))
}

// ---- Runs ----

async fn find_run(state: &AppState, id: Uuid) -> Result<RunHandle, ApiError> {
  state
    .get_run(id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("run {} not found", id)))
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_start_run(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartRunIn>,
) -> Result<(StatusCode, Json<StartRunOut>), ApiError> {
  let request = parse_run_request(&body.topic, body.count, body.difficulty.as_deref(), &state.limits)?;
  let handle = state.start_run(request).await?;
  let run = handle.snapshot().await?;
  info!(target: "assessment", run_id = %run.id, total = run.total, origin = ?handle.origin(), "HTTP run started");
  Ok((StatusCode::CREATED, Json(StartRunOut { origin: handle.origin(), run })))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_run(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RunSnapshot>, ApiError> {
  let handle = find_run(&state, id).await?;
  Ok(Json(handle.snapshot().await?))
}

#[instrument(level = "info", skip(state, body), fields(%id))]
pub async fn http_post_run_answer(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<Outcome>, ApiError> {
  let handle = find_run(&state, id).await?;
  let outcome = handle.answer(body.selection).await?;
  Ok(Json(outcome))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_run_skip(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Outcome>, ApiError> {
  let handle = find_run(&state, id).await?;
  Ok(Json(handle.skip().await?))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_run_next(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RunSnapshot>, ApiError> {
  let handle = find_run(&state, id).await?;
  Ok(Json(handle.go_next().await?.run))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_post_run_previous(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<RunSnapshot>, ApiError> {
  let handle = find_run(&state, id).await?;
  Ok(Json(handle.go_previous().await?.run))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_run_report(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResultsReport>, ApiError> {
  let handle = find_run(&state, id).await?;
  let result = handle
    .result()
    .await?
    .ok_or_else(|| ApiError::Conflict("run is still in progress".into()))?;
  info!(target: "assessment", run_id = %id, score = result.score, total = result.total, "HTTP report served");
  Ok(Json(build_report(result, handle.topic(), &mut rand::thread_rng())))
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_delete_run(
  State(state): State<Arc<AppState>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  if state.remove_run(id).await {
    info!(target: "assessment", run_id = %id, "HTTP run deleted");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("run {} not found", id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum_test::TestServer;
  use serde_json::{json, Value};

  use crate::routes::build_router;

  fn server() -> TestServer {
    let state = Arc::new(AppState::from_config(Default::default(), None));
    TestServer::new(build_router(state)).unwrap()
  }

  async fn start(server: &TestServer, body: Value) -> Value {
    let res = server.post("/api/v1/runs").json(&body).await;
    res.assert_status(StatusCode::CREATED);
    res.json()
  }

  #[tokio::test]
  async fn health_and_catalog() {
    let server = server();
    server.get("/api/v1/health").await.assert_json(&json!({ "ok": true }));

    let subjects: Value = server.get("/api/v1/subjects").await.json();
    assert_eq!(subjects.as_array().map(Vec::len), Some(10));
    assert_eq!(subjects[0]["name"], "Mechanical Engineering");
    assert!(subjects[0].get("guidance").is_none());

    let history: Value = server.get("/api/v1/assessment-history").await.json();
    assert_eq!(history[0]["totalQuestions"], 20);
  }

  #[tokio::test]
  async fn start_without_model_uses_fallback() {
    let server = server();
    let body = start(&server, json!({ "topic": "Electrical Engineering" })).await;
    assert_eq!(body["origin"], "fallback");
    assert_eq!(body["run"]["total"], 5);
    assert_eq!(body["run"]["currentIndex"], 0);
    assert_eq!(body["run"]["status"], "in_progress");
    assert_eq!(body["run"]["timeRemaining"], 30);
    assert!(body["run"]["question"].get("correctOption").is_none());
  }

  #[tokio::test]
  async fn answering_everything_correctly_scores_full_marks() {
    let server = server();
    let batch: Value = server
      .get("/api/v1/questions")
      .add_query_param("subject", "Electrical Engineering")
      .add_query_param("count", 5)
      .await
      .json();
    let body = start(&server, json!({ "topic": "Electrical Engineering", "count": 5 })).await;
    let id = body["run"]["id"].as_str().unwrap().to_string();

    let mut last = Value::Null;
    for q in batch["questions"].as_array().unwrap() {
      last = server
        .post(&format!("/api/v1/runs/{}/answer", id))
        .json(&json!({ "selection": q["correctAnswer"] }))
        .await
        .json();
    }
    assert_eq!(last["status"], "completed");
    assert_eq!(last["result"]["score"], 5);
    assert_eq!(last["result"]["total"], 5);
    let details = last["result"]["detailedResults"].as_array().unwrap();
    assert_eq!(details.len(), 5);
    assert!(details.iter().all(|d| d["isCorrect"] == true));

    let report: Value = server.get(&format!("/api/v1/runs/{}/report", id)).await.json();
    assert_eq!(report["percentage"], 100);
    assert_eq!(report["leaderboard"].as_array().map(Vec::len), Some(12));

    let again = server
      .post(&format!("/api/v1/runs/{}/answer", id))
      .json(&json!({ "selection": "anything" }))
      .await;
    again.assert_status(StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn navigation_clamps_at_the_ends() {
    let server = server();
    let body = start(&server, json!({ "topic": "Civil Engineering", "count": 2, "difficulty": "easy" })).await;
    let id = body["run"]["id"].as_str().unwrap().to_string();

    let snap: Value = server.post(&format!("/api/v1/runs/{}/previous", id)).await.json();
    assert_eq!(snap["currentIndex"], 0);
    let snap: Value = server.post(&format!("/api/v1/runs/{}/next", id)).await.json();
    assert_eq!(snap["currentIndex"], 1);
    let snap: Value = server.post(&format!("/api/v1/runs/{}/next", id)).await.json();
    assert_eq!(snap["currentIndex"], 1);
    assert_eq!(snap["timeRemaining"], 20);
  }

  #[tokio::test]
  async fn report_waits_for_completion() {
    let server = server();
    let body = start(&server, json!({ "topic": "Math", "count": 1 })).await;
    let id = body["run"]["id"].as_str().unwrap().to_string();

    server.get(&format!("/api/v1/runs/{}/report", id)).await.assert_status(StatusCode::CONFLICT);

    let outcome: Value = server.post(&format!("/api/v1/runs/{}/skip", id)).await.json();
    assert_eq!(outcome["status"], "completed");
    assert_eq!(outcome["result"]["detailedResults"][0]["userAnswer"], Value::Null);

    let res = server.get(&format!("/api/v1/runs/{}/report", id)).await;
    res.assert_status_ok();
    let report: Value = res.json();
    assert_eq!(report["score"], 0);
    assert_eq!(report["strengths"][0], "Algebra");
  }

  #[tokio::test]
  async fn bad_requests_are_rejected() {
    let server = server();
    server.post("/api/v1/runs").json(&json!({ "topic": "Math", "difficulty": "expert" })).await.assert_status_bad_request();
    server.post("/api/v1/runs").json(&json!({ "topic": "" })).await.assert_status_bad_request();
    server.post("/api/v1/runs").json(&json!({ "topic": "Math", "count": 0 })).await.assert_status_bad_request();
    server.post("/api/v1/ai/chat").json(&json!({ "message": "  " })).await.assert_status_bad_request();
  }

  #[tokio::test]
  async fn unknown_and_deleted_runs_are_not_found() {
    let server = server();
    server.get(&format!("/api/v1/runs/{}", Uuid::new_v4())).await.assert_status_not_found();

    let body = start(&server, json!({ "topic": "Computer Engineering" })).await;
    let id = body["run"]["id"].as_str().unwrap().to_string();
    server.get(&format!("/api/v1/runs/{}", id)).await.assert_status_ok();
    server.delete(&format!("/api/v1/runs/{}", id)).await.assert_status(StatusCode::NO_CONTENT);
    server.get(&format!("/api/v1/runs/{}", id)).await.assert_status_not_found();
    server.delete(&format!("/api/v1/runs/{}", id)).await.assert_status_not_found();
  }

  #[tokio::test]
  async fn explanation_and_chat_fall_back_to_stubs() {
    let server = server();
    let body: Value = server
      .post("/api/v1/explanation")
      .json(&json!({ "subject": "Civil Engineering", "question": "Why piles?", "correctAnswer": "Weak soil" }))
      .await
      .json();
    assert!(body["explanation"].as_str().unwrap().starts_with("According to civil engineering principles"));

    let body: Value = server.post("/api/v1/ai/chat").json(&json!({ "message": "When is my exam?" })).await.json();
    assert!(body["reply"].as_str().unwrap().contains("exam"));
  }

  #[tokio::test]
  async fn leaderboard_is_subject_specific() {
    let server = server();
    let body: Value = server.get("/api/v1/leaderboard").add_query_param("subject", "Software Engineering").await.json();
    assert_eq!(body["subject"], "Software Engineering");
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 12);
    assert!(entries.iter().all(|e| e["subject"] == "Software Engineering"));
  }
}
