//! REST surface for the screening flow.
//!
//! The session id stands in for the host's per-session storage key; every
//! handler locks the one session it touches, so a session only ever
//! processes one turn at a time.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::error::SessionError;
use crate::llm::{LlmProvider, PromptOracle};
use crate::screening::{intake, CandidateForm, FieldError, InterviewFlow, Stage};
use crate::sentiment::SentimentClassifier;
use crate::session::{Page, Session, SessionManager};

/// Shared state for the screening routes.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub flow: Arc<InterviewFlow>,
    pub oracle: Arc<PromptOracle>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        sentiment: SentimentClassifier,
        default_language: impl Into<String>,
    ) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(default_language)),
            flow: Arc::new(InterviewFlow::new(
                PromptOracle::new(Arc::clone(&provider)),
                sentiment,
            )),
            oracle: Arc::new(PromptOracle::new(provider)),
        }
    }
}

/// Build the screening REST routes.
pub fn screening_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/session/{id}", get(session_snapshot))
        .route("/api/session/{id}/start", post(start_application))
        .route("/api/session/{id}/info", post(submit_info))
        .route("/api/session/{id}/chat", post(chat_turn))
        .route("/api/session/{id}/resume", post(upload_resume))
        .route("/api/session/{id}/report", get(hiring_report))
        .route("/api/session/{id}/reset", post(reset_session))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct SessionSnapshot {
    session_id: Uuid,
    page: Page,
    stage: Stage,
    candidate: crate::screening::CandidateRecord,
    progress: Progress,
    insights: Vec<AnswerInsight>,
}

#[derive(Debug, Serialize)]
struct Progress {
    answered: usize,
    asked: usize,
}

#[derive(Debug, Serialize)]
struct AnswerInsight {
    question: String,
    sentiment: Option<String>,
    ai_detection: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatTurn {
    message: String,
}

#[derive(Debug, Serialize)]
struct TurnResponse {
    reply: String,
    stage: Stage,
    page: Page,
    concluded: bool,
    progress: Progress,
}

#[derive(Debug, Deserialize)]
struct ResumeUpload {
    filename: String,
}

fn snapshot(session: &Session) -> SessionSnapshot {
    let record = &session.screening.record;
    let insights = record
        .questions
        .iter()
        .map(|q| q.label())
        .filter(|label| record.answers.contains_key(label))
        .map(|label| AnswerInsight {
            sentiment: record.answer_sentiment.get(&label).map(|s| s.to_string()),
            ai_detection: record.answer_origin.get(&label).map(|o| o.to_string()),
            question: label,
        })
        .collect();

    SessionSnapshot {
        session_id: session.id,
        page: session.page,
        stage: session.screening.stage,
        progress: Progress {
            answered: record.answers.len(),
            asked: record.questions.len(),
        },
        insights,
        candidate: record.clone(),
    }
}

fn error_response(err: SessionError) -> Response {
    let status = match err {
        SessionError::NotFound { .. } => StatusCode::NOT_FOUND,
        SessionError::InvalidTransition { .. }
        | SessionError::TurnNotAccepted { .. }
        | SessionError::WrongPage { .. } => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

fn validation_response(errors: Vec<FieldError>) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({ "errors": errors })),
    )
        .into_response()
}

// ── Handlers ────────────────────────────────────────────────────────

/// POST /api/session — create a session on the welcome page.
async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let handle = state.sessions.create().await;
    let session = handle.lock().await;
    Json(snapshot(&session)).into_response()
}

/// GET /api/session/{id} — current snapshot.
async fn session_snapshot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    match state.sessions.get(id).await {
        Ok(handle) => {
            let session = handle.lock().await;
            Json(snapshot(&session)).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/session/{id}/start — begin a fresh application.
async fn start_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let mut session = handle.lock().await;
    if let Err(e) = session.start_application() {
        return error_response(e);
    }
    Json(snapshot(&session)).into_response()
}

/// POST /api/session/{id}/info — submit the candidate form.
///
/// On success the session moves to the chat page and the greeting is the
/// first assistant message.
async fn submit_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(form): Json<CandidateForm>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let mut session = handle.lock().await;
    if let Err(e) = session.require_page(Page::InfoCollection) {
        return error_response(e);
    }

    if let Err(errors) =
        intake::validate_and_commit(&form, &mut session.screening.record, &state.oracle).await
    {
        return validation_response(errors);
    }

    let greeting = match state.flow.open_screening(&mut session.screening) {
        Ok(g) => g,
        Err(e) => return error_response(e),
    };
    session.navigate(Page::ChatInterface);
    session.push_message(crate::llm::ChatMessage::assistant(greeting.clone()));

    Json(serde_json::json!({
        "message": greeting,
        "page": session.page,
        "stage": session.screening.stage,
    }))
    .into_response()
}

/// POST /api/session/{id}/chat — one candidate turn.
async fn chat_turn(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(turn): Json<ChatTurn>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let mut session = handle.lock().await;
    if let Err(e) = session.require_page(Page::ChatInterface) {
        return error_response(e);
    }

    session.push_message(crate::llm::ChatMessage::user(turn.message.clone()));

    let outcome = match state.flow.handle_turn(&mut session.screening, &turn.message).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };

    session.push_message(crate::llm::ChatMessage::assistant(outcome.reply.clone()));
    if outcome.concluded {
        session.navigate(Page::Exit);
    } else {
        session.touch();
    }

    let record = &session.screening.record;
    Json(TurnResponse {
        reply: outcome.reply,
        stage: outcome.stage,
        page: session.page,
        concluded: outcome.concluded,
        progress: Progress {
            answered: record.answers.len(),
            asked: record.questions.len(),
        },
    })
    .into_response()
}

/// POST /api/session/{id}/resume — record a resume upload.
///
/// Metadata only: the flag flips, the document itself is never parsed.
async fn upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(upload): Json<ResumeUpload>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let mut session = handle.lock().await;
    if let Err(e) = session.require_page(Page::InfoCollection) {
        return error_response(e);
    }

    let lowered = upload.filename.to_lowercase();
    if !lowered.ends_with(".pdf") && !lowered.ends_with(".docx") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "Resume must be a PDF or DOCX file."
            })),
        )
            .into_response();
    }

    session.screening.record.mark_resume_uploaded();
    session.touch();
    Json(serde_json::json!({ "resume_uploaded": true })).into_response()
}

/// GET /api/session/{id}/report — hiring recommendation (exit page only).
async fn hiring_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let session = handle.lock().await;
    if let Err(e) = session.require_page(Page::Exit) {
        return error_response(e);
    }

    let report = state.flow.hiring_report(&session.screening.record).await;
    Json(serde_json::json!({ "report": report })).into_response()
}

/// POST /api/session/{id}/reset — discard everything, back to welcome.
async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Response {
    let handle = match state.sessions.get(id).await {
        Ok(h) => h,
        Err(e) => return error_response(e),
    };
    let mut session = handle.lock().await;
    session.reset();
    Json(snapshot(&session)).into_response()
}
