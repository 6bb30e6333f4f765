//! Interview API Routes
//!
//! Implements the HTTP surface consumed by interview clients:
//!
//! - GET  /health - liveness and version
//! - GET  /api/interview/models - provider catalog pass-through
//! - POST /api/interview/next - next scripted question, acknowledged by the model
//! - POST /api/interview/followup - one follow-up to the candidate's answer
//! - POST /api/interview/transcribe - multipart audio to plain-text transcript
//! - POST /api/interview/closing - closing statement over the full transcript
//!
//! The environment is read per request, so pinned models and the credential
//! can change without a restart. Provider errors come back as JSON bodies;
//! 429 is preserved for quota signals, everything else collapses to 500.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use pixie_engine::config::Config;
use pixie_engine::dispatch::{DispatchResult, Dispatcher};
use pixie_engine::error::EngineError;
use pixie_engine::gemini::{CatalogClient, GenerateClient};
use pixie_engine::selector::{resolve_candidates, SelectionCache, Workload};
use pixie_engine::session::{Role, Turn, INTERVIEW_QUESTIONS};

const INTERVIEWER_SYSTEM: &str = "You are Pixie, an AI interviewer. Keep a professional, \
     friendly tone. Ask exactly one question at a time. Do not mention any hidden question \
     list. Do not include markdown. Keep it concise.";

const CLOSING_SYSTEM: &str = "You are Pixie, an AI interviewer. Provide a short friendly \
     closing statement and 2-3 bullet-less feedback points. No markdown, no headings, plain \
     text only.";

const TRANSCRIBE_PROMPT: &str = "Transcribe the following audio into plain text. Return \
     only the transcript, no extra commentary.";

/// Uploaded audio answers can be a few minutes long.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// State shared across handlers: the selection cache and one HTTP client.
#[derive(Clone)]
pub struct AppState {
    pub cache: SelectionCache,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            cache: SelectionCache::new(),
            http: reqwest::Client::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/interview/models", get(models_handler))
        .route("/api/interview/next", post(next_handler))
        .route("/api/interview/followup", post(followup_handler))
        .route("/api/interview/transcribe", post(transcribe_handler))
        .route("/api/interview/closing", post(closing_handler))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextRequest {
    #[serde(default)]
    history: Vec<Turn>,

    #[serde(default)]
    question_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FollowupRequest {
    #[serde(default)]
    question: String,

    #[serde(default)]
    answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ClosingRequest {
    #[serde(default)]
    transcript: String,
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Catalog pass-through, for operators deciding what to pin.
async fn models_handler(State(state): State<AppState>) -> Response {
    let config = Config::from_env();
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => return error_response(&e),
    };

    let catalog = CatalogClient::new(config.base_url.clone(), state.http.clone());
    match catalog.list_models(&api_key).await {
        Ok(models) => Json(json!({ "models": models })).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn next_handler(State(state): State<AppState>, Json(req): Json<NextRequest>) -> Response {
    let config = Config::from_env();
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => return error_response(&e),
    };

    let question_index = req.question_index.unwrap_or(0).max(0) as usize;
    let done = question_index >= INTERVIEW_QUESTIONS.len();

    let prompt = if done {
        "The interview questions are complete. Give a short closing statement and thank the \
         candidate."
            .to_string()
    } else {
        format!(
            "Ask the candidate the next interview question: \"{}\". If the candidate just \
             answered something, briefly acknowledge it in one short sentence, then ask the \
             next question. Do not ask multiple questions.",
            INTERVIEW_QUESTIONS[question_index]
        )
    };

    let mut contents: Vec<Value> = req
        .history
        .iter()
        .map(|turn| {
            json!({
                "role": if turn.role == Role::Assistant { "model" } else { "user" },
                "parts": [{ "text": turn.content }]
            })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": prompt }] }));

    let body = json!({
        "contents": contents,
        "systemInstruction": { "parts": [{ "text": INTERVIEWER_SYSTEM }] }
    });

    match generate(&state, &config, Workload::Interview, &api_key, &body).await {
        Ok(result) => Json(json!({
            "message": result.text,
            "done": done,
            "model": result.model,
            "askedQuestionIndex": if done { Value::Null } else { json!(question_index) },
            "nextQuestionIndex": if done { question_index } else { question_index + 1 },
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn followup_handler(
    State(state): State<AppState>,
    Json(req): Json<FollowupRequest>,
) -> Response {
    let config = Config::from_env();
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => return error_response(&e),
    };

    let question = req.question.trim();
    let answer = req.answer.trim();
    if question.is_empty() || answer.is_empty() {
        return bad_request("Missing question or answer.");
    }

    let prompt = format!(
        "The candidate was asked: \"{question}\". They answered: \"{answer}\". Ask exactly \
         one short follow-up question that digs deeper into the answer. Do not repeat the \
         original question."
    );

    let body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        "systemInstruction": { "parts": [{ "text": INTERVIEWER_SYSTEM }] }
    });

    match generate(&state, &config, Workload::Interview, &api_key, &body).await {
        Ok(result) => Json(json!({ "followup": result.text, "model": result.model })).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn transcribe_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let config = Config::from_env();
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => return error_response(&e),
    };

    let mut audio: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("audio") {
                    continue;
                }
                let mime = field
                    .content_type()
                    .unwrap_or("audio/webm")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => audio = Some((mime, bytes.to_vec())),
                    Err(_) => return bad_request("Failed to read 'audio' file."),
                }
            }
            Ok(None) => break,
            Err(_) => return bad_request("Expected multipart/form-data."),
        }
    }

    let Some((mime_type, bytes)) = audio else {
        return bad_request("Missing 'audio' file in form-data.");
    };

    let body = json!({
        "contents": [{
            "role": "user",
            "parts": [
                { "text": TRANSCRIBE_PROMPT },
                { "inlineData": { "mimeType": mime_type, "data": BASE64.encode(&bytes) } }
            ]
        }]
    });

    match generate(&state, &config, Workload::Transcription, &api_key, &body).await {
        Ok(result) => {
            Json(json!({ "transcript": result.text, "model": result.model })).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn closing_handler(
    State(state): State<AppState>,
    Json(req): Json<ClosingRequest>,
) -> Response {
    let config = Config::from_env();
    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(e) => return error_response(&e),
    };

    let transcript = req.transcript.trim();
    if transcript.is_empty() {
        return bad_request("Missing transcript.");
    }

    let prompt = format!(
        "{CLOSING_SYSTEM}\n\nHere is the interview transcript (Pixie and candidate). Provide \
         a short closing statement and 2-3 feedback points:\n\n{transcript}"
    );

    let body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
    });

    match generate(&state, &config, Workload::Closing, &api_key, &body).await {
        Ok(result) => Json(json!({ "closing": result.text, "model": result.model })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Resolve candidates and run the dispatch loop for one request.
async fn generate(
    state: &AppState,
    config: &Config,
    workload: Workload,
    api_key: &str,
    body: &Value,
) -> Result<DispatchResult, EngineError> {
    let catalog = CatalogClient::new(config.base_url.clone(), state.http.clone());
    let candidates = resolve_candidates(
        &catalog,
        &state.cache,
        api_key,
        workload,
        config.pinned_model(workload),
    )
    .await?;

    let backend = GenerateClient::new(config.base_url.clone(), state.http.clone());
    let dispatcher = Dispatcher::with_default_classifier(backend, state.cache.clone(), workload);
    dispatcher.dispatch(api_key, &candidates, body).await
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message })),
    )
        .into_response()
}

fn error_response(err: &EngineError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut body = json!({ "error": err.to_string() });
    match err {
        EngineError::FatalProvider {
            status: provider_status,
            model,
            ..
        } => {
            body["status"] = json!(provider_status);
            body["model"] = json!(model);
        }
        EngineError::AllCandidatesExhausted {
            status: provider_status,
            model,
            retry_after_seconds,
            ..
        } => {
            body["status"] = json!(provider_status);
            if let Some(model) = model {
                body["model"] = json!(model);
            }
            body["retryAfterSeconds"] = json!(retry_after_seconds);
        }
        _ => {}
    }

    (status, Json(body)).into_response()
}
