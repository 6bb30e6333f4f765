//! Route tests against a live router and a mocked provider.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pixie_server::handlers::{app, AppState};

async fn spawn_app() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        axum::serve(listener, app(AppState::new()))
            .await
            .expect("server task");
    });

    format!("http://{addr}")
}

fn generation_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [
            { "content": { "parts": [{ "text": text }] } }
        ]
    })
}

// Env vars are process-global: every test in this binary sets the same
// credential value, and only this test touches the base URL and pins.
#[tokio::test]
async fn test_interview_routes_roundtrip() {
    let provider = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/gemini-1.5-pro",
                    "supportedGenerationMethods": ["generateContent"]
                },
                {
                    "name": "models/gemini-1.5-flash",
                    "supportedGenerationMethods": ["generateContent"],
                    "displayName": "Gemini 1.5 Flash"
                }
            ]
        })))
        .mount(&provider)
        .await;

    Mock::given(method("POST"))
        .and(path("/models/gemini-1.5-flash:generateContent"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(generation_body("Thanks. Tell me about yourself.")),
        )
        .mount(&provider)
        .await;

    std::env::set_var("GEMINI_API_KEY", "test-key");
    std::env::set_var("GEMINI_BASE_URL", provider.uri());
    std::env::remove_var("GEMINI_MODEL");
    std::env::remove_var("GEMINI_TRANSCRIBE_MODEL");
    std::env::remove_var("GEMINI_CLOSING_MODEL");

    let base = spawn_app().await;
    let client = reqwest::Client::new();

    // Liveness.
    let response = client
        .get(format!("{base}/health"))
        .send()
        .await
        .expect("health request");
    assert_eq!(response.status(), 200);
    let health: serde_json::Value = response.json().await.expect("health body");
    assert_eq!(health["status"], "running");

    // Catalog pass-through.
    let response = client
        .get(format!("{base}/api/interview/models"))
        .send()
        .await
        .expect("models request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("models body");
    assert_eq!(body["models"].as_array().map(Vec::len), Some(2));

    // Next question: flash outranks pro and answers.
    let response = client
        .post(format!("{base}/api/interview/next"))
        .json(&json!({
            "history": [
                { "role": "assistant", "content": "Tell me about yourself." },
                { "role": "user", "content": "I build backend services." }
            ],
            "questionIndex": 0
        }))
        .send()
        .await
        .expect("next request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("next body");
    assert_eq!(body["message"], "Thanks. Tell me about yourself.");
    assert_eq!(body["done"], false);
    assert_eq!(body["model"], "gemini-1.5-flash");
    assert_eq!(body["askedQuestionIndex"], 0);
    assert_eq!(body["nextQuestionIndex"], 1);

    // Follow-up rides the now-cached selection.
    let response = client
        .post(format!("{base}/api/interview/followup"))
        .json(&json!({
            "question": "Tell me about yourself.",
            "answer": "I build backend services for a logistics company."
        }))
        .send()
        .await
        .expect("followup request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("followup body");
    assert_eq!(body["followup"], "Thanks. Tell me about yourself.");
    assert_eq!(body["model"], "gemini-1.5-flash");

    // Transcription accepts multipart audio.
    let form = reqwest::multipart::Form::new().part(
        "audio",
        reqwest::multipart::Part::bytes(vec![0u8; 2048])
            .file_name("answer.webm")
            .mime_str("audio/webm")
            .expect("mime"),
    );
    let response = client
        .post(format!("{base}/api/interview/transcribe"))
        .multipart(form)
        .send()
        .await
        .expect("transcribe request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("transcribe body");
    assert_eq!(body["transcript"], "Thanks. Tell me about yourself.");

    // Closing over the flat transcript.
    let response = client
        .post(format!("{base}/api/interview/closing"))
        .json(&json!({
            "transcript": "Pixie: Tell me about yourself.\nCandidate: I build backend services."
        }))
        .send()
        .await
        .expect("closing request");
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("closing body");
    assert_eq!(body["closing"], "Thanks. Tell me about yourself.");
}

#[tokio::test]
async fn test_closing_requires_transcript() {
    std::env::set_var("GEMINI_API_KEY", "test-key");

    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/interview/closing"))
        .json(&json!({ "transcript": "   " }))
        .send()
        .await
        .expect("closing request");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("closing body");
    assert_eq!(body["error"], "Missing transcript.");
}

#[tokio::test]
async fn test_followup_requires_question_and_answer() {
    std::env::set_var("GEMINI_API_KEY", "test-key");

    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/interview/followup"))
        .json(&json!({ "question": "", "answer": "something" }))
        .send()
        .await
        .expect("followup request");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("followup body");
    assert_eq!(body["error"], "Missing question or answer.");
}

#[tokio::test]
async fn test_transcribe_requires_audio_field() {
    std::env::set_var("GEMINI_API_KEY", "test-key");

    let base = spawn_app().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().text("note", "no audio here");
    let response = client
        .post(format!("{base}/api/interview/transcribe"))
        .multipart(form)
        .send()
        .await
        .expect("transcribe request");
    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.expect("transcribe body");
    assert_eq!(body["error"], "Missing 'audio' file in form-data.");
}
