//! Terminal Interview Client
//!
//! Drives the session state machine against a running pixie-server: prints
//! assistant turns, reads answers from stdin, and performs the machine's
//! follow-up/closing requests over HTTP. Failed requests degrade to the
//! scripted flow, exactly as the machine dictates.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use serde_json::json;

use pixie_engine::session::{Effect, Event, Phase, Session};

pub async fn run_interview(server: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let base = server.trim_end_matches('/').to_string();

    let mut session = Session::new();
    let effects = session.apply(Event::Started);
    perform(&client, &base, &mut session, effects).await;

    let stdin = io::stdin();
    while session.phase() != Phase::Done {
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("failed to read answer")?;
        if read == 0 {
            // EOF: walk away mid-interview.
            break;
        }

        let answer = line.trim();
        if answer.is_empty() {
            continue;
        }

        let effects = session.apply(Event::Answered(answer.to_string()));
        perform(&client, &base, &mut session, effects).await;
    }

    println!("Interview complete. Thanks for practicing with Pixie.");
    Ok(())
}

/// Execute effects in order, feeding request outcomes back into the machine.
async fn perform(
    client: &reqwest::Client,
    base: &str,
    session: &mut Session,
    effects: Vec<Effect>,
) {
    let mut queue: VecDeque<Effect> = effects.into();

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Say(text) => {
                println!("\nPixie: {text}\n");
            }
            Effect::Diagnostic(message) => {
                tracing::warn!("interview degraded to the script: {}", message);
            }
            Effect::RequestFollowup { question, answer } => {
                let result = request_followup(client, base, &question, &answer).await;
                queue.extend(session.apply(Event::FollowupReady(result)));
            }
            Effect::RequestClosing { transcript } => {
                let result = request_closing(client, base, &transcript).await;
                queue.extend(session.apply(Event::ClosingReady(result)));
            }
        }
    }
}

async fn request_followup(
    client: &reqwest::Client,
    base: &str,
    question: &str,
    answer: &str,
) -> std::result::Result<String, String> {
    post_for_field(
        client,
        &format!("{base}/api/interview/followup"),
        json!({ "question": question, "answer": answer }),
        "followup",
    )
    .await
}

async fn request_closing(
    client: &reqwest::Client,
    base: &str,
    transcript: &str,
) -> std::result::Result<String, String> {
    post_for_field(
        client,
        &format!("{base}/api/interview/closing"),
        json!({ "transcript": transcript }),
        "closing",
    )
    .await
}

/// POST a JSON body and pull one string field out of the response.
async fn post_for_field(
    client: &reqwest::Client,
    url: &str,
    body: serde_json::Value,
    field: &str,
) -> std::result::Result<String, String> {
    let response = client
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = response.status();
    let data: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;

    if !status.is_success() {
        let message = data
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("Interview service failed.");
        return Err(message.to_string());
    }

    Ok(data
        .get(field)
        .and_then(|f| f.as_str())
        .unwrap_or_default()
        .to_string())
}
