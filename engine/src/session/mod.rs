//! Interview Session State Machine
//!
//! Drives the base question → optional follow-up → closing flow as an
//! explicit finite-state machine: callers feed events in and perform the
//! side effects the machine emits. No UI or HTTP types appear here, so the
//! whole flow is testable by asserting on emitted effects.
//!
//! Downstream failures never abort a session. A failed follow-up or closing
//! request degrades to the deterministic script path, and the error text is
//! surfaced as a non-fatal diagnostic effect.

use serde::{Deserialize, Serialize};

pub mod script;

pub use script::INTERVIEW_QUESTIONS;

/// Per-session follow-up budget.
pub const MAX_FOLLOWUPS: usize = 2;

/// Scripted line used when the closing request fails.
pub const FALLBACK_CLOSING: &str = "Thanks for your time. That concludes the interview.";

/// Position in the interview flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Asking scripted questions.
    Base,

    /// A follow-up was requested or asked; the next answer returns to the
    /// script.
    Followup,

    /// Waiting for the closing statement.
    Closing,

    /// Terminal; further answers are ignored.
    Done,
}

/// Speaker of a transcript turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

/// One transcript turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

/// Input to the state machine.
#[derive(Debug, Clone)]
pub enum Event {
    /// Session begins; the machine asks the first scripted question.
    Started,

    /// The candidate submitted an answer.
    Answered(String),

    /// The follow-up endpoint responded, or failed with a message.
    FollowupReady(std::result::Result<String, String>),

    /// The closing endpoint responded, or failed with a message.
    ClosingReady(std::result::Result<String, String>),
}

/// Side effect the caller must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Present an assistant turn (already appended to the transcript).
    Say(String),

    /// Call the follow-up endpoint with the question just answered.
    RequestFollowup { question: String, answer: String },

    /// Call the closing endpoint with the flattened transcript.
    RequestClosing { transcript: String },

    /// Non-fatal error to surface outside the interview flow.
    Diagnostic(String),
}

/// The interview session.
pub struct Session {
    phase: Phase,
    question_index: usize,
    followups_used: usize,
    turns: Vec<Turn>,
    script: Vec<String>,
}

impl Session {
    /// Session over the standard script.
    pub fn new() -> Self {
        Self::with_script(INTERVIEW_QUESTIONS.iter().map(|q| q.to_string()).collect())
    }

    /// Session over a custom script.
    pub fn with_script(script: Vec<String>) -> Self {
        Self {
            phase: Phase::Base,
            question_index: 0,
            followups_used: 0,
            turns: Vec::new(),
            script,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn followups_used(&self) -> usize {
        self.followups_used
    }

    /// Append-only transcript so far.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Flat transcript for the closing request.
    pub fn transcript_text(&self) -> String {
        self.turns
            .iter()
            .map(|t| match t.role {
                Role::Assistant => format!("Pixie: {}", t.content),
                Role::User => format!("Candidate: {}", t.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Feed one event; returns the side effects to perform, in order.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Started => match self.script.first().cloned() {
                Some(question) => vec![self.say(question)],
                None => self.enter_closing(),
            },
            Event::Answered(text) => self.on_answered(text),
            Event::FollowupReady(result) => self.on_followup_ready(result),
            Event::ClosingReady(result) => self.on_closing_ready(result),
        }
    }

    fn say(&mut self, text: String) -> Effect {
        self.turns.push(Turn {
            role: Role::Assistant,
            content: text.clone(),
        });
        Effect::Say(text)
    }

    fn on_answered(&mut self, text: String) -> Vec<Effect> {
        let answer = text.trim().to_string();
        if answer.is_empty() {
            return Vec::new();
        }

        match self.phase {
            Phase::Closing | Phase::Done => Vec::new(),
            Phase::Followup => {
                self.turns.push(Turn {
                    role: Role::User,
                    content: answer,
                });
                // The follow-up consumed no script slot of its own.
                self.advance()
            }
            Phase::Base => {
                self.turns.push(Turn {
                    role: Role::User,
                    content: answer.clone(),
                });

                if let Some(question) = self.script.get(self.question_index).cloned() {
                    if self.wants_followup(&answer) {
                        self.phase = Phase::Followup;
                        return vec![Effect::RequestFollowup { question, answer }];
                    }
                }

                self.advance()
            }
        }
    }

    fn on_followup_ready(&mut self, result: std::result::Result<String, String>) -> Vec<Effect> {
        if self.phase != Phase::Followup {
            return Vec::new();
        }

        let followup = match result {
            Ok(text) => text.trim().to_string(),
            Err(message) => {
                // Degrade to the script rather than surfacing a hard error.
                let mut effects = vec![Effect::Diagnostic(message)];
                effects.extend(self.advance());
                return effects;
            }
        };

        if followup.is_empty() {
            let mut effects = vec![Effect::Diagnostic(
                "Follow-up service returned empty text.".to_string(),
            )];
            effects.extend(self.advance());
            return effects;
        }

        self.followups_used += 1;
        vec![self.say(followup)]
    }

    fn on_closing_ready(&mut self, result: std::result::Result<String, String>) -> Vec<Effect> {
        if self.phase != Phase::Closing {
            return Vec::new();
        }
        self.phase = Phase::Done;

        let closing = match result {
            Ok(text) => text.trim().to_string(),
            Err(message) => {
                return vec![
                    Effect::Diagnostic(message),
                    self.say(FALLBACK_CLOSING.to_string()),
                ];
            }
        };

        if closing.is_empty() {
            return vec![
                Effect::Diagnostic("Closing service returned empty text.".to_string()),
                self.say(FALLBACK_CLOSING.to_string()),
            ];
        }

        vec![self.say(closing)]
    }

    /// Move to the next scripted question, or into closing when the script
    /// is exhausted.
    fn advance(&mut self) -> Vec<Effect> {
        let next = self.question_index + 1;
        if next >= self.script.len() {
            return self.enter_closing();
        }

        self.question_index = next;
        self.phase = Phase::Base;
        let question = self.script[next].clone();
        vec![self.say(question)]
    }

    fn enter_closing(&mut self) -> Vec<Effect> {
        self.phase = Phase::Closing;
        vec![Effect::RequestClosing {
            transcript: self.transcript_text(),
        }]
    }

    fn wants_followup(&self, answer: &str) -> bool {
        if self.followups_used >= MAX_FOLLOWUPS {
            return false;
        }
        // Keep the total interview near 6-8 questions: no follow-ups for
        // the last two scripted slots.
        if self.question_index >= self.script.len().saturating_sub(2) {
            return false;
        }

        if word_count(answer) < 10 {
            return false;
        }

        let lowered = answer.to_lowercase();
        if lowered.contains("i don't know") || lowered.contains("not sure") {
            return false;
        }

        true
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
