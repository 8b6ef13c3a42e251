//! Chat endpoint driving the triage conversation

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::{Deserialize, Serialize};
use triage_core::{DEFAULT_SESSION_ID, SessionState, TriageError};

use crate::state::AppState;

pub const CHAT_APOLOGY: &str =
    "I apologize, but an error occurred. Please try again or contact support if the problem persists.";

pub(crate) fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

/// Request body for chat
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    message: String,
    #[serde(default = "default_session_id")]
    session_id: String,
}

/// Response body for chat and booking
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /chatbot - Advance the session's conversation by one message
///
/// Always answers 200; failures are logged and replaced by an apology, and the
/// stored session is left untouched.
pub async fn chatbot(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!(error = %rejection, "Unreadable chat request");
            return apology();
        }
    };

    match converse(&state, &body.session_id, &body.message).await {
        Ok(response) => Json(ChatResponse { response }),
        Err(e) => {
            tracing::error!(error = %e, session_id = %body.session_id, "Chat turn failed");
            apology()
        }
    }
}

async fn converse(state: &AppState, session_id: &str, message: &str) -> Result<String, TriageError> {
    let mut session = state.sessions.get(session_id).await?;
    let before = session.stage;

    let response = state.engine.respond(&mut session, message);
    let after = session.stage;

    if session == SessionState::default() {
        state.sessions.delete(session_id).await?;
    } else {
        state.sessions.put(session_id, session).await?;
    }

    tracing::debug!(
        session_id = %session_id,
        from = before.as_str(),
        to = after.as_str(),
        "Conversation turn"
    );
    metrics::counter!("chat_messages_total", "stage" => after.as_str()).increment(1);

    Ok(response)
}

fn apology() -> Json<ChatResponse> {
    Json(ChatResponse {
        response: CHAT_APOLOGY.to_string(),
    })
}
