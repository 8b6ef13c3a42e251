//! Appointment booking and slot lookup endpoints

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use triage_core::{BookingOutcome, TriageError, closest_slot, parse_time};

use super::chat::{ChatResponse, default_session_id};
use crate::error::AppError;
use crate::state::AppState;

pub const BOOKING_APOLOGY: &str = "I apologize, but an error occurred while booking your appointment. Please try again or contact our support team for assistance.";

/// Request body for booking
#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    #[serde(default = "default_session_id")]
    session_id: String,
    #[serde(default)]
    preferred_time: Option<String>,
}

/// Query parameters for slot lookup
#[derive(Debug, Deserialize, Default)]
pub struct SlotQuery {
    pub date: Option<String>,
    pub preferred_time: Option<String>,
}

/// Response body for slot lookup
#[derive(Debug, Serialize, Deserialize)]
pub struct SlotsResponse {
    pub date: String,
    pub slots: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest: Option<String>,
}

/// POST /book_appointment - Book using the session's name and condition
pub async fn book_appointment(
    State(state): State<AppState>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Json<ChatResponse> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::error!(error = %rejection, "Unreadable booking request");
            return apology();
        }
    };

    match book(&state, &body).await {
        Ok(outcome) => {
            if let BookingOutcome::Booked(_) = &outcome {
                metrics::counter!("appointments_booked_total").increment(1);
            }
            Json(ChatResponse {
                response: outcome.message(),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, session_id = %body.session_id, "Booking failed");
            apology()
        }
    }
}

async fn book(state: &AppState, body: &BookingRequest) -> Result<BookingOutcome, TriageError> {
    let session = state.sessions.get(&body.session_id).await?;
    state
        .appointments
        .book(&session, body.preferred_time.as_deref())
}

/// GET /available_slots - Free hourly slots for a date (default today)
pub async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<SlotsResponse>, AppError> {
    let date = match query.date.as_deref() {
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("Invalid date '{value}', expected YYYY-MM-DD")))?,
        None => state.appointments.today(),
    };

    let preferred = query
        .preferred_time
        .as_deref()
        .map(|value| {
            parse_time(value)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid time '{value}', expected HH:MM")))
        })
        .transpose()?;

    let slots = state.appointments.available_slots(date);
    let closest = preferred.and_then(|time| closest_slot(time, &slots));

    Ok(Json(SlotsResponse {
        date: date.format("%Y-%m-%d").to_string(),
        slots,
        closest,
    }))
}

fn apology() -> Json<ChatResponse> {
    Json(ChatResponse {
        response: BOOKING_APOLOGY.to_string(),
    })
}
