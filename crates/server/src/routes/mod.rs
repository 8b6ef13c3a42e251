pub mod accounts;
pub mod booking;
pub mod chat;
pub mod health;
pub mod metrics;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Chat and booking routes
pub fn triage_routes() -> Router<AppState> {
    Router::new()
        .route("/chatbot", post(chat::chatbot))
        .route("/book_appointment", post(booking::book_appointment))
        .route("/available_slots", get(booking::available_slots))
}

/// Signup, login and logout
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .route("/logout", post(accounts::logout))
}
