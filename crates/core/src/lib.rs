//! triage-core: rule-based symptom triage
//!
//! This crate holds everything that is independent of HTTP: the reference
//! lookup tables, the symptom matcher, per-session conversation state, the
//! stage state machine and appointment booking.

pub mod appointment;
pub mod clock;
pub mod engine;
pub mod error;
pub mod knowledge;
pub mod matcher;
pub mod random;
pub mod session;

pub use appointment::{
    Appointment, AppointmentLog, AppointmentService, BookingOutcome, Doctor, closest_slot,
    load_appointments, load_doctors, parse_time,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::Engine;
pub use error::{Result, TriageError};
pub use knowledge::{ConditionTreatmentIndex, KnowledgeBase, SymptomConditionIndex};
pub use matcher::{SymptomMatcher, TokenOverlapMatcher};
pub use random::{Randomness, SeededRandomness, ThreadRandomness};
pub use session::{DEFAULT_SESSION_ID, InMemorySessionStore, SessionState, SessionStore, Stage};
