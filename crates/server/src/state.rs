//! Shared application state handed to every handler

use std::sync::Arc;

use triage_core::{
    AppointmentLog, AppointmentService, Clock, ConditionTreatmentIndex, Engine, InMemorySessionStore,
    KnowledgeBase, Randomness, SessionStore, SymptomConditionIndex, SymptomMatcher, SystemClock,
    ThreadRandomness, TokenOverlapMatcher, TriageError, load_appointments, load_doctors,
};

use crate::accounts::AccountRegistry;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub sessions: Arc<dyn SessionStore>,
    pub appointments: Arc<AppointmentService>,
    pub accounts: Arc<AccountRegistry>,
}

impl AppState {
    pub fn new(
        engine: Engine,
        sessions: Arc<dyn SessionStore>,
        appointments: AppointmentService,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions,
            appointments: Arc::new(appointments),
            accounts: Arc::new(AccountRegistry::new()),
        }
    }

    /// Load reference data from the configured files and wire up the
    /// default in-memory store, thread RNG and system clock
    pub fn load(config: &Config) -> Result<Self, TriageError> {
        let knowledge = KnowledgeBase::new(
            SymptomConditionIndex::load(&config.symptoms_csv)?,
            ConditionTreatmentIndex::load(&config.treatments_csv)?,
        );
        tracing::info!(
            symptoms = knowledge.symptoms.len(),
            conditions = knowledge.treatments.len(),
            "Reference tables loaded"
        );

        let doctors = load_doctors(&config.doctors_csv)?;
        let existing = load_appointments(&config.appointments_csv)?;

        let matcher: Arc<dyn SymptomMatcher> = if config.ignore_stopwords {
            Arc::new(TokenOverlapMatcher::with_stopwords())
        } else {
            Arc::new(TokenOverlapMatcher::new())
        };
        let random: Arc<dyn Randomness> = Arc::new(ThreadRandomness);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let engine = Engine::new(Arc::new(knowledge), matcher, random.clone());
        let log = AppointmentLog::new(&config.appointment_log);
        tracing::info!(path = %log.path().display(), "Appointment log");
        let appointments = AppointmentService::new(doctors, existing, log, clock, random);

        Ok(Self::new(
            engine,
            Arc::new(InMemorySessionStore::new()),
            appointments,
        ))
    }
}
