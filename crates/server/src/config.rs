//! Server configuration

use std::path::PathBuf;

const DEFAULT_PORT: &str = "5000";
const DEFAULT_RATE_LIMIT_RPS: u32 = 100;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub symptoms_csv: PathBuf,
    pub treatments_csv: PathBuf,
    pub doctors_csv: PathBuf,
    pub appointments_csv: PathBuf,
    /// Append-only log new bookings are written to
    pub appointment_log: PathBuf,
    pub api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_rps: u32,
    /// Use the stopword-filtering symptom matcher
    pub ignore_stopwords: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key → value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| "data".into()));
        let data_file = |key: &str, file: &str| {
            lookup(key)
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join(file))
        };

        let bind_address = lookup("BIND_ADDRESS").unwrap_or_else(|| {
            let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.into());
            format!("0.0.0.0:{port}")
        });

        Self {
            bind_address,
            symptoms_csv: data_file("SYMPTOMS_CSV", "symptoms_conditions.csv"),
            treatments_csv: data_file("TREATMENTS_CSV", "conditions_treatments.csv"),
            doctors_csv: data_file("DOCTORS_CSV", "doctors.csv"),
            appointments_csv: data_file("APPOINTMENTS_CSV", "appointments.csv"),
            appointment_log: lookup("APPOINTMENT_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("appointments.csv")),
            api_key: lookup("API_KEY").filter(|key| !key.is_empty()),
            cors_origins: lookup("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .filter(|origins: &Vec<String>| !origins.is_empty())
                .unwrap_or_else(|| vec!["*".to_string()]),
            rate_limit_rps: lookup("RATE_LIMIT_RPS")
                .and_then(|v| v.parse().ok())
                .filter(|rps| *rps > 0)
                .unwrap_or(DEFAULT_RATE_LIMIT_RPS),
            ignore_stopwords: lookup("MATCHER_STOPWORDS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true"))
                .unwrap_or(false),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
