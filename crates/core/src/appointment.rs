//! Appointment booking against an append-only CSV log

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::error::{Result, TriageError};
use crate::knowledge::read_rows;
use crate::random::Randomness;
use crate::session::SessionState;

/// Column order of the appointment log
pub const LOG_COLUMNS: [&str; 8] = [
    "ID",
    "Name",
    "Time",
    "Date",
    "Illness",
    "Doctor",
    "Title",
    "Description",
];

/// First and last bookable hour of the day
const FIRST_SLOT_HOUR: u32 = 8;
const LAST_SLOT_HOUR: u32 = 20;

/// Clinic doctor, read from reference data
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Doctor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Specialty", default)]
    pub specialty: Option<String>,
}

/// Load the doctor list from a CSV file with at least a `Name` column
pub fn load_doctors(path: &Path) -> Result<Vec<Doctor>> {
    let doctors: Vec<Doctor> = read_rows(path)?;
    tracing::info!(count = doctors.len(), "Doctors loaded");
    Ok(doctors)
}

/// A booked appointment, one row of the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Illness")]
    pub illness: String,
    #[serde(rename = "Doctor")]
    pub doctor: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
}

/// Load previously booked appointments; a missing file means none
pub fn load_appointments(path: &Path) -> Result<Vec<Appointment>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "No existing appointment list");
        return Ok(Vec::new());
    }
    read_rows(path)
}

/// Append-only appointment log file
#[derive(Debug)]
pub struct AppointmentLog {
    path: PathBuf,
    // Serializes appends within this process
    lock: Mutex<()>,
}

impl AppointmentLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first if the file is empty
    pub fn append(&self, appointment: &Appointment) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TriageError::io(&self.path, e))?;
        let is_empty = file
            .metadata()
            .map_err(|e| TriageError::io(&self.path, e))?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer
                .write_record(LOG_COLUMNS)
                .map_err(|e| TriageError::csv(&self.path, e))?;
        }
        writer
            .serialize(appointment)
            .map_err(|e| TriageError::csv(&self.path, e))?;
        writer.flush().map_err(|e| TriageError::io(&self.path, e))?;
        Ok(())
    }
}

/// Result of a booking request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    Booked(Appointment),
    /// Name, condition or time not available yet
    MissingDetails,
    /// Time not in HH:MM form
    InvalidTime { name: String },
    /// Requested time is not later than now
    TimeInPast { name: String },
}

impl BookingOutcome {
    /// User-facing reply text
    pub fn message(&self) -> String {
        match self {
            BookingOutcome::Booked(appointment) => format!(
                "Great news, {}! Your appointment has been booked successfully!\n\
                 Appointment ID: {}\n\
                 Doctor: {}\n\
                 Date: {}\n\
                 Time: {}\n\
                 Please arrive at the clinic a few minutes before your appointment time.",
                appointment.name,
                appointment.id,
                appointment.doctor,
                appointment.date,
                appointment.time
            ),
            BookingOutcome::MissingDetails => "I'm sorry, but I'm missing some information. Could you please provide all the necessary details for booking an appointment?".to_string(),
            BookingOutcome::InvalidTime { name } => format!(
                "I'm sorry {name}, but I couldn't read that time. Please provide it in HH:MM format."
            ),
            BookingOutcome::TimeInPast { name } => format!(
                "I'm sorry {name}, but the requested time has already passed. Please choose a future time for your appointment."
            ),
        }
    }
}

/// Parse an `HH:MM` time
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// Slot nearest to `preferred`; ties go to the earlier slot
pub fn closest_slot(preferred: NaiveTime, slots: &[String]) -> Option<String> {
    let preferred_minutes = minutes_of_day(preferred);
    slots
        .iter()
        .filter_map(|slot| parse_time(slot).map(|time| (slot, minutes_of_day(time))))
        .min_by_key(|(_, minutes)| (preferred_minutes - minutes).abs())
        .map(|(slot, _)| slot.clone())
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn minutes_of_day(time: NaiveTime) -> i64 {
    i64::from(time.hour() * 60 + time.minute())
}

/// Books appointments with the first listed doctor.
///
/// Slot availability is exposed for callers to display but does not
/// constrain booking; double-booking is possible.
pub struct AppointmentService {
    doctors: Vec<Doctor>,
    booked: Mutex<Vec<Appointment>>,
    log: AppointmentLog,
    clock: Arc<dyn Clock>,
    random: Arc<dyn Randomness>,
}

impl AppointmentService {
    pub fn new(
        doctors: Vec<Doctor>,
        existing: Vec<Appointment>,
        log: AppointmentLog,
        clock: Arc<dyn Clock>,
        random: Arc<dyn Randomness>,
    ) -> Self {
        Self {
            doctors,
            booked: Mutex::new(existing),
            log,
            clock,
            random,
        }
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date()
    }

    /// Book an appointment for the session's recorded name and condition
    pub fn book(&self, state: &SessionState, preferred_time: Option<&str>) -> Result<BookingOutcome> {
        let (Some(name), Some(illness), Some(requested)) = (
            present(state.name.as_deref()),
            present(state.condition.as_deref()),
            present(preferred_time),
        ) else {
            return Ok(BookingOutcome::MissingDetails);
        };

        let Some(time) = parse_time(requested) else {
            return Ok(BookingOutcome::InvalidTime {
                name: name.to_string(),
            });
        };

        let now = self.clock.now();
        let date = now.date();
        if date.and_time(time) <= now {
            return Ok(BookingOutcome::TimeInPast {
                name: name.to_string(),
            });
        }

        let doctor = self.doctors.first().ok_or(TriageError::NoDoctors)?;

        let appointment = Appointment {
            id: format!("APPT-{}", self.random.four_digits()),
            name: name.to_string(),
            time: time.format("%H:%M").to_string(),
            date: date.format("%Y-%m-%d").to_string(),
            illness: illness.to_string(),
            doctor: doctor.name.clone(),
            title: format!("Appointment for {illness}"),
            description: format!("Consultation for {illness} symptoms"),
        };

        self.log.append(&appointment)?;
        self.booked
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(appointment.clone());

        tracing::info!(
            appointment_id = %appointment.id,
            doctor = %appointment.doctor,
            date = %appointment.date,
            time = %appointment.time,
            "Appointment booked"
        );

        Ok(BookingOutcome::Booked(appointment))
    }

    /// Hourly slots on `date` not taken by a known appointment
    pub fn available_slots(&self, date: NaiveDate) -> Vec<String> {
        let date = date.format("%Y-%m-%d").to_string();
        let booked = self.booked.lock().unwrap_or_else(|e| e.into_inner());
        (FIRST_SLOT_HOUR..=LAST_SLOT_HOUR)
            .map(|hour| format!("{hour:02}:00"))
            .filter(|slot| {
                !booked
                    .iter()
                    .any(|apt| apt.date == date && apt.time == *slot)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::random::SeededRandomness;
    use crate::session::Stage;
    use chrono::NaiveDateTime;
    use std::io::Write;

    fn at(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
    }

    fn doctors() -> Vec<Doctor> {
        vec![
            Doctor {
                name: "Dr. Patel".to_string(),
                specialty: None,
            },
            Doctor {
                name: "Dr. Okafor".to_string(),
                specialty: Some("ENT".to_string()),
            },
        ]
    }

    fn service(dir: &tempfile::TempDir, now: &str, doctors: Vec<Doctor>) -> AppointmentService {
        AppointmentService::new(
            doctors,
            Vec::new(),
            AppointmentLog::new(dir.path().join("appointments.csv")),
            Arc::new(FixedClock(at(now))),
            Arc::new(SeededRandomness::new(3)),
        )
    }

    fn diagnosed() -> SessionState {
        SessionState {
            name: Some("Sam".to_string()),
            stage: Stage::AskTime,
            condition: Some("Flu".to_string()),
            duration: Some(6),
            symptoms: vec!["fever".to_string()],
        }
    }

    fn log_lines(dir: &tempfile::TempDir) -> Vec<String> {
        std::fs::read_to_string(dir.path().join("appointments.csv"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn future_time_books_with_first_doctor() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 14:00", doctors());

        let outcome = service.book(&diagnosed(), Some("15:30")).unwrap();

        let BookingOutcome::Booked(appointment) = &outcome else {
            panic!("expected booking, got {outcome:?}");
        };
        assert!(appointment.id.starts_with("APPT-"));
        assert_eq!(appointment.id.len(), 9);
        assert_eq!(appointment.doctor, "Dr. Patel");
        assert_eq!(appointment.date, "2026-10-19");
        assert_eq!(appointment.time, "15:30");
        assert_eq!(appointment.title, "Appointment for Flu");
        assert!(outcome.message().contains(&appointment.id));

        let lines = log_lines(&dir);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LOG_COLUMNS.join(","));
        assert!(lines[1].starts_with(&appointment.id));
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 09:00", doctors());

        service.book(&diagnosed(), Some("10:00")).unwrap();
        service.book(&diagnosed(), Some("11:00")).unwrap();

        let lines = log_lines(&dir);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("ID,")).count(), 1);
    }

    #[test]
    fn past_time_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 14:00", doctors());

        let outcome = service.book(&diagnosed(), Some("08:00")).unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::TimeInPast {
                name: "Sam".to_string()
            }
        );
        assert!(outcome.message().contains("already passed"));

        // Equal to now is not in the future either
        let outcome = service.book(&diagnosed(), Some("14:00")).unwrap();
        assert!(matches!(outcome, BookingOutcome::TimeInPast { .. }));

        assert!(log_lines(&dir).is_empty());
    }

    #[test]
    fn missing_details_and_bad_time() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 14:00", doctors());

        assert_eq!(
            service.book(&SessionState::new(), Some("15:00")).unwrap(),
            BookingOutcome::MissingDetails
        );
        assert_eq!(
            service.book(&diagnosed(), None).unwrap(),
            BookingOutcome::MissingDetails
        );
        assert_eq!(
            service.book(&diagnosed(), Some("  ")).unwrap(),
            BookingOutcome::MissingDetails
        );
        assert!(matches!(
            service.book(&diagnosed(), Some("half past three")).unwrap(),
            BookingOutcome::InvalidTime { .. }
        ));
        assert!(log_lines(&dir).is_empty());
    }

    #[test]
    fn no_doctors_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 14:00", Vec::new());

        let err = service.book(&diagnosed(), Some("16:00")).unwrap_err();
        assert!(matches!(err, TriageError::NoDoctors));
        assert!(log_lines(&dir).is_empty());
    }

    #[test]
    fn booked_times_leave_available_slots() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, "2026-10-19 07:00", doctors());
        let today = service.today();

        let all = service.available_slots(today);
        assert_eq!(all.len(), 13);
        assert_eq!(all.first().map(String::as_str), Some("08:00"));
        assert_eq!(all.last().map(String::as_str), Some("20:00"));

        service.book(&diagnosed(), Some("09:00")).unwrap();
        let remaining = service.available_slots(today);
        assert_eq!(remaining.len(), 12);
        assert!(!remaining.contains(&"09:00".to_string()));

        let tomorrow = today.succ_opt().unwrap();
        assert_eq!(service.available_slots(tomorrow).len(), 13);
    }

    #[test]
    fn closest_slot_prefers_earlier_on_tie() {
        let slots: Vec<String> = ["08:00", "10:00", "12:00"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let nine = parse_time("09:00").unwrap();
        let eleven_twenty = parse_time("11:20").unwrap();

        assert_eq!(closest_slot(nine, &slots).as_deref(), Some("08:00"));
        assert_eq!(closest_slot(eleven_twenty, &slots).as_deref(), Some("12:00"));
        assert_eq!(closest_slot(nine, &[]), None);
    }

    #[test]
    fn loads_reference_csvs() {
        let mut doctors_csv = tempfile::NamedTempFile::new().unwrap();
        writeln!(doctors_csv, "Name,Specialty,Phone\nDr. Patel,General,555\nDr. Lee,,556").unwrap();
        let doctors = load_doctors(doctors_csv.path()).unwrap();
        assert_eq!(doctors.len(), 2);
        assert_eq!(doctors[0].name, "Dr. Patel");
        assert_eq!(doctors[0].specialty.as_deref(), Some("General"));

        let mut appointments_csv = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            appointments_csv,
            "{}\nAPPT-1234,Ana,10:00,2026-10-20,Flu,Dr. Patel,Appointment for Flu,Consultation for Flu symptoms",
            LOG_COLUMNS.join(",")
        )
        .unwrap();
        let existing = load_appointments(appointments_csv.path()).unwrap();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].id, "APPT-1234");

        assert!(load_appointments(Path::new("/nonexistent/appointments.csv"))
            .unwrap()
            .is_empty());
    }
}
