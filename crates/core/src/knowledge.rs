//! Static symptom → condition → treatment lookup tables

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Result, TriageError};

/// Treatment text used when a condition has no treatment rows
pub const FALLBACK_TREATMENT: &str = "Consult a healthcare professional";

#[derive(Debug, Deserialize)]
struct SymptomRow {
    #[serde(rename = "Symptom")]
    symptom: String,
    #[serde(rename = "Condition")]
    condition: String,
}

#[derive(Debug, Deserialize)]
struct TreatmentRow {
    #[serde(rename = "Condition")]
    condition: String,
    #[serde(rename = "Treatment")]
    treatment: String,
}

/// Symptom → conditions, keyed in sorted order.
///
/// Each condition list keeps table order and may repeat a condition when the
/// table does.
#[derive(Debug, Clone, Default)]
pub struct SymptomConditionIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl SymptomConditionIndex {
    /// Group `(symptom, condition)` pairs by symptom
    pub fn from_pairs<I, S, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let mut entries: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (symptom, condition) in pairs {
            entries
                .entry(symptom.into())
                .or_default()
                .push(condition.into());
        }
        Self { entries }
    }

    /// Load from a CSV file with `Symptom` and `Condition` columns
    pub fn load(path: &Path) -> Result<Self> {
        let rows: Vec<SymptomRow> = read_rows(path)?;
        Ok(Self::from_pairs(
            rows.into_iter().map(|row| (row.symptom, row.condition)),
        ))
    }

    pub fn symptoms(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn conditions_for(&self, symptom: &str) -> &[String] {
        self.entries.get(symptom).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Condition → treatments, in table order
#[derive(Debug, Clone, Default)]
pub struct ConditionTreatmentIndex {
    entries: HashMap<String, Vec<String>>,
}

impl ConditionTreatmentIndex {
    pub fn from_pairs<I, C, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, T)>,
        C: Into<String>,
        T: Into<String>,
    {
        let mut entries: HashMap<String, Vec<String>> = HashMap::new();
        for (condition, treatment) in pairs {
            entries
                .entry(condition.into())
                .or_default()
                .push(treatment.into());
        }
        Self { entries }
    }

    /// Load from a CSV file with `Condition` and `Treatment` columns
    pub fn load(path: &Path) -> Result<Self> {
        let rows: Vec<TreatmentRow> = read_rows(path)?;
        Ok(Self::from_pairs(
            rows.into_iter().map(|row| (row.condition, row.treatment)),
        ))
    }

    /// Treatments for a condition, or the single fallback entry
    pub fn treatments_for(&self, condition: &str) -> Vec<String> {
        match self.entries.get(condition) {
            Some(treatments) if !treatments.is_empty() => treatments.clone(),
            _ => vec![FALLBACK_TREATMENT.to_string()],
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Both lookup tables, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    pub symptoms: SymptomConditionIndex,
    pub treatments: ConditionTreatmentIndex,
}

impl KnowledgeBase {
    pub fn new(symptoms: SymptomConditionIndex, treatments: ConditionTreatmentIndex) -> Self {
        Self {
            symptoms,
            treatments,
        }
    }
}

/// Read a file as text, decoding it as Latin-1 when it is not valid UTF-8
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| TriageError::io(path, e))?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::debug!(path = %path.display(), "Decoding non-UTF-8 file as Latin-1");
            err.into_bytes().into_iter().map(char::from).collect()
        }
    })
}

/// Deserialize every row of a headed CSV file
pub(crate) fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let text = read_text(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, _>>()
        .map_err(|e| TriageError::csv(path, e))
}
