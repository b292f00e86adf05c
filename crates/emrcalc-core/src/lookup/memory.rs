//! In-memory patient data, loadable from YAML/JSON datasets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::{CohortDateLookup, CohortObservationLookup, LookupError};
use crate::types::{CalculationContext, Cohort, ConceptId, Obs, PatientId};

/// Errors that can occur when loading a patient dataset.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Failed to read dataset file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Dataset validation failed: {0}")]
    ValidationError(String),
}

/// Serialized form of a patient dataset.
///
/// ```yaml
/// patients:
///   - id: 1
///     art_start_date: 2020-03-10
///     observations:
///       - concept: "5272AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
///         obs_datetime: 2020-03-10T08:30:00Z
///         value_coded: "1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PatientDataset {
    #[serde(default)]
    pub patients: Vec<PatientRecord>,
}

/// One patient in a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,

    /// Date antiretroviral therapy was initiated, if it has been
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_start_date: Option<NaiveDate>,

    /// Observations in any order
    #[serde(default)]
    pub observations: Vec<Obs>,
}

/// Patient data held in memory.
///
/// Implements both cohort lookups. Observations are kept sorted ascending
/// per patient, and results are limited to what was recorded as of the
/// context's `now`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPatientData {
    patients: BTreeSet<PatientId>,
    art_start_dates: BTreeMap<PatientId, NaiveDate>,
    observations: BTreeMap<PatientId, Vec<Obs>>,
}

impl InMemoryPatientData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a patient with no data.
    pub fn with_patient(mut self, patient: PatientId) -> Self {
        self.patients.insert(patient);
        self
    }

    /// Record the ART start date of a patient.
    pub fn with_art_start(mut self, patient: PatientId, date: NaiveDate) -> Self {
        self.patients.insert(patient);
        self.art_start_dates.insert(patient, date);
        self
    }

    /// Record an observation for a patient, keeping the patient's list ordered.
    ///
    /// Observations with equal timestamps keep insertion order.
    pub fn with_obs(mut self, patient: PatientId, obs: Obs) -> Self {
        self.patients.insert(patient);
        let list = self.observations.entry(patient).or_default();
        let at = list.partition_point(|o| o.obs_datetime <= obs.obs_datetime);
        list.insert(at, obs);
        self
    }

    /// Every patient known to this data set.
    pub fn patients(&self) -> Cohort {
        self.patients.clone()
    }

    /// Total number of stored observations.
    pub fn observation_count(&self) -> usize {
        self.observations.values().map(Vec::len).sum()
    }

    /// Number of patients with an ART start date.
    pub fn art_start_count(&self) -> usize {
        self.art_start_dates.len()
    }

    /// Build from a parsed dataset, rejecting duplicate patient ids.
    pub fn from_dataset(dataset: PatientDataset) -> Result<Self, DatasetError> {
        let mut data = Self::new();
        for record in dataset.patients {
            if data.patients.contains(&record.id) {
                return Err(DatasetError::ValidationError(format!(
                    "Duplicate patient id: {}",
                    record.id
                )));
            }
            data = data.with_patient(record.id);
            if let Some(date) = record.art_start_date {
                data = data.with_art_start(record.id, date);
            }
            for obs in record.observations {
                data = data.with_obs(record.id, obs);
            }
        }
        Ok(data)
    }

    /// Parse a dataset from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DatasetError> {
        let dataset: PatientDataset = serde_yaml::from_str(yaml)?;
        Self::from_dataset(dataset)
    }

    /// Parse a dataset from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DatasetError> {
        let dataset: PatientDataset = serde_json::from_str(json)?;
        Self::from_dataset(dataset)
    }

    /// Parse a dataset from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a dataset from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}

impl CohortDateLookup for InMemoryPatientData {
    fn initial_art_start_dates(
        &self,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<BTreeMap<PatientId, NaiveDate>, LookupError> {
        let as_of = context.now.date_naive();
        Ok(cohort
            .iter()
            .filter_map(|patient| {
                self.art_start_dates
                    .get(patient)
                    .filter(|date| **date <= as_of)
                    .map(|date| (*patient, *date))
            })
            .collect())
    }
}

impl CohortObservationLookup for InMemoryPatientData {
    fn all_obs(
        &self,
        concept: &ConceptId,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<BTreeMap<PatientId, Vec<Obs>>, LookupError> {
        let mut result = BTreeMap::new();
        for patient in cohort.iter().filter(|p| self.patients.contains(p)) {
            let list: Vec<Obs> = self
                .observations
                .get(patient)
                .map(|all| {
                    all.iter()
                        .take_while(|obs| obs.obs_datetime <= context.now)
                        .filter(|obs| &obs.concept == concept)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            result.insert(*patient, list);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn status() -> ConceptId {
        ConceptId::new("status")
    }

    fn obs(y: i32, m: u32, d: u32, value: &str) -> Obs {
        Obs::coded(
            status(),
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
            ConceptId::new(value),
        )
    }

    fn context(y: i32, m: u32, d: u32) -> CalculationContext {
        CalculationContext::at(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
    }

    fn cohort(ids: &[u32]) -> Cohort {
        ids.iter().copied().map(PatientId).collect()
    }

    #[test]
    fn test_observations_kept_sorted() {
        let data = InMemoryPatientData::new()
            .with_obs(PatientId(1), obs(2020, 4, 1, "c"))
            .with_obs(PatientId(1), obs(2020, 1, 1, "a"))
            .with_obs(PatientId(1), obs(2020, 3, 10, "b"));

        let result = data
            .all_obs(&status(), &cohort(&[1]), &context(2021, 1, 1))
            .unwrap();
        let values: Vec<&str> = result[&PatientId(1)]
            .iter()
            .map(|o| o.value_coded.as_ref().unwrap().as_str())
            .collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_all_obs_filters_concept_cohort_and_as_of() {
        let other = Obs::coded(
            ConceptId::new("weight"),
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            ConceptId::new("x"),
        );
        let data = InMemoryPatientData::new()
            .with_obs(PatientId(1), obs(2020, 1, 1, "a"))
            .with_obs(PatientId(1), other)
            .with_obs(PatientId(1), obs(2020, 6, 1, "late"))
            .with_obs(PatientId(2), obs(2020, 1, 1, "b"));

        let result = data
            .all_obs(&status(), &cohort(&[1, 3]), &context(2020, 5, 1))
            .unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[&PatientId(1)].len(), 1);
        assert!(!result.contains_key(&PatientId(2)));
        assert!(!result.contains_key(&PatientId(3)));
    }

    #[test]
    fn test_known_patient_without_obs_gets_empty_list() {
        let data = InMemoryPatientData::new().with_patient(PatientId(7));
        let result = data
            .all_obs(&status(), &cohort(&[7]), &context(2020, 1, 1))
            .unwrap();
        assert_eq!(result.get(&PatientId(7)), Some(&Vec::new()));
    }

    #[test]
    fn test_art_start_dates_respect_as_of() {
        let data = InMemoryPatientData::new()
            .with_art_start(PatientId(1), NaiveDate::from_ymd_opt(2020, 3, 10).unwrap())
            .with_art_start(PatientId(2), NaiveDate::from_ymd_opt(2020, 6, 1).unwrap());

        let dates = data
            .initial_art_start_dates(&cohort(&[1, 2]), &context(2020, 3, 10))
            .unwrap();
        assert_eq!(dates.len(), 1);
        assert!(dates.contains_key(&PatientId(1)));
    }

    #[test]
    fn test_parse_yaml_dataset() {
        let yaml = r#"
patients:
  - id: 1
    art_start_date: 2020-03-10
    observations:
      - concept: status
        obs_datetime: 2020-04-01T00:00:00Z
        value_coded: "no"
      - concept: status
        obs_datetime: 2020-01-01T00:00:00Z
        value_coded: "yes"
  - id: 2
"#;
        let data = InMemoryPatientData::from_yaml(yaml).unwrap();
        assert_eq!(data.patients(), cohort(&[1, 2]));
        assert_eq!(data.observation_count(), 2);
        assert_eq!(data.art_start_count(), 1);

        let result = data
            .all_obs(&status(), &cohort(&[1]), &context(2021, 1, 1))
            .unwrap();
        assert!(result[&PatientId(1)][0].has_value_coded(&ConceptId::new("yes")));
    }

    #[test]
    fn test_duplicate_patient_rejected() {
        let json = r#"{"patients": [{"id": 1}, {"id": 1}]}"#;
        let result = InMemoryPatientData::from_json(json);
        assert!(matches!(result, Err(DatasetError::ValidationError(_))));
    }
}
