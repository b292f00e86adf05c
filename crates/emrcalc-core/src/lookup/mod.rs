//! Cohort-scoped data collaborators.
//!
//! Calculations never query patient data one patient at a time. Each lookup
//! here answers for a whole cohort in one call and the calculation joins the
//! results in memory.

mod memory;

pub use memory::{DatasetError, InMemoryPatientData, PatientDataset, PatientRecord};

use chrono::NaiveDate;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::types::{CalculationContext, Cohort, ConceptId, Obs, PatientId};

/// Errors raised by a collaborator while fetching cohort data.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Derives the date each patient initiated antiretroviral therapy.
pub trait CohortDateLookup {
    /// Start dates for the members of `cohort`.
    ///
    /// Patients with no known start date are absent from the returned map.
    fn initial_art_start_dates(
        &self,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<BTreeMap<PatientId, NaiveDate>, LookupError>;
}

/// Fetches every observation of a concept for a cohort.
pub trait CohortObservationLookup {
    /// Observations of `concept` for the members of `cohort`.
    ///
    /// Each patient's list is ordered ascending by `obs_datetime`. Patients
    /// the source knows nothing about may be absent or map to an empty list.
    fn all_obs(
        &self,
        concept: &ConceptId,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<BTreeMap<PatientId, Vec<Obs>>, LookupError>;
}
