//! # emrcalc-core
//!
//! Deterministic patient calculations over cohort-scoped clinical data.
//!
//! This crate provides the calculation that answers:
//! - Was this patient pregnant on the date they started antiretroviral therapy?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same cohort, context and data always produce the same map
//! 2. **Complete**: Every patient in the cohort receives exactly one result
//! 3. **Batched**: Each data collaborator is queried once per evaluation, never per patient
//! 4. **Side-effect free**: Nothing is persisted or mutated
//!
//! ## Example
//!
//! ```rust,ignore
//! use emrcalc_core::{evaluate_pregnant_at_art_start, Dictionary, InMemoryPatientData};
//!
//! let data = InMemoryPatientData::from_yaml_file("patients.yaml")?;
//! let results = evaluate_pregnant_at_art_start(&Dictionary::default(), &data, &data.patients())?;
//!
//! for (patient, result) in &results {
//!     println!("{}: {}", patient, result.value);
//! }
//! ```

pub mod calculation;
pub mod dates;
pub mod dictionary;
pub mod lookup;
pub mod types;

// Re-export main types at crate root
pub use calculation::{find_last_on_or_before, PatientCalculation, PregnantAtArtStartCalculation};
pub use dictionary::{ConceptLookup, Dictionary, DictionaryError};
pub use lookup::{
    CohortDateLookup, CohortObservationLookup, DatasetError, InMemoryPatientData, LookupError,
    PatientDataset, PatientRecord,
};
pub use types::{
    CalculationContext, CalculationResult, CalculationResultMap, Cohort, ConceptId, Obs,
    PatientId,
};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during a calculation.
///
/// Missing patient data is never an error; these only surface failures of
/// the collaborators a calculation depends on.
#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Evaluate pregnancy at ART start for a cohort, as of the current time.
///
/// For reproducible results use [`evaluate_pregnant_at_art_start_at`].
pub fn evaluate_pregnant_at_art_start<S>(
    dictionary: &dyn ConceptLookup,
    source: &S,
    cohort: &Cohort,
) -> Result<CalculationResultMap, CalculationError>
where
    S: CohortDateLookup + CohortObservationLookup,
{
    evaluate_pregnant_at_art_start_at(dictionary, source, cohort, Utc::now())
}

/// Evaluate pregnancy at ART start for a cohort as of an explicit moment.
///
/// This function is fully deterministic: same inputs always produce same output.
pub fn evaluate_pregnant_at_art_start_at<S>(
    dictionary: &dyn ConceptLookup,
    source: &S,
    cohort: &Cohort,
    evaluated_at: DateTime<Utc>,
) -> Result<CalculationResultMap, CalculationError>
where
    S: CohortDateLookup + CohortObservationLookup,
{
    let context = CalculationContext::at(evaluated_at);
    PregnantAtArtStartCalculation::new(dictionary, source, source).evaluate(cohort, &context)
}
