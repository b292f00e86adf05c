//! Core types for emrcalc calculations.
//!
//! These types are the data structures passed between the host platform,
//! the collaborator lookups, and the calculations themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier of a patient in the host record system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PatientId(pub u32);

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PatientId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identity of a concept in the host concept dictionary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ConceptId(pub String);

impl ConceptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of patients a calculation is evaluated over.
///
/// Ordered so that iteration (and therefore logging and output) is deterministic.
pub type Cohort = BTreeSet<PatientId>;

/// A single coded clinical observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Obs {
    /// The question concept this observation answers (e.g. pregnancy status)
    pub concept: ConceptId,

    /// When the observation was recorded
    pub obs_datetime: DateTime<Utc>,

    /// Coded answer, if the observation has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_coded: Option<ConceptId>,
}

impl Obs {
    /// Create a coded observation.
    pub fn coded(concept: ConceptId, obs_datetime: DateTime<Utc>, value: ConceptId) -> Self {
        Self {
            concept,
            obs_datetime,
            value_coded: Some(value),
        }
    }

    /// Whether the coded answer is the given concept.
    pub fn has_value_coded(&self, value: &ConceptId) -> bool {
        self.value_coded.as_ref() == Some(value)
    }
}

/// Evaluation-time context supplied by the host.
///
/// Calculations pass it through to their collaborators untouched; the
/// collaborators use `now` as the "as of" point for the data they return.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationContext {
    /// The moment the calculation is evaluated as of
    pub now: DateTime<Utc>,
}

impl CalculationContext {
    /// Context evaluated as of the current system time.
    pub fn now() -> Self {
        Self { now: Utc::now() }
    }

    /// Context evaluated as of an explicit moment, for reproducible results.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }
}

/// Boolean outcome of a calculation for one patient.
///
/// "Unknown because data is missing" and "definitively false" share the
/// `false` value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculationResult {
    /// The calculated value
    pub value: bool,

    /// Name of the calculation that produced this result
    pub calculation: String,
}

impl CalculationResult {
    pub fn new(value: bool, calculation: impl Into<String>) -> Self {
        Self {
            value,
            calculation: calculation.into(),
        }
    }
}

/// One result per patient in the evaluated cohort.
pub type CalculationResultMap = BTreeMap<PatientId, CalculationResult>;
