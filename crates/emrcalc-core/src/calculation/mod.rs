//! Patient calculations.
//!
//! A calculation turns a cohort into one result per patient. Calculations
//! hold references to their data collaborators and have no state of their
//! own, so evaluating twice with the same inputs yields the same map.

mod pregnant_at_art_start;

pub use pregnant_at_art_start::{find_last_on_or_before, PregnantAtArtStartCalculation};

use crate::types::{CalculationContext, CalculationResultMap, Cohort};
use crate::CalculationError;

/// Trait implemented by all calculations.
pub trait PatientCalculation {
    /// Stable identifier, recorded on every result this calculation produces.
    fn name(&self) -> &'static str;

    /// The clinical question this calculation answers.
    fn description(&self) -> &'static str;

    /// Evaluate the calculation for every patient in `cohort`.
    ///
    /// # Returns
    ///
    /// A map whose key set equals `cohort`. Collaborator failures are
    /// returned as errors; missing patient data is not an error.
    fn evaluate(
        &self,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<CalculationResultMap, CalculationError>;
}
