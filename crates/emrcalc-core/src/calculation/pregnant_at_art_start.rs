//! Pregnant at ART start
//!
//! **Question**: Was the patient pregnant on the date they started ART?
//!
//! The answer comes from the latest pregnancy status observation recorded on
//! or before the ART start date. The whole start day counts.
//!
//! | Result | Condition |
//! |--------|-----------|
//! | `true` | Latest qualifying observation is coded YES |
//! | `false` | Latest qualifying observation has any other value, or none qualifies |
//! | `false` | No ART start date, or no pregnancy status observations |

use chrono::NaiveDate;

use super::PatientCalculation;
use crate::dates::start_of_next_day;
use crate::dictionary::{ConceptLookup, PREGNANCY_STATUS, YES};
use crate::lookup::{CohortDateLookup, CohortObservationLookup};
use crate::types::{CalculationContext, CalculationResult, CalculationResultMap, Cohort, Obs};
use crate::CalculationError;

/// Calculates whether a patient was pregnant on the date they started ART.
pub struct PregnantAtArtStartCalculation<'a> {
    dictionary: &'a dyn ConceptLookup,
    art_start_dates: &'a dyn CohortDateLookup,
    observations: &'a dyn CohortObservationLookup,
}

impl<'a> PregnantAtArtStartCalculation<'a> {
    pub const NAME: &'static str = "pregnant_at_art_start";

    pub fn new(
        dictionary: &'a dyn ConceptLookup,
        art_start_dates: &'a dyn CohortDateLookup,
        observations: &'a dyn CohortObservationLookup,
    ) -> Self {
        Self {
            dictionary,
            art_start_dates,
            observations,
        }
    }
}

impl PatientCalculation for PregnantAtArtStartCalculation<'_> {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Whether a patient was pregnant on the date they started ART"
    }

    fn evaluate(
        &self,
        cohort: &Cohort,
        context: &CalculationContext,
    ) -> Result<CalculationResultMap, CalculationError> {
        let yes = self.dictionary.concept(YES)?;
        let pregnancy_status = self.dictionary.concept(PREGNANCY_STATUS)?;

        // Both lookups cover the whole cohort; the loop below is purely in-memory
        let art_start_dates = self.art_start_dates.initial_art_start_dates(cohort, context)?;
        let pregnancy_obss = self.observations.all_obs(&pregnancy_status, cohort, context)?;

        let mut results = CalculationResultMap::new();
        for patient in cohort {
            let mut pregnant = false;

            if let (Some(art_start_date), Some(statuses)) =
                (art_start_dates.get(patient), pregnancy_obss.get(patient))
            {
                if let Some(last) = find_last_on_or_before(statuses, *art_start_date) {
                    pregnant = last.has_value_coded(&yes);
                }
            }

            results.insert(*patient, CalculationResult::new(pregnant, Self::NAME));
        }

        tracing::debug!(
            calculation = Self::NAME,
            cohort_size = cohort.len(),
            with_art_start = art_start_dates.len(),
            pregnant = results.values().filter(|r| r.value).count(),
            "Calculation complete"
        );

        Ok(results)
    }
}

/// Find the last observation made on or before the given day.
///
/// An observation qualifies if it is strictly before the first moment of
/// the following day.
///
/// # Preconditions
///
/// `obss` must be ordered ascending by `obs_datetime`. The scan stops at the
/// first observation past the day, so an unordered slice gives wrong
/// answers. Checked only in debug builds.
pub fn find_last_on_or_before(obss: &[Obs], on_or_before: NaiveDate) -> Option<&Obs> {
    debug_assert!(
        obss.windows(2).all(|w| w[0].obs_datetime <= w[1].obs_datetime),
        "observations must be ordered by obs_datetime"
    );

    let before = start_of_next_day(on_or_before);

    let mut result = None;
    for obs in obss {
        if obs.obs_datetime < before {
            result = Some(obs);
        } else {
            break;
        }
    }
    result
}
