//! Concept dictionary.
//!
//! Calculations refer to concepts by vocabulary name (`YES`,
//! `PREGNANCY_STATUS`) and resolve them to host concept identities through a
//! [`ConceptLookup`]. The bundled [`Dictionary`] is a YAML/JSON-backed map.

mod parser;

pub use parser::{Dictionary, DictionaryError};

use crate::types::ConceptId;

/// Answer concept: yes.
pub const YES: &str = "YES";

/// Answer concept: no.
pub const NO: &str = "NO";

/// Question concept: is the patient currently pregnant.
pub const PREGNANCY_STATUS: &str = "PREGNANCY_STATUS";

/// Resolves vocabulary names to concept identities.
pub trait ConceptLookup {
    /// Look up the concept registered under `name`.
    ///
    /// Fails with [`DictionaryError::UnknownConcept`] if nothing is registered.
    fn concept(&self, name: &str) -> Result<ConceptId, DictionaryError>;
}
