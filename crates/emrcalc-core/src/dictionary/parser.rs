//! Dictionary parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::{ConceptLookup, NO, PREGNANCY_STATUS, YES};
use crate::types::ConceptId;

/// Errors that can occur when loading or querying a dictionary.
#[derive(Error, Debug)]
pub enum DictionaryError {
    #[error("Unknown concept: {0}")]
    UnknownConcept(String),

    #[error("Failed to read dictionary file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Dictionary validation failed: {0}")]
    ValidationError(String),
}

/// Vocabulary name to concept mapping.
///
/// ```yaml
/// concepts:
///   YES: "1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
///   PREGNANCY_STATUS: "5272AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dictionary {
    /// Registered concepts (BTreeMap for deterministic iteration)
    #[serde(default)]
    pub concepts: BTreeMap<String, ConceptId>,
}

impl Default for Dictionary {
    /// CIEL concept identities used by KenyaEMR.
    fn default() -> Self {
        let mut concepts = BTreeMap::new();
        concepts.insert(NO.to_string(), ConceptId::new("1066AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        concepts.insert(
            PREGNANCY_STATUS.to_string(),
            ConceptId::new("5272AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"),
        );
        concepts.insert(YES.to_string(), ConceptId::new("1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"));
        Self { concepts }
    }
}

impl Dictionary {
    /// An empty dictionary.
    pub fn empty() -> Self {
        Self {
            concepts: BTreeMap::new(),
        }
    }

    /// Register (or replace) a concept.
    pub fn with_concept(mut self, name: impl Into<String>, concept: ConceptId) -> Self {
        self.concepts.insert(name.into(), concept);
        self
    }

    /// Parse a dictionary from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, DictionaryError> {
        let dictionary: Dictionary = serde_yaml::from_str(yaml)?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Parse a dictionary from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, DictionaryError> {
        let dictionary: Dictionary = serde_json::from_str(json)?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    /// Parse a dictionary from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a dictionary from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Reject blank names and blank concept identities.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        for (name, concept) in &self.concepts {
            if name.trim().is_empty() {
                return Err(DictionaryError::ValidationError(
                    "Concept name must not be empty".to_string(),
                ));
            }
            if concept.as_str().trim().is_empty() {
                return Err(DictionaryError::ValidationError(format!(
                    "Concept {} has an empty identifier",
                    name
                )));
            }
        }
        Ok(())
    }
}

impl ConceptLookup for Dictionary {
    fn concept(&self, name: &str) -> Result<ConceptId, DictionaryError> {
        self.concepts
            .get(name)
            .cloned()
            .ok_or_else(|| DictionaryError::UnknownConcept(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dictionary_resolves_vocabulary() {
        let dictionary = Dictionary::default();
        assert_eq!(
            dictionary.concept(YES).unwrap().as_str(),
            "1065AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        );
        assert_eq!(
            dictionary.concept(PREGNANCY_STATUS).unwrap().as_str(),
            "5272AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
        );
    }

    #[test]
    fn test_unknown_concept() {
        let result = Dictionary::empty().concept(YES);
        assert!(matches!(result, Err(DictionaryError::UnknownConcept(name)) if name == YES));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
concepts:
  YES: "yes-uuid"
  PREGNANCY_STATUS: "pregnancy-uuid"
"#;
        let dictionary = Dictionary::from_yaml(yaml).unwrap();
        assert_eq!(dictionary.concepts.len(), 2);
        assert_eq!(dictionary.concept(YES).unwrap(), ConceptId::new("yes-uuid"));
        assert!(dictionary.concept(NO).is_err());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"concepts": {"YES": "y", "NO": "n"}}"#;
        let dictionary = Dictionary::from_json(json).unwrap();
        assert_eq!(dictionary.concept(NO).unwrap(), ConceptId::new("n"));
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let yaml = r#"
concepts:
  YES: ""
"#;
        let result = Dictionary::from_yaml(yaml);
        assert!(matches!(result, Err(DictionaryError::ValidationError(_))));
    }

    #[test]
    fn test_with_concept_overrides_default() {
        let dictionary = Dictionary::default().with_concept(YES, ConceptId::new("local-yes"));
        assert_eq!(dictionary.concept(YES).unwrap(), ConceptId::new("local-yes"));
    }
}
