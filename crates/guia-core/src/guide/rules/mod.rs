//! Ordered, data-driven pattern lists per field.

pub mod patterns;

pub use patterns::*;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{GuiaError, Result};
use crate::models::record::Field;

/// Pattern strings per field, tried in order. Each must capture the value
/// in group 1. Matching is case-insensitive unless a pattern opts out with
/// `(?-i:...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub guide_number: Vec<String>,
    pub registry_id: Vec<String>,
    pub authorization_date: Vec<String>,
    pub beneficiary_name: Vec<String>,
}

fn owned(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            guide_number: owned(GUIDE_NUMBER_PATTERNS),
            registry_id: owned(REGISTRY_ID_PATTERNS),
            authorization_date: owned(AUTHORIZATION_DATE_PATTERNS),
            beneficiary_name: owned(BENEFICIARY_NAME_PATTERNS),
        }
    }
}

impl PatternConfig {
    pub fn for_field(&self, field: Field) -> &[String] {
        match field {
            Field::GuideNumber => &self.guide_number,
            Field::RegistryId => &self.registry_id,
            Field::AuthorizationDate => &self.authorization_date,
            Field::BeneficiaryName => &self.beneficiary_name,
        }
    }
}

/// Compiled pattern lists.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    guide_number: Vec<Regex>,
    registry_id: Vec<Regex>,
    authorization_date: Vec<Regex>,
    beneficiary_name: Vec<Regex>,
}

impl CompiledPatterns {
    pub fn compile(config: &PatternConfig) -> Result<Self> {
        Ok(Self {
            guide_number: compile_list(Field::GuideNumber, &config.guide_number)?,
            registry_id: compile_list(Field::RegistryId, &config.registry_id)?,
            authorization_date: compile_list(Field::AuthorizationDate, &config.authorization_date)?,
            beneficiary_name: compile_list(Field::BeneficiaryName, &config.beneficiary_name)?,
        })
    }

    pub fn for_field(&self, field: Field) -> &[Regex] {
        match field {
            Field::GuideNumber => &self.guide_number,
            Field::RegistryId => &self.registry_id,
            Field::AuthorizationDate => &self.authorization_date,
            Field::BeneficiaryName => &self.beneficiary_name,
        }
    }
}

fn compile_list(field: Field, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| GuiaError::Config(format!("{} pattern '{}': {}", field, pattern, e)))?;
            if regex.captures_len() < 2 {
                return Err(GuiaError::Config(format!(
                    "{} pattern '{}' has no capture group",
                    field, pattern
                )));
            }
            Ok(regex)
        })
        .collect()
}

/// A value captured by one of a field's patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch {
    /// Raw captured text.
    pub value: String,
    /// Index of the pattern that matched.
    pub pattern_index: usize,
    /// Byte span of the capture in the searched text.
    pub position: (usize, usize),
}

/// Try `patterns` in order; the first one whose group 1 matches wins.
pub fn first_match(patterns: &[Regex], text: &str) -> Option<ExtractionMatch> {
    patterns.iter().enumerate().find_map(|(index, regex)| {
        let group = regex.captures(text)?.get(1)?;
        Some(ExtractionMatch {
            value: group.as_str().to_string(),
            pattern_index: index,
            position: (group.start(), group.end()),
        })
    })
}
