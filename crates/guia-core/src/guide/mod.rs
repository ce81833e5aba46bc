//! Guide field location.
//!
//! Two strategies share one interface: regex patterns over cleaned text, and
//! spatial proximity over positioned OCR words.

mod regex_locator;
pub mod rules;
mod spatial;
mod text;

pub use regex_locator::RegexLocator;
pub use spatial::{find_label, find_value_near_label, LabelBox, LabelRule, SpatialLocator};
pub use text::{clean_text, collapse_whitespace, excise_decoy, normalize_value};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::config::ExtractionConfig;
use crate::models::record::{Field, FieldValues};
use crate::ocr::{OcrMode, PageText};

/// Which locator a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Patterns over plain text.
    #[default]
    Regex,
    /// Label geometry over structured OCR words.
    Spatial,
}

impl std::fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionStrategy::Regex => write!(f, "regex"),
            ExtractionStrategy::Spatial => write!(f, "spatial"),
        }
    }
}

/// Locates the four guide fields in acquired page text.
pub trait FieldLocator: Send + Sync {
    /// OCR output mode this locator consumes.
    fn mode(&self) -> OcrMode;

    /// Locate fields on one page.
    fn locate(&self, page: &PageText) -> FieldValues;

    /// Locate fields across pages; later pages only fill fields still missing.
    fn locate_pages(&self, pages: &[PageText]) -> FieldValues {
        let mut values = FieldValues::not_found();
        for page in pages {
            fill_missing(&mut values, self.locate(page));
            if values.found_count() == Field::ALL.len() {
                break;
            }
        }
        values
    }
}

/// Copy fields found in `other` into `values` where `values` has none.
pub fn fill_missing(values: &mut FieldValues, other: FieldValues) {
    for field in Field::ALL {
        if !values.get(field).is_found() && other.get(field).is_found() {
            values.set(field, other.get(field).clone());
        }
    }
}

/// Build the locator selected by `config`.
pub fn build_locator(config: &ExtractionConfig) -> Result<Box<dyn FieldLocator>> {
    match config.strategy {
        ExtractionStrategy::Regex => Ok(Box::new(RegexLocator::from_config(&config.patterns)?)),
        ExtractionStrategy::Spatial => {
            let mut locator = SpatialLocator::from_config(&config.spatial)?;
            if config.spatial_regex_fallback {
                locator = locator.with_regex_fallback(RegexLocator::from_config(&config.patterns)?);
            }
            Ok(Box::new(locator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldValue;
    use crate::ocr::RecognizedWord;

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut values = FieldValues::not_found();
        values.registry_id = FieldValue::found("419010");

        let mut later = FieldValues::not_found();
        later.registry_id = FieldValue::found("999999");
        later.guide_number = FieldValue::found("123");
        fill_missing(&mut values, later);

        assert_eq!(values.registry_id, FieldValue::found("419010"));
        assert_eq!(values.guide_number, FieldValue::found("123"));
    }

    #[test]
    fn test_build_locator_modes() {
        let mut config = ExtractionConfig::default();
        assert_eq!(build_locator(&config).unwrap().mode(), OcrMode::PlainText);

        config.strategy = ExtractionStrategy::Spatial;
        assert_eq!(build_locator(&config).unwrap().mode(), OcrMode::Structured);
    }

    #[test]
    fn test_spatial_pages_merge() {
        let page1 = PageText::Words(vec![
            RecognizedWord::new("Registro", 40, 100, 90, 20),
            RecognizedWord::new("ANS", 135, 100, 40, 20),
            RecognizedWord::new("419010", 200, 100, 80, 20),
        ]);
        let page2 = PageText::Words(vec![
            RecognizedWord::new("Nome", 40, 100, 60, 20),
            RecognizedWord::new("ANA", 120, 100, 50, 20),
        ]);

        let values = SpatialLocator::new().locate_pages(&[page1, page2]);
        assert_eq!(values.registry_id, FieldValue::found("419010"));
        assert_eq!(values.beneficiary_name, FieldValue::found("ANA"));
    }

    #[test]
    fn test_bad_label_pattern_is_config_error() {
        let mut config = ExtractionConfig::default();
        config.strategy = ExtractionStrategy::Spatial;
        config.spatial.registry_id_label = "(".to_string();
        assert!(build_locator(&config).is_err());
    }
}
