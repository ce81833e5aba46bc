//! Field location by geometric proximity to a label.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use super::regex_locator::RegexLocator;
use super::text::normalize_value;
use super::FieldLocator;
use crate::error::{GuiaError, Result};
use crate::models::config::SpatialConfig;
use crate::models::record::{Field, FieldValue, FieldValues};
use crate::ocr::{OcrMode, PageText, RecognizedWord};

lazy_static! {
    static ref DEFAULT_RULES: Vec<LabelRule> = SpatialConfig::default()
        .rules()
        .unwrap();
}

/// How to find one field's label and how far its value may sit.
#[derive(Debug, Clone)]
pub struct LabelRule {
    pub field: Field,
    /// Matched against a run of words joined by single spaces.
    pub label: Regex,
    /// A label immediately followed by a word matching this is skipped.
    pub reject_next: Option<Regex>,
    /// Maximum horizontal distance (px) from the label's right edge.
    pub max_distance: f32,
}

impl LabelRule {
    pub fn new(field: Field, label: &str, max_distance: f32) -> Result<Self> {
        Ok(Self {
            field,
            label: compile(field, label)?,
            reject_next: None,
            max_distance,
        })
    }

    pub fn with_reject_next(mut self, pattern: &str) -> Result<Self> {
        self.reject_next = Some(compile(self.field, pattern)?);
        Ok(self)
    }
}

fn compile(field: Field, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| GuiaError::Config(format!("{} label '{}': {}", field, pattern, e)))
}

impl SpatialConfig {
    /// Compile the label rules for all four fields.
    pub fn rules(&self) -> Result<Vec<LabelRule>> {
        Ok(vec![
            LabelRule::new(Field::GuideNumber, &self.guide_number_label, self.guide_number_distance)?,
            LabelRule::new(Field::RegistryId, &self.registry_id_label, self.registry_id_distance)?,
            LabelRule::new(
                Field::AuthorizationDate,
                &self.authorization_date_label,
                self.authorization_date_distance,
            )?,
            LabelRule::new(
                Field::BeneficiaryName,
                &self.beneficiary_name_label,
                self.beneficiary_name_distance,
            )?
            .with_reject_next(&self.beneficiary_name_reject_next)?,
        ])
    }
}

/// Union box of a label's words.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelBox {
    pub right: f32,
    pub center_y: f32,
    pub height: f32,
}

impl LabelBox {
    pub fn of(words: &[RecognizedWord]) -> Option<Self> {
        let top = words.iter().map(|w| w.top as f32).reduce(f32::min)?;
        let bottom = words.iter().map(RecognizedWord::bottom).reduce(f32::max)?;
        let right = words.iter().map(RecognizedWord::right).reduce(f32::max)?;
        Some(Self {
            right,
            center_y: (top + bottom) / 2.0,
            height: bottom - top,
        })
    }

    /// Whether a word starts inside the search rectangle to the right.
    pub fn contains(&self, word: &RecognizedWord, max_distance: f32) -> bool {
        let left = word.left as f32;
        (word.center_y() - self.center_y).abs() <= self.height
            && left >= self.right
            && left <= self.right + max_distance
    }
}

/// Index range of the first run of up to `max_words` words matching the
/// rule's label. Longer runs win at the same start index.
pub fn find_label(words: &[RecognizedWord], rule: &LabelRule, max_words: usize) -> Option<Range<usize>> {
    for start in 0..words.len() {
        let longest = max_words.min(words.len() - start);
        for len in (1..=longest).rev() {
            let run = start..start + len;
            let joined = words[run.clone()]
                .iter()
                .map(|w| w.text.trim())
                .collect::<Vec<_>>()
                .join(" ");

            if !rule.label.is_match(&joined) {
                continue;
            }

            let rejected = match (&rule.reject_next, words.get(run.end)) {
                (Some(reject), Some(next)) => reject.is_match(next.text.trim()),
                _ => false,
            };
            if rejected {
                trace!("{} label '{}' rejected by following word", rule.field, joined);
                continue;
            }

            return Some(run);
        }
    }
    None
}

/// Words inside the label's search rectangle, left to right, joined by single
/// spaces. Label words never count as values.
pub fn find_value_near_label(
    words: &[RecognizedWord],
    label: Range<usize>,
    max_distance: f32,
) -> Option<String> {
    let label_box = LabelBox::of(&words[label.clone()])?;

    let mut hits: Vec<&RecognizedWord> = words
        .iter()
        .enumerate()
        .filter(|(i, _)| !label.contains(i))
        .map(|(_, w)| w)
        .filter(|w| label_box.contains(w, max_distance))
        .collect();

    if hits.is_empty() {
        return None;
    }

    hits.sort_by_key(|w| w.left);
    Some(hits.iter().map(|w| w.text.trim()).collect::<Vec<_>>().join(" "))
}

/// Spatial strategy over structured OCR words.
#[derive(Debug, Clone)]
pub struct SpatialLocator {
    rules: Vec<LabelRule>,
    max_label_words: usize,
    fallback: Option<RegexLocator>,
}

impl SpatialLocator {
    /// Locator with the built-in labels and distances, no regex fallback.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
            max_label_words: 4,
            fallback: None,
        }
    }

    pub fn from_config(config: &SpatialConfig) -> Result<Self> {
        Ok(Self {
            rules: config.rules()?,
            max_label_words: config.max_label_words.max(1),
            fallback: None,
        })
    }

    /// Fill fields the geometry misses by running `locator` over the words as text.
    pub fn with_regex_fallback(mut self, locator: RegexLocator) -> Self {
        self.fallback = Some(locator);
        self
    }

    /// Locate one field by geometry alone.
    pub fn locate_field(&self, field: Field, words: &[RecognizedWord]) -> FieldValue {
        let Some(rule) = self.rules.iter().find(|r| r.field == field) else {
            return FieldValue::NotFound;
        };

        let value = find_label(words, rule, self.max_label_words)
            .and_then(|label| find_value_near_label(words, label, rule.max_distance));

        match value.map(|v| normalize_value(field, &v)) {
            Some(value) if !value.is_empty() => FieldValue::found(value),
            _ => FieldValue::NotFound,
        }
    }

    /// Locate all four fields by geometry alone.
    pub fn locate_words(&self, words: &[RecognizedWord]) -> FieldValues {
        let mut values = FieldValues::not_found();
        for field in Field::ALL {
            values.set(field, self.locate_field(field, words));
        }
        values
    }
}

impl Default for SpatialLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldLocator for SpatialLocator {
    fn mode(&self) -> OcrMode {
        OcrMode::Structured
    }

    fn locate(&self, page: &PageText) -> FieldValues {
        let words = match page {
            PageText::Words(words) => words,
            // Embedded PDF text carries no geometry
            PageText::Plain(text) => {
                return match &self.fallback {
                    Some(fallback) => fallback.locate_text(text),
                    None => RegexLocator::new().locate_text(text),
                };
            }
        };

        let mut values = self.locate_words(words);
        let spatial_found = values.found_count();

        if let Some(fallback) = &self.fallback {
            if spatial_found < Field::ALL.len() {
                let prepared = fallback.prepare(&page.to_text());
                for field in Field::ALL {
                    if !values.get(field).is_found() {
                        values.set(field, fallback.locate_field(field, &prepared));
                    }
                }
            }
        }

        debug!(
            "Spatial locator found {}/4 fields ({} after fallback)",
            spatial_found,
            values.found_count()
        );
        values
    }
}
