//! Field location by ordered regex patterns over cleaned text.

use lazy_static::lazy_static;
use tracing::{debug, trace};

use super::rules::{first_match, CompiledPatterns, PatternConfig};
use super::text::{clean_text, excise_decoy, excise_other_names, normalize_value};
use super::FieldLocator;
use crate::error::Result;
use crate::models::record::{Field, FieldValue, FieldValues};
use crate::ocr::{OcrMode, PageText};

lazy_static! {
    static ref DEFAULT_PATTERNS: CompiledPatterns =
        CompiledPatterns::compile(&PatternConfig::default()).unwrap();
}

/// Regex strategy: first matching pattern per field wins.
#[derive(Debug, Clone)]
pub struct RegexLocator {
    patterns: CompiledPatterns,
}

impl RegexLocator {
    /// Locator using the built-in SP/SADT patterns.
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    pub fn from_config(config: &PatternConfig) -> Result<Self> {
        Ok(Self {
            patterns: CompiledPatterns::compile(config)?,
        })
    }

    /// Clean the text, remove the decoy field and blank out other parties'
    /// name labels.
    pub fn prepare(&self, text: &str) -> String {
        excise_other_names(&excise_decoy(&clean_text(text)))
    }

    /// Locate one field in already prepared text.
    pub fn locate_field(&self, field: Field, prepared: &str) -> FieldValue {
        match first_match(self.patterns.for_field(field), prepared) {
            Some(found) => {
                trace!("{} matched pattern #{}: {:?}", field, found.pattern_index, found.value);
                FieldValue::found(normalize_value(field, &found.value))
            }
            None => FieldValue::NotFound,
        }
    }

    /// Locate all four fields in raw text.
    pub fn locate_text(&self, text: &str) -> FieldValues {
        let prepared = self.prepare(text);
        let mut values = FieldValues::not_found();
        for field in Field::ALL {
            values.set(field, self.locate_field(field, &prepared));
        }
        debug!("Regex locator found {}/4 fields", values.found_count());
        values
    }
}

impl Default for RegexLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldLocator for RegexLocator {
    fn mode(&self) -> OcrMode {
        OcrMode::PlainText
    }

    fn locate(&self, page: &PageText) -> FieldValues {
        self.locate_text(&page.to_text())
    }

    /// Pages are concatenated so a field split across pages still matches.
    fn locate_pages(&self, pages: &[PageText]) -> FieldValues {
        let text = pages.iter().map(PageText::to_text).collect::<Vec<_>>().join("\n");
        self.locate_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "1 - Registro ANS 419010 2 - Número Guia 17456856 3 - Data de Autorização 12/05/2024 10 - Nome MATHEUS PEREIRA BOIKO 11 - Data Nascimento";

    fn values(guide: &str, registry: &str, date: &str, name: &str) -> FieldValues {
        FieldValues {
            guide_number: FieldValue::found(guide),
            registry_id: FieldValue::found(registry),
            authorization_date: FieldValue::found(date),
            beneficiary_name: FieldValue::found(name),
        }
    }

    #[test]
    fn test_end_to_end_sample() {
        let result = RegexLocator::new().locate_text(SAMPLE);
        assert_eq!(result, values("17456856", "419010", "12/05/2024", "MATHEUS PEREIRA BOIKO"));
    }

    #[test]
    fn test_clean_synthetic_labels() {
        let text = "Registro ANS: 123456\nNº da Guia: 2024000111 5 - Senha 999\nData da Autorização: 01/02/2024\nNome do Beneficiário: ANA MARIA SOUZA 12 - Cartão";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result, values("2024000111", "123456", "01/02/2024", "ANA MARIA SOUZA"));
    }

    #[test]
    fn test_decoy_before_real_name() {
        let text = "9 - Nome Social JOAO DECOY 10 - Nome MATHEUS PEREIRA BOIKO 11 - Data Nascimento";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.beneficiary_name, FieldValue::found("MATHEUS PEREIRA BOIKO"));
    }

    #[test]
    fn test_empty_decoy_before_real_name() {
        let text = "9 - Nome Social 10 - Nome CARLA DIAS 11 - Data";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.beneficiary_name, FieldValue::found("CARLA DIAS"));
    }

    #[test]
    fn test_ocr_noise() {
        let text = "1 - |Registro ANS| 419 010\n2 - N° Guia no Prestador 1745 6856 3 - Data de Autorizacao 12 /05/ 2024 *";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.registry_id, FieldValue::found("419010"));
        assert_eq!(result.guide_number, FieldValue::found("17456856"));
        assert_eq!(result.authorization_date, FieldValue::found("12/05/2024"));
        assert_eq!(result.beneficiary_name, FieldValue::NotFound);
    }

    #[test]
    fn test_split_guide_number_stops_at_next_value() {
        let text = "2 - Nº Guia no Prestador 17456856 419010";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.guide_number, FieldValue::found("17456856"));

        let text = "2 - Nº Guia no Prestador 17456856 419010 3 - Data";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.guide_number, FieldValue::found("17456856"));
    }

    #[test]
    fn test_name_without_numbered_field_after() {
        let text = "10 - Nome MATHEUS PEREIRA BOIKO Data Nascimento 01/01/1990";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.beneficiary_name, FieldValue::found("MATHEUS PEREIRA BOIKO"));

        let result = RegexLocator::new().locate_text("Nome: ANA CLARA SOUZA");
        assert_eq!(result.beneficiary_name, FieldValue::found("ANA CLARA SOUZA"));
    }

    #[test]
    fn test_other_party_names_are_not_the_beneficiary() {
        let text = "10 - Nome 11 - Cartão 14 - NOME DO CONTRATADO HOSPITAL CENTRAL 15 - x";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.beneficiary_name, FieldValue::NotFound);

        let text = "10 - Nome JOANA LIMA 11 - Cartão 14 - Nome do Profissional PEDRO ALVES 15 - x";
        let result = RegexLocator::new().locate_text(text);
        assert_eq!(result.beneficiary_name, FieldValue::found("JOANA LIMA"));
    }

    #[test]
    fn test_nothing_found() {
        let result = RegexLocator::new().locate_text("texto qualquer sem campos");
        assert_eq!(result, FieldValues::not_found());
    }

    #[test]
    fn test_locator_is_idempotent() {
        let locator = RegexLocator::new();
        assert_eq!(locator.locate_text(SAMPLE), locator.locate_text(SAMPLE));

        let prepared = locator.prepare(SAMPLE);
        assert_eq!(locator.locate_text(&prepared), locator.locate_text(SAMPLE));
    }

    #[test]
    fn test_pages_are_joined() {
        let pages = vec![
            PageText::Plain("1 - Registro ANS 419010".to_string()),
            PageText::Plain("3 - Data de Autorização 12/05/2024".to_string()),
        ];
        let result = RegexLocator::new().locate_pages(&pages);
        assert_eq!(result.registry_id, FieldValue::found("419010"));
        assert_eq!(result.authorization_date, FieldValue::found("12/05/2024"));
    }

    #[test]
    fn test_custom_patterns() {
        let mut config = PatternConfig::default();
        config.registry_id = vec![r"Operadora\s*(\d{6})".to_string()];
        let locator = RegexLocator::from_config(&config).unwrap();

        let result = locator.locate_text("Operadora 654321 Registro ANS 419010");
        assert_eq!(result.registry_id, FieldValue::found("654321"));
    }
}
