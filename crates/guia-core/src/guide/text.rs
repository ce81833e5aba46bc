//! Text normalization ahead of pattern matching.

use super::rules::{
    DECOY_LABEL, DECOY_PLACEHOLDER, FIELD_BOUNDARY, NAME_LABEL, OTHER_NAME_LABEL, STRAY_SYMBOLS,
    TRAILING_FIELD, TRAILING_NON_LETTERS, WHITESPACE,
};
use crate::models::record::Field;

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Flatten line breaks, drop OCR border artifacts and collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let flattened = text.replace(['\r', '\n'], " ");
    let stripped = STRAY_SYMBOLS.replace_all(&flattened, "");
    collapse_whitespace(&stripped)
}

/// Remove every "Nome Social" label together with its value.
///
/// The value runs until the next numbered field or the next name label,
/// whichever comes first. A label with neither after it is removed alone.
pub fn excise_decoy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(label) = DECOY_LABEL.find(rest) {
        out.push_str(&rest[..label.start()]);
        out.push_str(DECOY_PLACEHOLDER);
        out.push(' ');

        let after = &rest[label.end()..];
        let value_end = [FIELD_BOUNDARY.find(after), NAME_LABEL.find(after)]
            .into_iter()
            .flatten()
            .map(|m| m.start())
            .min();

        rest = match value_end {
            Some(end) => &after[end..],
            None => after,
        };
    }

    out.push_str(rest);
    collapse_whitespace(&out)
}

/// Blank out the "Nome" of other parties' name labels so only the
/// beneficiary's label still reads as a name label. Their values stay.
pub fn excise_other_names(text: &str) -> String {
    OTHER_NAME_LABEL
        .replace_all(text, format!("{}$1", DECOY_PLACEHOLDER).as_str())
        .into_owned()
}

/// Per-field cleanup of a captured value.
pub fn normalize_value(field: Field, raw: &str) -> String {
    let value = collapse_whitespace(raw);
    match field {
        Field::GuideNumber | Field::RegistryId | Field::AuthorizationDate => {
            value.split_whitespace().collect()
        }
        Field::BeneficiaryName => {
            let value = TRAILING_FIELD.replace(&value, "");
            let value = TRAILING_NON_LETTERS.replace(&value, "");
            value.trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_text() {
        let raw = "1 - Registro ANS\n| 419010 *\r\n2 - [Número]   Guia";
        assert_eq!(clean_text(raw), "1 - Registro ANS 419010 2 - Número Guia");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let once = clean_text("  a |  b\n\n c* ");
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_excise_other_names_keeps_values() {
        let text = "10 - Nome ANA 14 - NOME DO CONTRATADO HOSPITAL 17 - Nome do Profissional X";
        let excised = excise_other_names(text);
        assert_eq!(
            excised,
            "10 - Nome ANA 14 - ### DO CONTRATADO HOSPITAL 17 - ### do Profissional X"
        );
        assert_eq!(excise_other_names(&excised), excised);
    }

    #[test]
    fn test_excise_decoy_up_to_next_field() {
        let text = "9 - Nome Social JOAO DA SILVA 10 - Nome MATHEUS BOIKO 11 - Data";
        assert_eq!(excise_decoy(text), "9 - ### 10 - Nome MATHEUS BOIKO 11 - Data");
    }

    #[test]
    fn test_excise_decoy_stops_at_name_label() {
        let text = "NOME SOCIAL X Nome MATHEUS 11 -";
        assert_eq!(excise_decoy(text), "### Nome MATHEUS 11 -");
    }

    #[test]
    fn test_excise_bare_decoy_label() {
        assert_eq!(excise_decoy("campo nome social"), "campo ###");
        assert_eq!(excise_decoy("sem rótulo"), "sem rótulo");
    }

    #[test]
    fn test_normalize_values() {
        assert_eq!(normalize_value(Field::GuideNumber, "1745 6856"), "17456856");
        assert_eq!(normalize_value(Field::AuthorizationDate, "12 / 05 /2024"), "12/05/2024");
        assert_eq!(
            normalize_value(Field::BeneficiaryName, "MATHEUS  PEREIRA BOIKO 11 - DATA"),
            "MATHEUS PEREIRA BOIKO"
        );
        assert_eq!(normalize_value(Field::BeneficiaryName, "ANA LIMA -"), "ANA LIMA");
    }
}
