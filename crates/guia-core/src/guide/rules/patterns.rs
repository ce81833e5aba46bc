//! Regex patterns for SP/SADT authorization guides.

use lazy_static::lazy_static;
use regex::Regex;

/// Guide number, most specific first. A split number keeps at most one
/// short trailing group so the next field's value is never absorbed.
pub const GUIDE_NUMBER_PATTERNS: &[&str] = &[
    // label, digits, then the next numbered field
    r"(?:\bN[º°o]?\.?\s*(?:da\s*)?Guia|N[úu]mero\s*(?:da\s*)?Guia|Guia\s*Principal|Guia\s*Atribu[íi]d[oa]\s*pela\s*Operadora)(?:\s*(?:no|do)\s*Prestador)?\s*:?\s*(\d{4,}(?:\s\d{1,4})?)\s+\d{1,3}\s*-",
    r"(?:\bN[º°o]?\.?\s*(?:da\s*)?Guia|N[úu]mero\s*(?:da\s*)?Guia|Guia\s*Principal|Guia\s*Atribu[íi]d[oa]\s*pela\s*Operadora)(?:\s*(?:no|do)\s*Prestador)?\s*:?\s*(\d{4,}(?:\s\d{1,4}\b)?)",
    r"\bGuia\s*:?\s*(\d{5,})",
];

/// ANS registry (six digits).
pub const REGISTRY_ID_PATTERNS: &[&str] = &[
    r"Registro\s*(?:da\s*)?ANS\s*:?\s*(\d{6})\b",
    r"Registro\s*(?:da\s*)?ANS\s*:?\s*(\d{3}\s\d{3})\b",
    r"\bANS\s*:?\s*(\d{6})\b",
];

/// Authorization date (`DD/MM/YYYY`).
pub const AUTHORIZATION_DATE_PATTERNS: &[&str] = &[
    r"Data\s*(?:da|de)?\s*Autoriza[çc][ãa]o\s*:?\s*(\d{2}/\d{2}/\d{4})",
    r"Data\s*(?:da|de)?\s*Autoriza[çc][ãa]o\s*:?\s*(\d{2}\s*/\s*\d{2}\s*/\s*\d{4})",
    r"Autoriza[çc][ãa]o\s*:?\s*(\d{2}\s*/\s*\d{2}\s*/\s*\d{4})",
];

/// Beneficiary name: uppercase letters up to the next numbered field.
pub const BENEFICIARY_NAME_PATTERNS: &[&str] = &[
    r"\bNome\s*(?:do\s*Benefici[áa]rio)?\s*:?\s*(?-i:([A-ZÀ-Ý][A-ZÀ-Ý ]*?))\s*\d{1,3}\s*-",
    r"\bBenefici[áa]rio\s*:?\s*(?-i:([A-ZÀ-Ý][A-ZÀ-Ý ]*?))\s*\d{1,3}\s*-",
    r"\b(?:Nome(?:\s*do\s*Benefici[áa]rio)?|Benefici[áa]rio)\s*:?\s*(?-i:([A-ZÀ-Ý][A-ZÀ-Ý\-]+(?:\s+[A-ZÀ-Ý][A-ZÀ-Ý\-]*)*))(?:\s|$)",
];

/// Replaces the excised decoy field.
pub const DECOY_PLACEHOLDER: &str = "###";

lazy_static! {
    // Start of a numbered form field, e.g. "10 -"
    pub static ref FIELD_BOUNDARY: Regex = Regex::new(
        r"\b\d{1,3}\s*-"
    ).unwrap();

    // "Nome Social" decoy label
    pub static ref DECOY_LABEL: Regex = Regex::new(
        r"(?i)\bnome\s*social\b"
    ).unwrap();

    // Names of other parties on the form ("Nome do Contratado", ...)
    pub static ref OTHER_NAME_LABEL: Regex = Regex::new(
        r"(?i)\bnome(\s+d[oa]\s+(?:contratad|profissional|solicitante|executante))"
    ).unwrap();

    pub static ref NAME_LABEL: Regex = Regex::new(
        r"(?i)\b(?:nome|benefici[áa]rio)\b"
    ).unwrap();

    // OCR artifacts from table borders and checkboxes
    pub static ref STRAY_SYMBOLS: Regex = Regex::new(
        r"[*\[\]|]"
    ).unwrap();

    pub static ref WHITESPACE: Regex = Regex::new(
        r"\s+"
    ).unwrap();

    // Tail of a name that ran into the next numbered field
    pub static ref TRAILING_FIELD: Regex = Regex::new(
        r"\s+\d{1,3}\s*-.*$"
    ).unwrap();

    pub static ref TRAILING_NON_LETTERS: Regex = Regex::new(
        r"[^\p{L}]+$"
    ).unwrap();
}
