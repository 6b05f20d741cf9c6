use once_cell::sync::Lazy;
use regex::Regex;

use crate::vocabulary::Vocabulary;

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").unwrap());
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,3}(\.[0-9]{3})*,[0-9]{2}$").unwrap());
static DEFAULT_VOCABULARY: Lazy<Vocabulary> = Lazy::new(Vocabulary::default);

/// Category of a single extracted text fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// `DD/MM/YYYY` shaped. Calendar validity is not checked here.
    Date,
    /// CPF (11 digits) or CNPJ (14 digits) with separators.
    DocumentNumber,
    /// Brazilian currency literal, e.g. `1.234,56`.
    Currency,
    /// Form labels, bare numbers, single characters.
    Noise,
    /// Anything that may be (part of) an employer name.
    NameCandidate,
}

fn is_date(token: &str) -> bool {
    DATE_RE.is_match(token)
}

fn is_document_number(token: &str) -> bool {
    let has_separator = token.contains(|c: char| matches!(c, '.' | '/' | '-'));
    let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
    has_separator && (digits == 11 || digits == 14)
}

fn is_currency(token: &str) -> bool {
    CURRENCY_RE.is_match(token)
}

/// Digits only once punctuation and spaces are dropped. Punctuation-only
/// tokens qualify too.
fn is_bare_number(token: &str) -> bool {
    token
        .chars()
        .filter(|c| c.is_alphanumeric())
        .all(|c| c.is_ascii_digit())
}

impl Vocabulary {
    pub fn classify(&self, token: &str) -> TokenClass {
        if is_date(token) {
            return TokenClass::Date;
        }
        if is_document_number(token) {
            return TokenClass::DocumentNumber;
        }
        if is_currency(token) {
            return TokenClass::Currency;
        }
        let upper = token.trim().to_uppercase();
        if upper.chars().count() < 2 || self.is_ignored_term(&upper) || is_bare_number(&upper) {
            return TokenClass::Noise;
        }
        TokenClass::NameCandidate
    }
}

/// Classify `token` against the built-in vocabulary.
pub fn classify(token: &str) -> TokenClass {
    DEFAULT_VOCABULARY.classify(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_examples() {
        assert_eq!(classify("15/08/2020"), TokenClass::Date);
        assert_eq!(classify("123.456.789-00"), TokenClass::DocumentNumber);
        assert_eq!(classify("1.250,00"), TokenClass::Currency);
        assert_eq!(classify("BANCO DO BRASIL"), TokenClass::NameCandidate);
        assert_eq!(classify("NASCIMENTO"), TokenClass::Noise);
    }

    #[test]
    fn test_classify_dates() {
        // shape only, the calendar check happens in dates::parse_date
        assert_eq!(classify("31/13/2020"), TokenClass::Date);
        assert_eq!(classify("1/08/2020"), TokenClass::Noise);
        assert_eq!(classify("15/08/20"), TokenClass::Noise);
        assert_eq!(classify("08/2020"), TokenClass::Noise);
        assert_eq!(classify("15-08-2020"), TokenClass::Noise);
    }

    #[test]
    fn test_classify_document_numbers() {
        assert_eq!(classify("12.345.678/0001-95"), TokenClass::DocumentNumber);
        // NIT shaped, 11 digits
        assert_eq!(classify("123.45678.90-1"), TokenClass::DocumentNumber);
        // no separator: plain number
        assert_eq!(classify("12345678900"), TokenClass::Noise);
        assert_eq!(classify("12.345"), TokenClass::Noise);
    }

    #[test]
    fn test_classify_currency() {
        assert_eq!(classify("0,50"), TokenClass::Currency);
        assert_eq!(classify("1.234.567,89"), TokenClass::Currency);
        assert_eq!(classify("1234,56"), TokenClass::Noise);
        assert_eq!(classify("1.234,5"), TokenClass::Noise);
    }

    #[test]
    fn test_classify_noise() {
        assert_eq!(classify("X"), TokenClass::Noise);
        assert_eq!(classify("Empregado ou Agente Público"), TokenClass::Noise);
        assert_eq!(classify("Data Início"), TokenClass::Noise);
        assert_eq!(classify("Página 2 de 5"), TokenClass::Noise);
        assert_eq!(classify("10"), TokenClass::Noise);
        assert_eq!(classify("1 - 2"), TokenClass::Noise);
        assert_eq!(classify("--"), TokenClass::Noise);
        assert_eq!(classify("01/2020"), TokenClass::Noise);
    }

    #[test]
    fn test_classify_name_candidates() {
        assert_eq!(classify("INDUSTRIA METALURGICA LTDA"), TokenClass::NameCandidate);
        assert_eq!(classify("ME"), TokenClass::NameCandidate);
        assert_eq!(classify("Nome:"), TokenClass::Noise);
        assert_eq!(classify("ATIVO"), TokenClass::NameCandidate);
        assert_eq!(classify("S.A."), TokenClass::NameCandidate);
    }

    #[test]
    fn test_classify_with_custom_vocabulary() -> Result<(), String> {
        let v = Vocabulary::from_json(r#"{ "ignored_terms": { "extend": ["LTDA"] } }"#)
            .map_err(|e| e.to_string())?;
        assert_eq!(v.classify("COMERCIO LTDA"), TokenClass::Noise);
        assert_eq!(classify("COMERCIO LTDA"), TokenClass::NameCandidate);
        Ok(())
    }
}
