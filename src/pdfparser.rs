use pdf::content::Operation;
use pdf::file::File;
use pdf::primitive::{PdfString, Primitive};
use std::path::Path;

use crate::CnisError;

/// TJ kerning adjustment (thousandths of text space) wide enough to be a word gap.
const TJ_WORD_GAP: f32 = -250.0;

/// Supplier of text fragments, one page at a time, in content stream order.
pub trait TokenSource {
    fn page_count(&self) -> usize;

    /// Ordered, trimmed, non-empty fragments of page `page` (zero based).
    fn extract_page_tokens(&self, page: usize) -> Result<Vec<String>, CnisError>;
}

/// Tokens that were already extracted elsewhere, one vector per page.
impl TokenSource for Vec<Vec<String>> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn extract_page_tokens(&self, page: usize) -> Result<Vec<String>, CnisError> {
        Ok(self
            .get(page)
            .map(|p| {
                p.iter()
                    .map(|t| t.trim().to_owned())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub struct PdfTokenSource {
    file: File<Vec<u8>>,
}

impl PdfTokenSource {
    pub fn open(path: &Path) -> Result<Self, CnisError> {
        let data = std::fs::read(path)
            .map_err(|e| CnisError::Open(format!("{}: {e}", path.display())))?;
        let source = PdfTokenSource::load(data, &path.display().to_string())?;
        log::info!("Parsing: {} of {} pages", path.display(), source.page_count());
        Ok(source)
    }

    pub fn from_data(data: Vec<u8>) -> Result<Self, CnisError> {
        PdfTokenSource::load(data, "in-memory document")
    }

    /// Password protected documents have no text to offer and are reported
    /// as unreadable rather than as an open failure.
    fn load(data: Vec<u8>, name: &str) -> Result<Self, CnisError> {
        let encrypted = has_encryption_dictionary(&data);
        match File::<Vec<u8>>::from_data(data) {
            Ok(file) => Ok(PdfTokenSource { file }),
            Err(e) if encrypted || e.to_string().to_lowercase().contains("password") => {
                log::warn!("{name} is encrypted: {e}");
                Err(CnisError::UnreadableDocument)
            }
            Err(e) => Err(CnisError::Open(format!("{name}: {e}"))),
        }
    }
}

fn has_encryption_dictionary(data: &[u8]) -> bool {
    const ENCRYPT: &[u8] = b"/Encrypt";
    data.windows(ENCRYPT.len()).any(|w| w == ENCRYPT)
}

impl TokenSource for PdfTokenSource {
    fn page_count(&self) -> usize {
        self.file.num_pages() as usize
    }

    fn extract_page_tokens(&self, page: usize) -> Result<Vec<String>, CnisError> {
        // A broken page contributes nothing rather than aborting the document
        let page_rc = match self.file.get_page(page as u32) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Unable to read page {}: {e}", page + 1);
                return Ok(vec![]);
            }
        };
        let tokens = match page_rc.contents.as_ref() {
            Some(contents) => tokens_from_operations(&contents.operations),
            None => {
                log::warn!("Page {} has no content stream", page + 1);
                vec![]
            }
        };
        log::debug!("Page {} yielded {} tokens", page + 1, tokens.len());
        Ok(tokens)
    }
}

/// Strings in PDFDocEncoding/WinAnsi are not valid UTF-8; fall back to Latin-1.
fn decode_pdf_string(pstr: &PdfString) -> String {
    match pstr.clone().into_string() {
        Ok(s) => s,
        Err(_) => pstr.as_bytes().iter().map(|&b| b as char).collect(),
    }
}

fn text_from_array(parts: &[Primitive]) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Primitive::String(s) => text.push_str(&decode_pdf_string(s)),
            Primitive::Number(n) if *n <= TJ_WORD_GAP => text.push(' '),
            Primitive::Integer(n) if (*n as f32) <= TJ_WORD_GAP => text.push(' '),
            _ => (),
        }
    }
    text
}

/// Collect text shown by `Tj`, `TJ`, `'` and `"` operators, one token per
/// operator, trimmed, empty ones dropped.
pub(crate) fn tokens_from_operations(operations: &[Operation]) -> Vec<String> {
    let mut tokens = vec![];
    for op in operations.iter() {
        let text = match (op.operator.as_str(), op.operands.as_slice()) {
            ("Tj", [Primitive::String(s), ..]) | ("'", [Primitive::String(s), ..]) => {
                decode_pdf_string(s)
            }
            ("\"", [_, _, Primitive::String(s), ..]) => decode_pdf_string(s),
            ("TJ", [Primitive::Array(parts), ..]) => text_from_array(parts),
            _ => continue,
        };
        log::trace!("Detected PDF text: {text}");
        let text = text.trim();
        if !text.is_empty() {
            tokens.push(text.to_owned());
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Primitive {
        Primitive::String(PdfString::new(s.as_bytes().to_vec()))
    }

    fn op(operator: &str, operands: Vec<Primitive>) -> Operation {
        Operation {
            operator: operator.to_owned(),
            operands,
        }
    }

    #[test]
    fn test_tokens_from_operations() {
        let ops = vec![
            op("BT", vec![]),
            op("Tj", vec![string("  BANCO ")]),
            op("Td", vec![Primitive::Integer(10), Primitive::Integer(20)]),
            op(
                "TJ",
                vec![Primitive::Array(vec![
                    string("DO"),
                    Primitive::Number(-400.0),
                    string("BRA"),
                    Primitive::Integer(-12),
                    string("SIL"),
                ])],
            ),
            op("Tj", vec![string("   ")]),
            op("'", vec![string("01/03/2010")]),
            op(
                "\"",
                vec![
                    Primitive::Number(1.0),
                    Primitive::Number(0.5),
                    string("15/07/2015"),
                ],
            ),
            op("Tj", vec![]),
            op("ET", vec![]),
        ];
        assert_eq!(
            tokens_from_operations(&ops),
            vec!["BANCO", "DO BRASIL", "01/03/2010", "15/07/2015"]
        );
    }

    #[test]
    fn test_latin1_fallback() {
        // "VÍNCULO" in WinAnsi: Í is 0xCD
        let pstr = PdfString::new(vec![b'V', 0xCD, b'N', b'C', b'U', b'L', b'O']);
        assert_eq!(decode_pdf_string(&pstr), "VÍNCULO");
    }

    #[test]
    fn test_in_memory_source() -> Result<(), String> {
        let pages = vec![
            vec!["A".to_owned(), "  ".to_owned(), " B ".to_owned()],
            vec![],
        ];
        assert_eq!(pages.page_count(), 2);
        assert_eq!(
            pages.extract_page_tokens(0).map_err(|e| e.to_string())?,
            vec!["A", "B"]
        );
        assert!(pages.extract_page_tokens(1).map_err(|e| e.to_string())?.is_empty());
        assert!(pages.extract_page_tokens(5).map_err(|e| e.to_string())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_open_missing_file() {
        assert!(matches!(
            PdfTokenSource::open(Path::new("data/does-not-exist.pdf")),
            Err(CnisError::Open(_))
        ));
    }

    #[test]
    fn test_encrypted_document_is_unreadable() {
        let data = b"%PDF-1.4\ntrailer\n<< /Root 1 0 R /Encrypt 2 0 R >>\n%%EOF".to_vec();
        assert!(has_encryption_dictionary(&data));
        assert!(matches!(
            PdfTokenSource::from_data(data),
            Err(CnisError::UnreadableDocument)
        ));
    }

    #[test]
    fn test_garbage_data_is_not_a_pdf() {
        assert!(matches!(
            PdfTokenSource::from_data(b"definitely not a pdf".to_vec()),
            Err(CnisError::Open(_))
        ));
    }
}
