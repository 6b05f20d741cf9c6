// SPDX-FileCopyrightText: 2022-2025 RustInFinance
// SPDX-License-Identifier: BSD-3-Clause

mod classifier;
mod dates;
mod extractor;
mod logging;
mod pdfparser;
mod report;
mod vocabulary;

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;

pub use classifier::{classify, TokenClass};
pub use dates::{
    add_duration, diff, format_compact, format_date, format_duration, parse_date, sum, Duration,
};
pub use extractor::{Bond, BondExtractor};
pub use logging::{init_logging_infrastructure, level_from_verbosity, ResultExt};
pub use pdfparser::{PdfTokenSource, TokenSource};
pub use report::{export_csv, format_report, to_json, write_csv};
pub use vocabulary::{ListOverride, Vocabulary, VocabularyOverrides};

#[derive(thiserror::Error, Debug)]
pub enum CnisError {
    #[error("Unable to open document: {0}")]
    Open(String),
    #[error("Document has no extractable text (encrypted or scanned image?)")]
    UnreadableDocument,
    #[error("No employment bonds recognized among {0} text fragments")]
    NoBondsFound(usize),
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CnisError> for String {
    fn from(e: CnisError) -> Self {
        e.to_string()
    }
}

/// Bonds of one statement and their aggregated contribution time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnisReport {
    pub bonds: Vec<Bond>,
    pub total_duration: Duration,
}

impl CnisReport {
    pub fn active_bonds(&self) -> usize {
        self.bonds.iter().filter(|b| b.is_active()).count()
    }
}

/// Concatenate the tokens of every page in page order into one stream.
pub fn collect_tokens(source: &dyn TokenSource) -> Result<Vec<String>, CnisError> {
    let mut tokens = vec![];
    for page in 0..source.page_count() {
        let mut page_tokens = source.extract_page_tokens(page)?;
        tokens.append(&mut page_tokens);
    }
    Ok(tokens)
}

pub fn extract_from_tokens(
    tokens: &[String],
    vocabulary: &Vocabulary,
    today: NaiveDate,
) -> Result<CnisReport, CnisError> {
    if tokens.is_empty() {
        return Err(CnisError::UnreadableDocument);
    }
    let bonds = BondExtractor::new(vocabulary, today).extract(tokens);
    if bonds.is_empty() {
        return Err(CnisError::NoBondsFound(tokens.len()));
    }
    let total_duration = sum(bonds.iter().map(|b| b.duration()));
    log::info!(
        "Total contribution time: {}",
        format_duration(&total_duration)
    );
    Ok(CnisReport {
        bonds,
        total_duration,
    })
}

/// Run the whole pipeline with open bonds measured up to `today`.
pub fn run_extraction_at(
    source: &dyn TokenSource,
    vocabulary: &Vocabulary,
    today: NaiveDate,
) -> Result<CnisReport, CnisError> {
    let tokens = collect_tokens(source)?;
    log::info!(
        "Collected {} tokens from {} pages",
        tokens.len(),
        source.page_count()
    );
    extract_from_tokens(&tokens, vocabulary, today)
}

pub fn run_extraction(
    source: &dyn TokenSource,
    vocabulary: &Vocabulary,
) -> Result<CnisReport, CnisError> {
    run_extraction_at(source, vocabulary, chrono::Local::now().date_naive())
}

pub fn process_document(path: &str, vocabulary: &Vocabulary) -> Result<CnisReport, CnisError> {
    let source = PdfTokenSource::open(Path::new(path))?;
    run_extraction(&source, vocabulary)
}

/* Check:
if every path is an existing file
if file names have no duplicates
if extensions are only pdf
*/
pub fn validate_file_names(files: &[String]) -> Result<(), String> {
    let mut names_set = HashSet::new();
    let mut errors = Vec::<String>::new();

    for file_str in files {
        let path = Path::new(&file_str);
        if !path.is_file() {
            errors.push(format!("Not a file or path doesn't exist: {}", file_str));
            continue;
        }

        match path.file_name().and_then(OsStr::to_str) {
            Some(file_name) => {
                if !names_set.insert(file_name.to_owned()) {
                    errors.push(format!("Duplicate file name found: {}", file_name));
                }
            }
            None => errors.push(format!("File has no name: {}", file_str)),
        }

        match path.extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("pdf") => {}
            Some(other_ext) => errors.push(format!(
                "Unexpected extension {other_ext} for file: {file_str}. Only pdf is expected."
            )),
            None => errors.push(format!("File has no extension: {}", file_str)),
        }
    }

    if !errors.is_empty() {
        return Err(errors.join("\n"));
    }
    Ok(())
}
