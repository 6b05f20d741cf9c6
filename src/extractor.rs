//! Reconstruction of employment bonds from a flattened CNIS token stream.
//!
//! The PDF text layer of a CNIS statement lists each bond as
//! `<employer name fragments> <start date> [<status>] [<end date>]` but
//! interleaved with labels, NIT/CNPJ numbers and amounts. Bonds are found by
//! scanning for start dates, looking ahead (at most two tokens) for the end
//! date and walking back a bounded window for the employer name.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::classifier::TokenClass;
use crate::dates::{diff, format_date, format_duration, parse_date, Duration};
use crate::vocabulary::Vocabulary;

fn serialize_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_date(date))
}

fn serialize_optional_date<S: Serializer>(
    date: &Option<NaiveDate>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.serialize_some(&format_date(d)),
        None => s.serialize_none(),
    }
}

/// One employment or contribution period (vínculo).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bond {
    id: String,
    employer_name: String,
    #[serde(serialize_with = "serialize_date")]
    start_date: NaiveDate,
    #[serde(serialize_with = "serialize_optional_date")]
    end_date: Option<NaiveDate>,
    is_active: bool,
    duration: Duration,
    duration_label: String,
}

impl Bond {
    /// Open bonds (no `end_date`) are measured up to `today`.
    pub fn new(
        id: String,
        employer_name: String,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        today: &NaiveDate,
    ) -> Self {
        let duration = diff(&start_date, end_date.as_ref().unwrap_or(today));
        Bond {
            id,
            employer_name,
            start_date,
            end_date,
            is_active: end_date.is_none(),
            duration,
            duration_label: format_duration(&duration),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn employer_name(&self) -> &str {
        &self.employer_name
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn duration(&self) -> &Duration {
        &self.duration
    }

    pub fn duration_label(&self) -> &str {
        &self.duration_label
    }
}

pub struct BondExtractor<'a> {
    vocabulary: &'a Vocabulary,
    today: NaiveDate,
}

impl<'a> BondExtractor<'a> {
    pub fn new(vocabulary: &'a Vocabulary, today: NaiveDate) -> Self {
        BondExtractor { vocabulary, today }
    }

    fn is_date(&self, token: &str) -> bool {
        self.vocabulary.classify(token) == TokenClass::Date
    }

    /// Date token that is also a real calendar date.
    fn as_date(&self, token: &str) -> Option<NaiveDate> {
        if self.is_date(token) {
            parse_date(token)
        } else {
            None
        }
    }

    /// Date at `i` is part of the registry header (birth date, NIT, CPF...)
    /// or directly follows another date, so it cannot start a bond.
    pub fn is_header_date(&self, tokens: &[String], i: usize) -> bool {
        if i == 0 {
            return false;
        }
        if self.is_date(&tokens[i - 1]) {
            log::trace!("Date \"{}\" at {i} follows another date", tokens[i]);
            return true;
        }
        let lookback = self.vocabulary.header_lookback().min(i);
        (1..=lookback).any(|k| {
            let marker = self
                .vocabulary
                .is_header_date_marker(&tokens[i - k].to_uppercase());
            if marker {
                log::debug!(
                    "Date \"{}\" at {i} is registry data (\"{}\")",
                    tokens[i],
                    tokens[i - k]
                );
            }
            marker
        })
    }

    /// End date of the bond starting at `i`: the next token, or the one after
    /// that when a single non-date token (e.g. a status label) sits between.
    pub fn find_end_date(&self, tokens: &[String], i: usize) -> Option<(usize, NaiveDate)> {
        (i + 1..=i + 2)
            .filter_map(|j| tokens.get(j).map(|t| (j, t)))
            .find_map(|(j, t)| self.as_date(t).map(|d| (j, d)))
    }

    /// Walk back from `i` over at most `name_window` tokens for the employer
    /// name. A date ends the search. A name split over two consecutive
    /// candidates is merged.
    pub fn find_employer_name(&self, tokens: &[String], i: usize) -> Option<String> {
        let lower = i.saturating_sub(self.vocabulary.name_window());
        for j in (lower..i).rev() {
            match self.vocabulary.classify(&tokens[j]) {
                TokenClass::NameCandidate => {
                    let name = &tokens[j];
                    if j > 0 {
                        let prev = &tokens[j - 1];
                        if self.vocabulary.classify(prev) == TokenClass::NameCandidate
                            && !prev.contains(':')
                        {
                            return Some(format!("{prev} {name}"));
                        }
                    }
                    return Some(name.clone());
                }
                TokenClass::Date => return None,
                TokenClass::DocumentNumber | TokenClass::Currency | TokenClass::Noise => {}
            }
        }
        None
    }

    /// Scan the whole token sequence and return bonds in document order.
    pub fn extract(&self, tokens: &[String]) -> Vec<Bond> {
        let mut bonds: Vec<Bond> = vec![];

        for (i, token) in tokens.iter().enumerate() {
            if !self.is_date(token) {
                continue;
            }
            if self.is_header_date(tokens, i) {
                continue;
            }
            let start_date = match parse_date(token) {
                Some(d) => d,
                None => {
                    log::warn!("Skipping invalid calendar date \"{token}\" at {i}");
                    continue;
                }
            };

            let end = self.find_end_date(tokens, i);
            // Only names read from the document can be registry metadata
            let employer_name = match self.find_employer_name(tokens, i) {
                Some(name) if self.vocabulary.is_registry_metadata(&name.to_uppercase()) => {
                    log::debug!("Discarding registry metadata \"{name}\" at {i}");
                    continue;
                }
                Some(name) => name,
                None => self.vocabulary.unnamed_label().to_owned(),
            };
            if employer_name.chars().count() <= 2 {
                log::debug!("Discarding too short employer name \"{employer_name}\" at {i}");
                continue;
            }

            let bond = Bond::new(
                format!("bond-{}", bonds.len()),
                employer_name,
                start_date,
                end.map(|(_, d)| d),
                &self.today,
            );
            log::debug!(
                "Found bond: {} {} -> {:?} ({})",
                bond.employer_name,
                token,
                bond.end_date,
                bond.duration_label
            );
            bonds.push(bond);
        }

        log::info!("Extracted {} bonds from {} tokens", bonds.len(), tokens.len());
        bonds
    }
}
