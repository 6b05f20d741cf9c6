use serde::Serialize;
use std::path::Path;

use crate::dates::{format_compact, format_date, format_duration};
use crate::extractor::Bond;
use crate::{CnisError, CnisReport};

const ACTIVE: &str = "Ativo";

impl Bond {
    pub fn format_to_print(&self, prefix: &str) -> String {
        let end = self
            .end_date()
            .map(|d| format_date(&d))
            .unwrap_or_else(|| ACTIVE.to_owned());
        format!(
            "{prefix} BOND {}: {}, start: {}, end: {}, duration: {} ({})",
            self.id(),
            self.employer_name(),
            format_date(&self.start_date()),
            end,
            format_compact(self.duration()),
            self.duration_label()
        )
    }
}

/// Human readable lines: one per bond followed by the summary.
pub fn format_report(report: &CnisReport, document: &str) -> Vec<String> {
    let mut lines = vec![format!("===> CNIS statement: {document}")];
    lines.extend(report.bonds.iter().map(|b| b.format_to_print("")));
    lines.push(format!(
        "===> BONDS: {} ({} active)",
        report.bonds.len(),
        report.active_bonds()
    ));
    lines.push(format!(
        "===> TOTAL CONTRIBUTION TIME: {} ({})",
        format_compact(&report.total_duration),
        format_duration(&report.total_duration)
    ));
    lines
}

pub fn to_json(report: &CnisReport) -> Result<String, CnisError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| CnisError::Export(format!("JSON serialization failed: {e}")))
}

#[derive(Serialize)]
struct BondRecord<'a> {
    document: &'a str,
    id: &'a str,
    employer_name: &'a str,
    start_date: String,
    end_date: Option<String>,
    status: &'a str,
    years: u32,
    months: u32,
    days: u32,
}

impl<'a> BondRecord<'a> {
    fn new(document: &'a str, bond: &'a Bond) -> Self {
        let duration = bond.duration();
        BondRecord {
            document,
            id: bond.id(),
            employer_name: bond.employer_name(),
            start_date: format_date(&bond.start_date()),
            end_date: bond.end_date().map(|d| format_date(&d)),
            status: if bond.is_active() { ACTIVE } else { "Encerrado" },
            years: duration.years,
            months: duration.months,
            days: duration.days,
        }
    }
}

/// Write the bond table of each `(document, report)` pair as CSV.
pub fn write_csv<W: std::io::Write>(
    reports: &[(String, CnisReport)],
    writer: W,
) -> Result<(), CnisError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (document, report) in reports {
        for bond in report.bonds.iter() {
            wtr.serialize(BondRecord::new(document, bond))
                .map_err(|e| CnisError::Export(format!("CSV serialization failed: {e}")))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(reports: &[(String, CnisReport)], path: &Path) -> Result<(), CnisError> {
    let file = std::fs::File::create(path)?;
    write_csv(reports, file)?;
    log::info!("Bond table written to {}", path.display());
    Ok(())
}
