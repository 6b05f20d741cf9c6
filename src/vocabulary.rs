//! Data tables driving token classification and bond scanning.
//!
//! Every table has a built-in default matching the CNIS layout. A JSON file
//! may replace or extend any table, e.g.
//!
//! ```json
//! {
//!   "ignored_terms": { "extend": ["AGRUPAMENTO"] },
//!   "header_date_markers": "default",
//!   "unnamed_label": "SEM EMPREGADOR",
//!   "name_window": 20
//! }
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::CnisError;

/// Form-label jargon that disqualifies a token from being an employer name.
pub const IGNORED_TERMS: &[&str] = &[
    "EMPREGADO",
    "TRABALHADOR",
    "AVULSO",
    "CONTRIBUINTE",
    "INDIVIDUAL",
    "FACULTATIVO",
    "DOMÉSTICO",
    "SEGURADO",
    "ESPECIAL",
    "AGENTE",
    "PÚBLICO",
    "REMUNERAÇÃO",
    "VÍNCULOS",
    "PERÍODOS",
    "DADOS",
    "CADASTRAIS",
    "RELAÇÕES",
    "PREVIDENCIÁRIAS",
    "NIT",
    "PÁGINA",
    "SEQ",
    "CNIS",
    "DATA",
    "INÍCIO",
    "FIM",
    "TIPO",
    "FILIAÇÃO",
    "VÍNCULO",
    "REMUNERAÇÕES",
    "INDICADORES",
    "COMPETÊNCIA",
    "SALÁRIO",
    "BENEFÍCIO",
    "ESPÉCIE",
    "RECOLHIMENTOS",
    "VALOR",
    "TOTAL",
    "NASCIMENTO",
    "DN",
    "NAT",
    "IDENTIFICAÇÃO",
    "NOME",
];

/// Labels announcing a registry date (birth date, NIT, CPF) in the header block.
pub const HEADER_DATE_MARKERS: &[&str] = &["NASCIMENTO", "DN", "NAT", "NIT", "CPF"];

/// Fragments marking an assembled name as registry header data.
pub const METADATA_MARKERS: &[&str] = &["NOME:", "FILIADO", "SEGURADO", "IDENTIFICAÇÃO"];

/// Prefixes marking an assembled name as registry header data.
pub const METADATA_PREFIXES: &[&str] = &["NIT", "CPF"];

pub const UNNAMED_BOND_LABEL: &str = "VÍNCULO SEM NOME";

/// How far back (in tokens) the employer name is searched for.
pub const NAME_WINDOW: usize = 15;

/// How many tokens before a date are inspected for header-date markers.
pub const HEADER_LOOKBACK: usize = 3;

/// Controls how a built-in table is overridden.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListOverride {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<String>),
    /// Append these values to the defaults.
    Extend(Vec<String>),
}

impl ListOverride {
    /// Resolve against `defaults`. Entries are trimmed, upper-cased and empty
    /// ones dropped since matching is done on upper-cased tokens.
    pub fn resolve(&self, defaults: &[&str]) -> Vec<String> {
        let defaults = defaults.iter().map(|x| x.to_string());
        let values: Vec<String> = match self {
            ListOverride::Default => defaults.collect(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => defaults.chain(v.iter().cloned()).collect(),
        };
        values
            .iter()
            .map(|x| x.trim().to_uppercase())
            .filter(|x| !x.is_empty())
            .collect()
    }
}

/// On-disk shape of a vocabulary file. Missing keys keep the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VocabularyOverrides {
    pub ignored_terms: ListOverride,
    pub header_date_markers: ListOverride,
    pub metadata_markers: ListOverride,
    pub metadata_prefixes: ListOverride,
    pub unnamed_label: Option<String>,
    pub name_window: Option<usize>,
    pub header_lookback: Option<usize>,
}

/// Resolved tables used by the classifier and the bond extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    pub(crate) ignored_terms: Vec<String>,
    pub(crate) header_date_markers: Vec<String>,
    pub(crate) metadata_markers: Vec<String>,
    pub(crate) metadata_prefixes: Vec<String>,
    pub(crate) unnamed_label: String,
    pub(crate) name_window: usize,
    pub(crate) header_lookback: usize,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            ignored_terms: ListOverride::Default.resolve(IGNORED_TERMS),
            header_date_markers: ListOverride::Default.resolve(HEADER_DATE_MARKERS),
            metadata_markers: ListOverride::Default.resolve(METADATA_MARKERS),
            metadata_prefixes: ListOverride::Default.resolve(METADATA_PREFIXES),
            unnamed_label: UNNAMED_BOND_LABEL.to_owned(),
            name_window: NAME_WINDOW,
            header_lookback: HEADER_LOOKBACK,
        }
    }
}

impl Vocabulary {
    pub fn from_overrides(overrides: &VocabularyOverrides) -> Result<Self, CnisError> {
        let unnamed_label = overrides
            .unnamed_label
            .as_deref()
            .unwrap_or(UNNAMED_BOND_LABEL)
            .trim()
            .to_owned();
        // Bonds with names of 2 characters or less are never emitted
        if unnamed_label.chars().count() <= 2 {
            return Err(CnisError::Vocabulary(format!(
                "unnamed_label \"{unnamed_label}\" must be longer than 2 characters"
            )));
        }
        let name_window = overrides.name_window.unwrap_or(NAME_WINDOW);
        if name_window == 0 {
            return Err(CnisError::Vocabulary(
                "name_window must be at least 1".to_owned(),
            ));
        }

        Ok(Vocabulary {
            ignored_terms: overrides.ignored_terms.resolve(IGNORED_TERMS),
            header_date_markers: overrides.header_date_markers.resolve(HEADER_DATE_MARKERS),
            metadata_markers: overrides.metadata_markers.resolve(METADATA_MARKERS),
            metadata_prefixes: overrides.metadata_prefixes.resolve(METADATA_PREFIXES),
            unnamed_label,
            name_window,
            header_lookback: overrides.header_lookback.unwrap_or(HEADER_LOOKBACK),
        })
    }

    pub fn from_json(content: &str) -> Result<Self, CnisError> {
        let overrides: VocabularyOverrides = serde_json::from_str(content)
            .map_err(|e| CnisError::Vocabulary(format!("invalid vocabulary JSON: {e}")))?;
        Vocabulary::from_overrides(&overrides)
    }

    pub fn load(path: &Path) -> Result<Self, CnisError> {
        log::info!("Loading vocabulary from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Vocabulary::from_json(&content)
    }

    pub fn unnamed_label(&self) -> &str {
        &self.unnamed_label
    }

    pub fn name_window(&self) -> usize {
        self.name_window
    }

    pub fn header_lookback(&self) -> usize {
        self.header_lookback
    }

    /// `upper` is expected to be upper-cased already.
    pub(crate) fn is_ignored_term(&self, upper: &str) -> bool {
        self.ignored_terms.iter().any(|t| upper.contains(t.as_str()))
    }

    pub(crate) fn is_header_date_marker(&self, upper: &str) -> bool {
        self.header_date_markers
            .iter()
            .any(|t| upper.contains(t.as_str()))
    }

    pub(crate) fn is_registry_metadata(&self, upper: &str) -> bool {
        self.metadata_markers.iter().any(|t| upper.contains(t.as_str()))
            || self
                .metadata_prefixes
                .iter()
                .any(|t| upper.starts_with(t.as_str()))
    }
}
