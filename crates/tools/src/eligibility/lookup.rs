//! Tabular lookups behind the eligibility check.

use super::engine::EligibilityRecord;
use safina_core::error::DataError;
use std::path::Path;
use tracing::{info, warn};

/// Identifiers shorter than this are customer numbers, matched by prefix.
pub const CUSTOMER_NUMBER_MAX_LEN: usize = 10;

/// Read access to the qualified and disqualification datasets.
pub trait EligibilityLookup: Send + Sync {
    /// The matched account number when `identifier` is in the qualified set.
    fn is_qualified(&self, identifier: &str) -> Option<String>;

    /// The first disqualification row matching `identifier`.
    fn disqualification_record(&self, identifier: &str) -> Option<EligibilityRecord>;
}

/// In-memory lookup over two tables of rows.
#[derive(Debug, Clone, Default)]
pub struct TableLookup {
    qualified: Vec<String>,
    disqualified: Vec<EligibilityRecord>,
}

fn is_customer_number(identifier: &str) -> bool {
    identifier.chars().count() < CUSTOMER_NUMBER_MAX_LEN
}

impl TableLookup {
    /// Build from qualified account numbers and disqualification rows.
    pub fn new(
        qualified: impl IntoIterator<Item = impl Into<String>>,
        disqualified: Vec<EligibilityRecord>,
    ) -> Self {
        Self {
            qualified: qualified
                .into_iter()
                .map(|a| {
                    let a: String = a.into();
                    a.trim().to_string()
                })
                .collect(),
            disqualified,
        }
    }

    /// Load both tables from CSV. A missing file yields an empty table.
    pub fn from_csv_files(qualified: &Path, disqualified: &Path) -> Result<Self, DataError> {
        let qualified_rows = read_csv(qualified)?;
        let qualified: Vec<String> = qualified_rows
            .iter()
            .filter_map(|row| row.get("ACCOUNT_NUMBER").map(str::to_string))
            .collect();
        let disqualified = read_csv(disqualified)?;

        info!(
            qualified = qualified.len(),
            disqualified = disqualified.len(),
            "Loaded eligibility tables"
        );
        Ok(Self {
            qualified,
            disqualified,
        })
    }

    pub fn qualified_len(&self) -> usize {
        self.qualified.len()
    }

    pub fn disqualified_len(&self) -> usize {
        self.disqualified.len()
    }
}

impl EligibilityLookup for TableLookup {
    fn is_qualified(&self, identifier: &str) -> Option<String> {
        let id = identifier.trim();
        if id.is_empty() {
            return None;
        }
        let prefix = is_customer_number(id);
        self.qualified
            .iter()
            .find(|account| {
                if prefix {
                    account.starts_with(id)
                } else {
                    account.as_str() == id
                }
            })
            .cloned()
    }

    fn disqualification_record(&self, identifier: &str) -> Option<EligibilityRecord> {
        let id = identifier.trim();
        if id.is_empty() {
            return None;
        }
        let prefix = is_customer_number(id);
        self.disqualified
            .iter()
            .find(|row| {
                let account = row.get("ACCOUNT_NUMBER");
                if prefix {
                    row.get("CUSTOMERNO") == Some(id)
                        || account.is_some_and(|a| a.starts_with(id))
                } else {
                    account == Some(id)
                }
            })
            .cloned()
    }
}

/// Read a CSV file into rows keyed by header. Cell values are trimmed.
fn read_csv(path: &Path) -> Result<Vec<EligibilityRecord>, DataError> {
    if !path.exists() {
        warn!(path = %path.display(), "Data file not found, using empty table");
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path).map_err(|e| DataError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?
        .clone();

    let mut rows: Vec<EligibilityRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result.map_err(|e| DataError::Parse {
            path: path.display().to_string(),
            reason: format!("row {}: {e}", idx + 1),
        })?;
        rows.push(
            headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.trim(), v.trim()))
                .collect(),
        );
    }
    Ok(rows)
}
