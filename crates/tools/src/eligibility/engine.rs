//! Eligibility rule evaluation over one disqualification record.
//!
//! `evaluate` is pure: the same record always yields the same ordered
//! failed checks and action items.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One customer's check flags: column name → raw cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EligibilityRecord(IndexMap<String, String>);

impl EligibilityRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cell value, or `None` when the column is absent, blank, or `nan`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
    }

    pub fn get_or<'a>(&'a self, column: &str, default: &'a str) -> &'a str {
        self.get(column).unwrap_or(default)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn flag_is(&self, column: &str, expected: &str) -> bool {
        self.get(column)
            .is_some_and(|v| v.eq_ignore_ascii_case(expected))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EligibilityRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single reason a customer is not eligible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedCheck {
    /// Check identifier (a column name, `recency_check`, or a free-text reason)
    pub check_type: String,
    pub description: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub supporting_data: IndexMap<String, String>,
}

impl FailedCheck {
    fn new(check_type: &str, description: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            check_type: check_type.to_string(),
            description: description.into(),
            explanation: explanation.into(),
            supporting_data: IndexMap::new(),
        }
    }
}

/// Result of evaluating one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub failed_checks: Vec<FailedCheck>,
    pub action_items: Vec<String>,
}

type Explain = fn(&EligibilityRecord) -> String;
type Support = fn(&EligibilityRecord) -> IndexMap<String, String>;

/// A column-backed check: identifier, description, explanation, supporting data.
struct CatalogEntry {
    id: &'static str,
    description: &'static str,
    explain: Option<Explain>,
    support: Option<Support>,
}

const RECENCY_COLUMN: &str = "recency_check";
const EXCLUDE: &str = "EXCLUDE";

/// Checked in this order; a value of `EXCLUDE` fails the check.
static CHECK_CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: "Joint_Check",
        description: "Joint Account Check",
        explain: Some(|_| {
            "This is a joint account. Only individual accounts with sole signatories qualify.".into()
        }),
        support: None,
    },
    CatalogEntry {
        id: "DPD_Arrears_Check_DS",
        description: "DPD Arrears Check",
        explain: Some(|_| {
            "Customer has DPD arrears. Clear all outstanding arrears and wait 60-day cooling period."
                .into()
        }),
        support: Some(|r| {
            IndexMap::from([
                ("Arrears_Days".to_string(), r.get_or("Arrears_Days", "N/A").to_string()),
                ("Loan_Account".to_string(), r.get_or("Loan_Account", "N/A").to_string()),
            ])
        }),
    },
    CatalogEntry {
        id: "Elma_check",
        description: "Mobile Banking Setup",
        explain: Some(|_| {
            "Customer not enrolled in mobile banking. Register for NCBA SASA mobile banking.".into()
        }),
        support: None,
    },
    CatalogEntry {
        id: "KRAPIN_Check",
        description: "KRA PIN Check",
        explain: None,
        support: None,
    },
    CatalogEntry {
        id: "Classification_Check",
        description: "Risk Classification",
        explain: Some(|r| {
            format!(
                "Customer classification is {}, below minimum threshold (A5 for digital, A7 for mobile). Liaise with RM to upgrade.",
                r.get_or("RISK_CLASS", "Unknown")
            )
        }),
        support: Some(|r| {
            IndexMap::from([(
                "Current_Classification".to_string(),
                r.get_or("RISK_CLASS", "Unknown").to_string(),
            )])
        }),
    },
    CatalogEntry {
        id: "Mandates_Check",
        description: "Account Mandates",
        explain: Some(|_| {
            "Account mandates must be SOLE SIGNATORY. Remove additional signatories.".into()
        }),
        support: None,
    },
    CatalogEntry {
        id: "Linked_Base_Check",
        description: "Linked Base Account",
        explain: None,
        support: None,
    },
    CatalogEntry {
        id: "customer_vintage_Check",
        description: "Banking Vintage",
        explain: Some(|_| "Customer has banked less than 6 months. Minimum 6 months required.".into()),
        support: None,
    },
    CatalogEntry {
        id: "Active_Inactive_Check",
        description: "Account Activity",
        explain: Some(|_| {
            "Account classified as inactive. Reactivate through regular transactions for 30+ days."
                .into()
        }),
        support: None,
    },
    CatalogEntry {
        id: "Scheme_Check_DS",
        description: "Scheme Check",
        explain: None,
        support: None,
    },
    CatalogEntry {
        id: "Staff_Check_DS",
        description: "Staff Account Check",
        explain: None,
        support: None,
    },
    CatalogEntry {
        id: "Risk_Class_Check_DS",
        description: "Risk Class Check",
        explain: Some(|_| {
            "Customer classified as high risk after assessment. Improve credit history.".into()
        }),
        support: None,
    },
    CatalogEntry {
        id: "Average_Bal_check",
        description: "Average Balance Check",
        explain: None,
        support: None,
    },
];

impl CatalogEntry {
    fn failed(&self, record: &EligibilityRecord) -> FailedCheck {
        let explanation = match self.explain {
            Some(explain) => explain(record),
            None => format!("Failed {}", self.id.replace('_', " ")),
        };
        let mut check = FailedCheck::new(self.id, self.description, explanation);
        if let Some(support) = self.support {
            check.supporting_data = support(record);
        }
        check
    }
}

/// Identifiers of the column-backed checks, in evaluation order.
pub fn catalog_ids() -> impl Iterator<Item = &'static str> {
    CHECK_CATALOG.iter().map(|e| e.id)
}

/// Evaluate a disqualification record.
pub fn evaluate(record: &EligibilityRecord) -> Evaluation {
    let failed_checks = failed_checks(record);
    let action_items = action_items(&failed_checks);
    Evaluation {
        failed_checks,
        action_items,
    }
}

fn failed_checks(record: &EligibilityRecord) -> Vec<FailedCheck> {
    let mut failed = Vec::new();

    if record.flag_is(RECENCY_COLUMN, "N") {
        failed.push(FailedCheck::new(
            RECENCY_COLUMN,
            "Inconsistent Credit Turnovers",
            "Customer has inconsistent credit turnovers with irregular transaction patterns",
        ));
    }

    for entry in CHECK_CATALOG {
        if record.flag_is(entry.id, EXCLUDE) {
            failed.push(entry.failed(record));
        }
    }

    if let Some(reasons) = record.get("reasons") {
        let tokens: Vec<&str> = reasons.split(',').map(str::trim).collect();
        let explanations: Vec<&str> = match record.get("reasons_explanation") {
            Some(text) => text.split(',').map(str::trim).collect(),
            None => tokens.clone(),
        };

        for (idx, token) in tokens.iter().enumerate() {
            if token.is_empty() || failed.iter().any(|c| c.check_type == *token) {
                continue;
            }
            let explanation = explanations.get(idx).copied().unwrap_or(token);
            failed.push(FailedCheck::new(token, title_case(token), explanation));
        }
    }

    failed
}

/// Remediation bucket for a failed check; each contributes one action line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationCategory {
    Arrears,
    Classification,
    JointAccount,
    Mandates,
    Vintage,
    MobileEnrollment,
    Inactivity,
}

impl RemediationCategory {
    /// Classify by substring on the lower-cased identifier. First rule wins.
    pub fn classify(check_type: &str) -> Option<Self> {
        let id = check_type.to_lowercase();
        let category = if id.contains("dpd") || id.contains("arrears") {
            Self::Arrears
        } else if id.contains("classification") {
            Self::Classification
        } else if id.contains("joint") {
            Self::JointAccount
        } else if id.contains("mandates") {
            Self::Mandates
        } else if id.contains("vintage") {
            Self::Vintage
        } else if id.contains("elma") {
            Self::MobileEnrollment
        } else if id.contains("active") {
            Self::Inactivity
        } else {
            return None;
        };
        Some(category)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::Arrears => "Clear all arrears and wait 60-day cooling period",
            Self::Classification => "Upgrade customer classification - Contact RM/Portfolio team",
            Self::JointAccount => "Convert to individual account - Joint accounts ineligible",
            Self::Mandates => "Update to SOLE SIGNATORY - Remove additional signatories",
            Self::Vintage => "Wait minimum 6 months banking relationship",
            Self::MobileEnrollment => "Register for mobile banking - Setup NCBA SASA",
            Self::Inactivity => "Reactivate account - Regular transactions for 30+ days",
        }
    }
}

/// Shown when checks failed but none maps to a known remediation.
pub const GENERIC_ACTION: &str = "Contact Portfolio Management for detailed review";

fn action_items(failed: &[FailedCheck]) -> Vec<String> {
    if failed.is_empty() {
        return Vec::new();
    }

    let mut seen: Vec<RemediationCategory> = Vec::new();
    for check in failed {
        if let Some(category) = RemediationCategory::classify(&check.check_type) {
            if !seen.contains(&category) {
                seen.push(category);
            }
        }
    }

    if seen.is_empty() {
        return vec![GENERIC_ACTION.to_string()];
    }
    seen.iter().map(|c| c.action().to_string()).collect()
}

/// `low_balance_flag` → `Low Balance Flag`.
fn title_case(identifier: &str) -> String {
    identifier
        .replace('_', " ")
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
