//! The `digital_lending` handler: loan eligibility checks.

use super::engine::{self, EligibilityRecord, Evaluation};
use super::lookup::EligibilityLookup;
use crate::time_of_day::greeting;
use async_trait::async_trait;
use chrono::{Local, Timelike};
use safina_core::context::{SessionContext, account_from_arguments};
use safina_core::error::ToolError;
use safina_core::provider::Provider;
use safina_core::response::{Response, Status};
use safina_core::tool::{Handler, ToolSpec};
use serde_json::{Map, Value, json};
use std::fmt::Write;
use std::sync::Arc;
use tracing::info;

pub const HANDLER_NAME: &str = "digital_lending";
pub const TOOL_NAME: &str = "check_eligibility";
pub const INTENT: &str = "eligibility_check";

/// Outcome of looking an identifier up in both datasets.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Eligible { account_number: String },
    Ineligible {
        record: EligibilityRecord,
        evaluation: Evaluation,
    },
    NotFound,
}

impl Decision {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Decision::Eligible { .. })
    }
}

/// Qualified set first; otherwise evaluate the disqualification row.
pub fn decide(lookup: &dyn EligibilityLookup, identifier: &str) -> Decision {
    if let Some(account_number) = lookup.is_qualified(identifier) {
        return Decision::Eligible { account_number };
    }
    match lookup.disqualification_record(identifier) {
        Some(record) => {
            let evaluation = engine::evaluate(&record);
            Decision::Ineligible { record, evaluation }
        }
        None => Decision::NotFound,
    }
}

pub struct EligibilityHandler {
    lookup: Arc<dyn EligibilityLookup>,
}

impl EligibilityHandler {
    pub fn new(lookup: Arc<dyn EligibilityLookup>) -> Self {
        Self { lookup }
    }

    fn check(&self, identifier: &str, hour: u32) -> Response {
        info!(account = %identifier, "Checking eligibility");
        match decide(self.lookup.as_ref(), identifier) {
            Decision::Eligible { account_number } => {
                info!(account = %account_number, "Customer is eligible");
                eligible_response(&account_number, hour)
            }
            Decision::Ineligible { record, evaluation } => {
                info!(
                    account = %identifier,
                    failed = evaluation.failed_checks.len(),
                    "Customer is not eligible"
                );
                ineligible_response(&record, &evaluation, hour)
            }
            Decision::NotFound => {
                info!(account = %identifier, "Account not found");
                Response::new(
                    format!(
                        "Account {identifier} not found in records. Please verify the account number."
                    ),
                    INTENT,
                    0.9,
                    Status::NotFound,
                )
            }
        }
    }
}

fn eligible_response(account_number: &str, hour: u32) -> Response {
    let message = format!(
        "{greeting},\n\n\
         **Digital Loan Status: ELIGIBLE**\n\n\
         Customer with account {account_number} is eligible for a digital loan.\n\n\
         **Next Steps:**\n\
         • Inform customer they qualify for a loan\n\
         • Guide them through the loan application process\n\
         • Ensure they understand the terms and conditions\n\
         • Process loan request through standard channels\n\n\
         For specific loan limits, please check the warehouse system or contact Portfolio Management.",
        greeting = greeting(hour),
    );

    let mut data = Map::new();
    data.insert("is_eligible".into(), Value::Bool(true));
    data.insert("account_number".into(), json!(account_number));

    Response::success(message, INTENT, 0.95).with_data(data)
}

fn ineligible_response(record: &EligibilityRecord, evaluation: &Evaluation, hour: u32) -> Response {
    let customer_name = record.get_or("CUS_NAME_1", "Customer");
    let account_number = record.get_or("ACCOUNT_NUMBER", "Unknown");

    let mut message = format!(
        "{},\n\n**Digital Loan Status: NOT ELIGIBLE**\n\n\
         {customer_name} (Account: {account_number}) is currently not eligible for a digital loan.\n\n\
         **Issues Identified:**\n",
        greeting(hour)
    );

    for (idx, check) in evaluation.failed_checks.iter().enumerate() {
        let _ = write!(message, "\n{}. **{}**\n   {}", idx + 1, check.description, check.explanation);
        for (key, value) in &check.supporting_data {
            let _ = write!(message, "\n   • {key}: {value}");
        }
    }

    if !evaluation.action_items.is_empty() {
        message.push_str("\n\n**Resolution Required:**");
        for action in &evaluation.action_items {
            let _ = write!(message, "\n• {action}");
        }
    }

    let mut data = Map::new();
    data.insert("is_eligible".into(), Value::Bool(false));
    data.insert("account_number".into(), json!(account_number));
    data.insert("customer_name".into(), json!(customer_name));
    data.insert("failed_checks".into(), json!(evaluation.failed_checks));
    data.insert("action_items".into(), json!(evaluation.action_items));

    Response::success(message, INTENT, 0.95).with_data(data)
}

#[async_trait]
impl Handler for EligibilityHandler {
    fn name(&self) -> &str {
        HANDLER_NAME
    }

    fn description(&self) -> &str {
        "Handles loan eligibility and ineligibility checks"
    }

    fn tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new(
                TOOL_NAME,
                "Check if customer qualifies for digital loan. Requires account/customer number.",
                HANDLER_NAME,
            )
            .param(
                "account_number",
                "string",
                true,
                "Customer account or customer number",
            ),
        ]
    }

    async fn execute(
        &self,
        tool_name: &str,
        arguments: &Map<String, Value>,
        context: &SessionContext,
        _provider: &dyn Provider,
    ) -> Result<Response, ToolError> {
        if tool_name != TOOL_NAME {
            return Ok(Response::error("Unknown tool requested"));
        }

        let identifier = account_from_arguments(arguments).or_else(|| context.last_account.clone());
        let Some(identifier) = identifier else {
            return Ok(Response::new(
                "I need an account number to check eligibility. Please provide it.",
                INTENT,
                0.8,
                Status::MissingData,
            )
            .with_suggestions(["Check eligibility for account 503446"]));
        };

        Ok(self.check(&identifier, Local::now().hour()))
    }
}
