//! Result Formatter: maps a [`QueryResult`] into what a calling agent consumes.

use serde::Serialize;

use x402::money::{describe_amount, format_atomic_amount};
use x402::{PaymentDomain, PaymentRequirementsResponse, SettlementResult};

use crate::result::{PaymentSource, QueryResult, Row};

/// Flat JSON view of a query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement: Option<SettlementResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_source: Option<PaymentSource>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub payment_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_requirements: Option<PaymentRequirementsResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl QueryResponse {
    fn empty(success: bool) -> Self {
        Self {
            success,
            rows: None,
            row_count: None,
            estimated_cost: None,
            actual_cost: None,
            execution_time: None,
            settlement: None,
            payment_source: None,
            payment_required: false,
            payment_requirements: None,
            message: None,
            error: None,
            error_kind: None,
            error_details: None,
            retryable: None,
        }
    }
}

impl From<&QueryResult> for QueryResponse {
    fn from(result: &QueryResult) -> Self {
        match result {
            QueryResult::Success(s) => QueryResponse {
                rows: Some(s.rows.clone()),
                row_count: Some(s.row_count),
                estimated_cost: s.estimated_cost.clone(),
                actual_cost: s.actual_cost.clone(),
                execution_time: s.execution_time.clone(),
                settlement: s.settlement.clone(),
                payment_source: s.payment_source,
                ..QueryResponse::empty(true)
            },
            QueryResult::PaymentRequired(p) => QueryResponse {
                payment_required: true,
                payment_requirements: Some(p.requirements.clone()),
                message: Some(p.message.clone()),
                ..QueryResponse::empty(false)
            },
            QueryResult::Failed(e) => {
                let details = match e {
                    crate::QueryError::PaymentRejected { payload, .. }
                    | crate::QueryError::Gateway { payload, .. } => Some(payload.clone()),
                    _ => None,
                };
                QueryResponse {
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    error_details: details,
                    retryable: Some(e.is_retryable()),
                    ..QueryResponse::empty(false)
                }
            }
        }
    }
}

/// Prompt shown when payment is required and no signing key is configured.
pub fn payment_prompt(challenge: &PaymentRequirementsResponse, domain: &PaymentDomain) -> String {
    let Some(first) = challenge.accepts.first() else {
        return format!(
            "Payment required, but none of the {} payment method(s) offered by the gateway \
             can be signed by this client. See paymentRequirements.unsupported.",
            challenge.unsupported.len()
        );
    };

    let amount = format_atomic_amount(&first.max_amount_required, domain.token_decimals)
        .map(|a| describe_amount(&a, &domain.token_symbol))
        .unwrap_or_else(|_| format!("{} (smallest units)", first.max_amount_required));

    let mut prompt = format!(
        "Payment required: up to {amount} to {} on {}.",
        first.pay_to, first.network
    );
    if let Some(extra) = &first.extra {
        if let Some(cost) = &extra.estimated_cost {
            prompt.push_str(&format!(
                " Estimated cost: {}.",
                describe_amount(cost, &domain.token_symbol)
            ));
        }
        if let Some(credit) = &extra.available_credit {
            prompt.push_str(&format!(
                " Available credit: {}.",
                describe_amount(credit, &domain.token_symbol)
            ));
        }
        if let Some(due) = &extra.amount_due {
            prompt.push_str(&format!(
                " Amount due: {}.",
                describe_amount(due, &domain.token_symbol)
            ));
        }
    }
    prompt.push_str(&format!(
        " No signing key is configured: sign an EIP-3009 authorization for one of the {} \
         accepted requirement(s) and resend the query with the X-PAYMENT header.",
        challenge.accepts.len()
    ));
    prompt
}

fn describe_settlement(settlement: &SettlementResult, domain: &PaymentDomain) -> String {
    if settlement.success {
        format!(
            "Settled on {} in tx {} ({}).",
            settlement.network,
            settlement.transaction,
            domain.tx_url(&settlement.transaction)
        )
    } else {
        format!(
            "Settlement on {} reported failure (tx {}).",
            settlement.network, settlement.transaction
        )
    }
}

/// One-paragraph human summary of a result.
pub fn summarize(result: &QueryResult, domain: &PaymentDomain) -> String {
    match result {
        QueryResult::Success(s) => {
            let mut out = format!(
                "Query returned {} row{}.",
                s.row_count,
                if s.row_count == 1 { "" } else { "s" }
            );
            match (&s.actual_cost, &s.estimated_cost) {
                (Some(actual), _) => out.push_str(&format!(
                    " Cost: {}.",
                    describe_amount(actual, &domain.token_symbol)
                )),
                (None, Some(estimated)) => out.push_str(&format!(
                    " Estimated cost: {}.",
                    describe_amount(estimated, &domain.token_symbol)
                )),
                (None, None) => {}
            }
            match s.payment_source {
                Some(PaymentSource::Credit) => out.push_str(" Covered by gateway credit."),
                Some(PaymentSource::Payment) => out.push_str(" Paid by signed authorization."),
                Some(PaymentSource::Unknown) | None => {}
            }
            if let Some(settlement) = &s.settlement {
                out.push(' ');
                out.push_str(&describe_settlement(settlement, domain));
            }
            if let Some(time) = &s.execution_time {
                out.push_str(&format!(" Execution time: {time}."));
            }
            out
        }
        QueryResult::PaymentRequired(p) => p.message.clone(),
        QueryResult::Failed(e) => {
            let mut out = format!("Query failed: {e}");
            if e.is_retryable() {
                out.push_str(" (network failure; safe to retry)");
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{PaymentRequired, QueryError, QuerySuccess};
    use crate::transport::TransportError;
    use alloy::primitives::Address;
    use x402::{PaymentRequirement, RequirementExtra, ValidationError, USDC_BASE_SEPOLIA};

    fn challenge() -> PaymentRequirementsResponse {
        PaymentRequirementsResponse {
            x402_version: 1,
            error: Some("Payment required".to_string()),
            accepts: vec![PaymentRequirement {
                scheme: "exact".to_string(),
                network: "base-sepolia".to_string(),
                max_amount_required: "50".to_string(),
                resource: "https://gateway.example/api/query".to_string(),
                description: None,
                mime_type: None,
                pay_to: Address::repeat_byte(0x22),
                max_timeout_seconds: 60,
                asset: USDC_BASE_SEPOLIA,
                extra: Some(RequirementExtra {
                    estimated_cost: Some("0.000050".to_string()),
                    available_credit: Some("0".to_string()),
                    amount_due: Some("0.000050".to_string()),
                    ..RequirementExtra::default()
                }),
            }],
            unsupported: vec![],
        }
    }

    fn success() -> QueryResult {
        let mut row = Row::new();
        row.insert("id".to_string(), serde_json::json!(1));
        row.insert("title".to_string(), serde_json::json!("Invoice"));
        QueryResult::Success(QuerySuccess {
            rows: vec![row],
            row_count: 1,
            estimated_cost: Some("0.000050".to_string()),
            actual_cost: Some("0.000050".to_string()),
            execution_time: Some(serde_json::Number::from(12)),
            settlement: Some(SettlementResult {
                success: true,
                payer: None,
                transaction: format!("0x{}", "cd".repeat(32)),
                network: "base-sepolia".to_string(),
                timestamp: None,
            }),
            payment_source: Some(PaymentSource::Payment),
        })
    }

    #[test]
    fn test_success_response_shape() {
        let json = serde_json::to_value(QueryResponse::from(&success())).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["rowCount"], 1);
        assert_eq!(json["rows"][0]["title"], "Invoice");
        assert_eq!(json["actualCost"], "0.000050");
        assert_eq!(json["paymentSource"], "payment");
        assert_eq!(json["executionTime"], 12);
        assert!(json.get("paymentRequired").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_payment_required_response_shape() {
        let result = QueryResult::PaymentRequired(PaymentRequired {
            message: payment_prompt(&challenge(), &PaymentDomain::default()),
            requirements: challenge(),
        });
        let json = serde_json::to_value(QueryResponse::from(&result)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["paymentRequired"], true);
        assert_eq!(json["paymentRequirements"]["accepts"].as_array().unwrap().len(), 1);
        assert!(json.get("error").is_none());
        assert!(json.get("rows").is_none());
    }

    #[test]
    fn test_failed_response_shape() {
        let result = QueryResult::Failed(QueryError::Gateway {
            status: 500,
            payload: serde_json::json!({"error": "boom"}),
        });
        let json = serde_json::to_value(QueryResponse::from(&result)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errorKind"], "gateway");
        assert_eq!(json["errorDetails"]["error"], "boom");
        assert_eq!(json["retryable"], false);
        assert!(json.get("paymentRequired").is_none());
    }

    #[test]
    fn test_prompt_mentions_amount_and_payee() {
        let prompt = payment_prompt(&challenge(), &PaymentDomain::default());
        assert!(prompt.contains("0.000050 USDC"), "{prompt}");
        assert!(prompt.contains(&Address::repeat_byte(0x22).to_string()));
        assert!(prompt.contains("X-PAYMENT"));
        assert!(prompt.contains("Available credit: 0 USDC"));
    }

    #[test]
    fn test_prompt_when_only_unsupported_methods_are_offered() {
        let challenge = PaymentRequirementsResponse {
            x402_version: 1,
            error: None,
            accepts: vec![],
            unsupported: vec![serde_json::json!({"network": "solana-devnet"})],
        };
        let prompt = payment_prompt(&challenge, &PaymentDomain::default());
        assert!(prompt.contains("none of the 1 payment method(s)"), "{prompt}");
    }

    #[test]
    fn test_summary_of_success() {
        let summary = summarize(&success(), &PaymentDomain::default());
        assert!(summary.starts_with("Query returned 1 row."));
        assert!(summary.contains("Cost: 0.000050 USDC."));
        assert!(summary.contains("https://sepolia.basescan.org/tx/0x"));
    }

    #[test]
    fn test_summary_of_credit_without_settlement() {
        let result = QueryResult::Success(QuerySuccess {
            rows: vec![],
            row_count: 0,
            estimated_cost: Some("0.00001".to_string()),
            actual_cost: None,
            execution_time: None,
            settlement: None,
            payment_source: Some(PaymentSource::Credit),
        });
        let summary = summarize(&result, &PaymentDomain::default());
        assert!(summary.contains("0 rows"));
        assert!(summary.contains("Estimated cost: 0.00001 USDC."));
        assert!(summary.contains("credit"));
        assert!(!summary.contains("tx"));
    }

    #[test]
    fn test_summary_of_failures() {
        let validation = QueryResult::Failed(QueryError::Validation(
            ValidationError::ForbiddenOperation("DROP"),
        ));
        assert!(summarize(&validation, &PaymentDomain::default()).contains("DROP"));

        let transport = QueryResult::Failed(QueryError::Transport(TransportError::Timeout(
            "deadline".to_string(),
        )));
        assert!(summarize(&transport, &PaymentDomain::default()).contains("safe to retry"));
    }
}
