//! Uniform outcome of one query orchestration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use x402::{PaymentRequirementsResponse, SettlementResult, ValidationError};

use crate::transport::TransportError;

/// One result row. Column order is preserved as returned by the gateway.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// How the gateway covered the cost of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentSource {
    /// A signed authorization was settled on-chain.
    Payment,
    /// Standing gateway credit covered the query.
    Credit,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for PaymentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentSource::Payment => write!(f, "payment"),
            PaymentSource::Credit => write!(f, "credit"),
            PaymentSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// Why a query failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The gateway refused a signed authorization.
    #[error("payment rejected by gateway (HTTP {status}): {payload}")]
    PaymentRejected {
        status: u16,
        payload: serde_json::Value,
    },

    /// Any other non-2xx response.
    #[error("gateway error (HTTP {status}): {payload}")]
    Gateway {
        status: u16,
        payload: serde_json::Value,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to sign payment authorization: {0}")]
    Signing(String),

    /// The gateway answered with a body this client cannot interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl QueryError {
    /// Short machine-readable category.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::Validation(_) => "validation",
            QueryError::PaymentRejected { .. } => "payment_rejected",
            QueryError::Gateway { .. } => "gateway",
            QueryError::Transport(_) => "transport",
            QueryError::Signing(_) => "signing",
            QueryError::Protocol(_) => "protocol",
        }
    }

    /// Only network failures are worth retrying unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::Transport(_))
    }
}

/// Rows and accounting from a successful query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySuccess {
    pub rows: Vec<Row>,
    pub row_count: u64,
    pub estimated_cost: Option<String>,
    pub actual_cost: Option<String>,
    pub execution_time: Option<serde_json::Number>,
    pub settlement: Option<SettlementResult>,
    pub payment_source: Option<PaymentSource>,
}

/// The gateway wants payment and no signing key is configured.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequired {
    pub requirements: PaymentRequirementsResponse,
    /// Human-readable prompt for out-of-band signing.
    pub message: String,
}

/// Outcome of [`QueryClient::execute_query`](crate::QueryClient::execute_query).
///
/// Exactly one variant is populated, so a success always carries rows and a
/// failure carries either the payment requirements or an error, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Success(QuerySuccess),
    PaymentRequired(PaymentRequired),
    Failed(QueryError),
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryResult::Success(_))
    }

    pub fn is_payment_required(&self) -> bool {
        matches!(self, QueryResult::PaymentRequired(_))
    }

    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Success(s) => Some(&s.rows),
            _ => None,
        }
    }

    pub fn row_count(&self) -> Option<u64> {
        match self {
            QueryResult::Success(s) => Some(s.row_count),
            _ => None,
        }
    }

    pub fn settlement(&self) -> Option<&SettlementResult> {
        match self {
            QueryResult::Success(s) => s.settlement.as_ref(),
            _ => None,
        }
    }

    pub fn payment_source(&self) -> Option<PaymentSource> {
        match self {
            QueryResult::Success(s) => s.payment_source,
            _ => None,
        }
    }

    pub fn payment_requirements(&self) -> Option<&PaymentRequirementsResponse> {
        match self {
            QueryResult::PaymentRequired(p) => Some(&p.requirements),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&QueryError> {
        match self {
            QueryResult::Failed(e) => Some(e),
            _ => None,
        }
    }
}
