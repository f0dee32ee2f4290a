use alloy::primitives::Address;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use x402::{
    decode_settlement_header, encode_payment_header, validate_address, validate_query,
    PaymentDomain, PaymentRequirementsResponse, SchemeClient, SettlementResult, ValidationError,
    API_KEY_HEADER, PAYMENT_HEADER, PAYMENT_RESPONSE_HEADER, QUERY_ENDPOINT_PATH,
};

use crate::config::{ClientConfig, ConfigError};
use crate::format::payment_prompt;
use crate::result::{PaymentRequired, PaymentSource, QueryError, QueryResult, QuerySuccess, Row};
use crate::scheme_client::Eip3009SchemeClient;
use crate::transport::{GatewayTransport, HttpTransport, TransportResponse};

/// Request body, identical on both attempts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    sql: &'a str,
    agent_wallet: &'a str,
    provider_id: &'a str,
}

/// Success body. Every field is optional; the gateway omits what it doesn't know.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponseBody {
    #[serde(default)]
    rows: Option<Vec<Row>>,
    #[serde(default)]
    row_count: Option<serde_json::Value>,
    #[serde(
        default,
        deserialize_with = "x402::money::deserialize_opt_decimal_string"
    )]
    estimated_cost: Option<String>,
    #[serde(
        default,
        deserialize_with = "x402::money::deserialize_opt_decimal_string"
    )]
    actual_cost: Option<String>,
    #[serde(default)]
    execution_time: Option<serde_json::Value>,
    #[serde(default)]
    payment_source: Option<PaymentSource>,
}

/// Query client that pays for queries on demand.
///
/// Sends the query, and on a 402 challenge signs an EIP-3009 authorization
/// for the first accepted requirement via the provided [`SchemeClient`],
/// then retries once with the `X-PAYMENT` header. Without a scheme client
/// the challenge is handed back to the caller instead.
///
/// Holds no per-call state, so one client can serve concurrent queries.
/// Dropping an in-flight [`execute_query`](Self::execute_query) future
/// discards any authorization that was signed but not yet sent.
pub struct QueryClient<T: GatewayTransport, S: SchemeClient> {
    transport: T,
    scheme: Option<S>,
    provider_id: String,
    api_key: HeaderValue,
    endpoint_path: String,
    domain: PaymentDomain,
}

impl<T: GatewayTransport, S: SchemeClient> std::fmt::Debug for QueryClient<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("provider_id", &self.provider_id)
            .field("endpoint_path", &self.endpoint_path)
            .field("signer", &self.scheme.as_ref().map(|s| s.address()))
            .finish_non_exhaustive()
    }
}

impl QueryClient<HttpTransport, Eip3009SchemeClient> {
    /// Build an HTTP-backed client from an explicit config.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(&config.gateway_url, config.timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let mut client = Self::new(transport, &config.provider_id, &config.api_key)?
            .with_endpoint_path(&config.endpoint_path)
            .with_domain(config.domain.clone());
        if let Some(key) = &config.signing_key {
            client = client.with_scheme(Eip3009SchemeClient::with_domain(
                key.clone(),
                config.domain.clone(),
            ));
        }
        Ok(client)
    }
}

impl<T: GatewayTransport, S: SchemeClient> QueryClient<T, S> {
    /// Create a client with no signer. 402 challenges are returned to the caller.
    pub fn new(transport: T, provider_id: &str, api_key: &str) -> Result<Self, ConfigError> {
        let mut api_key = HeaderValue::from_str(api_key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        Ok(Self {
            transport,
            scheme: None,
            provider_id: provider_id.to_string(),
            api_key,
            endpoint_path: QUERY_ENDPOINT_PATH.to_string(),
            domain: PaymentDomain::default(),
        })
    }

    /// Attach a signer so challenges are paid automatically.
    pub fn with_scheme(mut self, scheme: S) -> Self {
        self.scheme = Some(scheme);
        self
    }

    pub fn with_endpoint_path(mut self, endpoint_path: &str) -> Self {
        self.endpoint_path = endpoint_path.to_string();
        self
    }

    /// Domain used when formatting amounts and explorer links.
    pub fn with_domain(mut self, domain: PaymentDomain) -> Self {
        self.domain = domain;
        self
    }

    pub fn domain(&self) -> &PaymentDomain {
        &self.domain
    }

    pub fn has_signer(&self) -> bool {
        self.scheme.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one query to completion. Never panics on gateway or network
    /// failure; every outcome is a [`QueryResult`].
    pub async fn execute_query(&self, query: &str, caller_address: &str) -> QueryResult {
        match self.run(query, caller_address).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "query failed");
                QueryResult::Failed(e)
            }
        }
    }

    async fn run(&self, query: &str, caller_address: &str) -> Result<QueryResult, QueryError> {
        validate_query(query)?;
        validate_address(caller_address)?;
        let from: Address = caller_address
            .parse()
            .map_err(|_| ValidationError::InvalidAddress(caller_address.to_string()))?;

        let body = serde_json::to_value(QueryRequest {
            sql: query,
            agent_wallet: caller_address,
            provider_id: &self.provider_id,
        })
        .map_err(|e| QueryError::Protocol(format!("failed to encode request: {e}")))?;

        tracing::info!(provider = %self.provider_id, wallet = %caller_address, "sending query");
        let first = self
            .transport
            .post(&self.endpoint_path, self.base_headers(), &body)
            .await?;

        if first.status.is_success() {
            return self.settled(&first).map(QueryResult::Success);
        }
        if first.status != StatusCode::PAYMENT_REQUIRED {
            return Err(QueryError::Gateway {
                status: first.status.as_u16(),
                payload: error_payload(&first),
            });
        }

        let challenge: PaymentRequirementsResponse = first
            .json()
            .map_err(|e| QueryError::Protocol(format!("invalid 402 body: {e}")))?;
        tracing::debug!(
            x402_version = challenge.x402_version,
            accepts = challenge.accepts.len(),
            error = ?challenge.error,
            "payment challenge"
        );

        // Ordering: an empty challenge fails before the manual-payment exit, so
        // a PaymentRequired result always carries at least one requirement.
        if challenge.is_empty() {
            return Err(QueryError::Protocol(
                "no payment requirement returned".to_string(),
            ));
        }

        let Some(scheme) = &self.scheme else {
            tracing::info!(
                accepts = challenge.accepts.len(),
                "payment required and no signing key configured"
            );
            let message = payment_prompt(&challenge, &self.domain);
            return Ok(QueryResult::PaymentRequired(PaymentRequired {
                requirements: challenge,
                message,
            }));
        };

        // List order is the gateway's preference.
        let Some(requirement) = challenge.accepts.first() else {
            return Err(QueryError::Protocol(format!(
                "none of the {} payment requirement(s) returned can be signed by this client",
                challenge.unsupported.len()
            )));
        };
        tracing::info!(
            amount = %requirement.max_amount_required,
            pay_to = %requirement.pay_to,
            network = %requirement.network,
            "signing payment authorization"
        );

        let header = scheme
            .create_payment_header(challenge.x402_version, requirement, from)
            .await
            .map_err(|e| QueryError::Signing(e.to_string()))?;
        let encoded =
            encode_payment_header(&header).map_err(|e| QueryError::Signing(e.to_string()))?;
        let encoded = HeaderValue::from_str(&encoded)
            .map_err(|e| QueryError::Signing(format!("payment header is not ASCII: {e}")))?;

        let mut headers = self.base_headers();
        headers.insert(PAYMENT_HEADER, encoded);

        tracing::info!("retrying query with payment");
        let retry = self
            .transport
            .post(&self.endpoint_path, headers, &body)
            .await?;

        if retry.status.is_success() {
            return self.settled(&retry).map(QueryResult::Success);
        }

        let status = retry.status.as_u16();
        let payload = error_payload(&retry);
        if retry.status == StatusCode::PAYMENT_REQUIRED {
            Err(QueryError::PaymentRejected { status, payload })
        } else {
            Err(QueryError::Gateway { status, payload })
        }
    }

    fn base_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers
    }

    fn settled(&self, resp: &TransportResponse) -> Result<QuerySuccess, QueryError> {
        let settlement = resp
            .header(PAYMENT_RESPONSE_HEADER)
            .and_then(|raw| match decode_settlement_header(raw) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed settlement header");
                    None
                }
            });

        let body: QueryResponseBody = if resp.body.iter().all(u8::is_ascii_whitespace) {
            QueryResponseBody::default()
        } else {
            match resp.json() {
                Ok(body) => body,
                Err(e) => return Err(unreadable_body(e, settlement.as_ref())),
            }
        };

        let rows = body.rows.unwrap_or_default();
        let row_count = body
            .row_count
            .as_ref()
            .and_then(parse_count)
            .unwrap_or(rows.len() as u64);
        let execution_time = match body.execution_time {
            Some(serde_json::Value::Number(n)) => Some(n),
            Some(other) => {
                tracing::debug!(value = %other, "ignoring non-numeric executionTime");
                None
            }
            None => None,
        };

        tracing::info!(
            row_count,
            payment_source = ?body.payment_source,
            transaction = settlement.as_ref().map(|s| s.transaction.as_str()),
            "query succeeded"
        );

        Ok(QuerySuccess {
            rows,
            row_count,
            estimated_cost: body.estimated_cost,
            actual_cost: body.actual_cost,
            execution_time,
            settlement,
            payment_source: body.payment_source,
        })
    }
}

/// A body that can't be read after settlement must still report the payment.
fn unreadable_body(
    error: serde_json::Error,
    settlement: Option<&SettlementResult>,
) -> QueryError {
    match settlement {
        Some(s) => {
            tracing::warn!(
                transaction = %s.transaction,
                network = %s.network,
                error = %error,
                "payment settled but query response body is unreadable"
            );
            QueryError::Protocol(format!(
                "invalid query response body (payment settled in tx {} on {}): {error}",
                s.transaction, s.network
            ))
        }
        None => QueryError::Protocol(format!("invalid query response body: {error}")),
    }
}

/// `rowCount` as a JSON number or a decimal string.
fn parse_count(value: &serde_json::Value) -> Option<u64> {
    let count = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if count.is_none() {
        tracing::debug!(%value, "ignoring unreadable rowCount");
    }
    count
}

/// Best-effort JSON error body, falling back to the status text.
fn error_payload(resp: &TransportResponse) -> serde_json::Value {
    serde_json::from_slice(&resp.body).unwrap_or_else(|_| {
        serde_json::Value::String(
            resp.status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string(),
        )
    })
}
