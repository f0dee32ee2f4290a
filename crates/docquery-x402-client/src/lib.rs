//! Client for paid SQL queries against an x402 document gateway.
//!
//! Handles the HTTP 402 payment flow: validate -> request -> 402 -> sign -> retry.
//! Without a signing key the 402 challenge is returned to the caller with a
//! prompt, so payment can be made out of band.
//!
//! # Quick Example
//!
//! ```no_run
//! use alloy::signers::local::PrivateKeySigner;
//! use x402_client::{ClientConfig, QueryClient, QueryResult};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let signer: PrivateKeySigner = "0xYOUR_KEY".parse()?;
//! let config = ClientConfig::new("https://gateway.example", "docs-provider", "API_KEY")?
//!     .with_signing_key(signer);
//! let client = QueryClient::from_config(&config)?;
//!
//! let result = client
//!     .execute_query(
//!         "SELECT * FROM documents LIMIT 5",
//!         "0x1111111111111111111111111111111111111111",
//!     )
//!     .await;
//!
//! if let QueryResult::Success(s) = &result {
//!     println!("{} rows", s.row_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod format;
mod query_client;
pub mod result;
mod scheme_client;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use format::{payment_prompt, summarize, QueryResponse};
pub use query_client::QueryClient;
pub use result::{PaymentRequired, PaymentSource, QueryError, QueryResult, QuerySuccess, Row};
pub use scheme_client::Eip3009SchemeClient;
pub use transport::{GatewayTransport, HttpTransport, TransportError, TransportResponse};

// Re-export commonly needed types from core
pub use x402::{
    PaymentDomain, PaymentHeader, PaymentRequirement, PaymentRequirementsResponse, SchemeClient,
    SettlementResult, ValidationError, X402Error, SCHEME_NAME,
};
