use std::time::Duration;

use alloy::signers::local::PrivateKeySigner;
use url::Url;

use x402::{PaymentDomain, QUERY_ENDPOINT_PATH};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a [`QueryClient`](crate::QueryClient) needs, passed explicitly.
#[derive(Clone)]
pub struct ClientConfig {
    /// Gateway base URL
    pub gateway_url: String,
    /// Provider identity sent with every query
    pub provider_id: String,
    /// Gateway API key, sent on every attempt
    pub api_key: String,
    /// Signing key for automatic payment (None = return requirements to caller)
    pub signing_key: Option<PrivateKeySigner>,
    /// Query endpoint path on the gateway
    pub endpoint_path: String,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Typed-data domain authorizations are signed under
    pub domain: PaymentDomain,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("gateway_url", &self.gateway_url)
            .field("provider_id", &self.provider_id)
            .field("api_key", &"[REDACTED]")
            .field(
                "signing_key",
                &self.signing_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_path", &self.endpoint_path)
            .field("timeout", &self.timeout)
            .field("domain", &self.domain)
            .finish()
    }
}

impl ClientConfig {
    /// Build a config with defaults for everything optional.
    pub fn new(
        gateway_url: impl Into<String>,
        provider_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let gateway_url = gateway_url.into();
        let parsed =
            Url::parse(&gateway_url).map_err(|_| ConfigError::InvalidUrl(gateway_url.clone()))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            return Err(ConfigError::InvalidUrl(gateway_url));
        }

        let provider_id = provider_id.into();
        if provider_id.trim().is_empty() {
            return Err(ConfigError::MissingRequired("PROVIDER_ID"));
        }
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired("GATEWAY_API_KEY"));
        }

        Ok(Self {
            gateway_url,
            provider_id,
            api_key,
            signing_key: None,
            endpoint_path: QUERY_ENDPOINT_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            domain: PaymentDomain::default(),
        })
    }

    pub fn with_signing_key(mut self, signing_key: PrivateKeySigner) -> Self {
        self.signing_key = Some(signing_key);
        self
    }

    pub fn with_endpoint_path(mut self, endpoint_path: impl Into<String>) -> Self {
        self.endpoint_path = endpoint_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_domain(mut self, domain: PaymentDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Read the config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Required
        let gateway_url =
            get("GATEWAY_URL").ok_or(ConfigError::MissingRequired("GATEWAY_URL"))?;
        let provider_id =
            get("PROVIDER_ID").ok_or(ConfigError::MissingRequired("PROVIDER_ID"))?;
        let api_key =
            get("GATEWAY_API_KEY").ok_or(ConfigError::MissingRequired("GATEWAY_API_KEY"))?;

        let mut config = Self::new(gateway_url, provider_id, api_key)?;

        // Optional: signing key
        if let Some(key) = get("EVM_PRIVATE_KEY") {
            let signer: PrivateKeySigner = key
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPrivateKey)?;
            config.signing_key = Some(signer);
        } else {
            tracing::info!("EVM_PRIVATE_KEY not set, payment challenges will be returned to the caller");
        }

        // Optional: endpoint path
        if let Some(path) = get("QUERY_ENDPOINT_PATH") {
            config.endpoint_path = path;
        }

        // Optional: timeout
        if let Some(secs) = get("GATEWAY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimeout(secs.clone()))?;
            if secs == 0 {
                return Err(ConfigError::InvalidTimeout(secs.to_string()));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration value: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid EVM_PRIVATE_KEY")]
    InvalidPrivateKey,

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid API key: must be a valid HTTP header value")]
    InvalidApiKey,

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
