use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use x402_client::{summarize, ClientConfig, QueryClient, QueryResponse, QueryResult};

/// Run a paid SQL query against the document gateway.
#[derive(Debug, Parser)]
#[command(name = "docquery", version, about)]
struct Cli {
    /// Read-only SQL query
    sql: String,

    /// Wallet address the query is billed to (defaults to the signing key's address)
    #[arg(long, env = "AGENT_WALLET")]
    wallet: Option<String>,

    /// Print the full result as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let wallet = match (&cli.wallet, &config.signing_key) {
        (Some(wallet), _) => wallet.clone(),
        (None, Some(key)) => key.address().to_string(),
        (None, None) => {
            tracing::error!("no wallet given: pass --wallet or set EVM_PRIVATE_KEY");
            return std::process::ExitCode::FAILURE;
        }
    };

    let client = match QueryClient::from_config(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to create query client");
            return std::process::ExitCode::FAILURE;
        }
    };

    let result = client.execute_query(&cli.sql, &wallet).await;

    if cli.json {
        match serde_json::to_string_pretty(&QueryResponse::from(&result)) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize result");
                return std::process::ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", summarize(&result, client.domain()));
        if let Some(rows) = result.rows() {
            for row in rows {
                println!("{}", serde_json::Value::Object(row.clone()));
            }
        }
    }

    match result {
        QueryResult::Success(_) => std::process::ExitCode::SUCCESS,
        QueryResult::PaymentRequired(_) => std::process::ExitCode::from(2),
        QueryResult::Failed(_) => std::process::ExitCode::FAILURE,
    }
}
