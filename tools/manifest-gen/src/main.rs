//! Realm256 Manifest Generator
//!
//! Takes a dApp instantiation transaction id, queries the gateway for the
//! entities it created, writes them into `global_config.json` and regenerates
//! the transaction manifests used for testing.
//!
//! `global_config.json` is shared with the automated jobs, so every run also
//! changes what those jobs see.
//!
//! # Usage
//!
//! ```bash
//! # Run from the transaction-manifest directory
//! realm-manifest-gen txid_tdx_2_1...
//!
//! # Refuse to merge when the entity count does not match dapp_instant_info
//! realm-manifest-gen txid_tdx_2_1... --strict
//!
//! # Query another network's gateway
//! realm-manifest-gen txid_tdx_2_1... --network mainnet -v
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use realm_manifest_instantiation::{
    ConfigDocument, ConfigMerger, ConfigStore, EntityExtractor, GatewayClient,
    InstantiationPipeline, MergePolicy, TransactionId, DEFAULT_CONFIG_PATH, DEFAULT_NETWORK,
    DEFAULT_OUTPUT_DIR, DEFAULT_TEMPLATES_DIR,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable overriding the gateway base URL from the config
const GATEWAY_URL_ENV: &str = "REALM_GATEWAY_URL";

/// Printed when no transaction id is given
const USAGE_MESSAGE: &str = "Please provide transaction id as an argument.";

/// Regenerate transaction manifests from a dApp instantiation transaction
#[derive(Parser, Debug)]
#[command(name = "realm-manifest-gen")]
#[command(author, version)]
#[command(about = "Update global_config.json from an instantiation transaction and regenerate manifests")]
struct Args {
    /// Instantiation transaction id (intent hash)
    transaction_id: Option<String>,

    /// Path to the shared global config
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory containing .rtm templates
    #[arg(short, long, default_value = DEFAULT_TEMPLATES_DIR)]
    templates: PathBuf,

    /// Directory manifests are written to (cleared first)
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Network whose gateway_url_base entry is queried
    #[arg(short, long, default_value = DEFAULT_NETWORK)]
    network: String,

    /// Fail unless the transaction yields exactly one value per dapp_instant_info key
    #[arg(long)]
    strict: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn merge_policy(&self) -> MergePolicy {
        if self.strict {
            MergePolicy::Strict
        } else {
            MergePolicy::Lenient
        }
    }
}

/// Gateway base URL: the environment override, else the config entry for `network`
fn resolve_gateway_url(
    document: &ConfigDocument,
    network: &str,
    env_override: Option<String>,
) -> Result<String> {
    if let Some(url) = env_override.filter(|u| !u.is_empty()) {
        return Ok(url);
    }
    Ok(document.gateway_url(network)?.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    let filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    let Some(transaction_id) = args.transaction_id.clone() else {
        println!("{}", USAGE_MESSAGE);
        return Ok(());
    };
    let transaction_id = TransactionId::new(transaction_id);

    let store = ConfigStore::new(&args.config);
    let document = store
        .load()
        .with_context(|| format!("Failed to obtain {}", args.config.display()))?;

    let gateway_url =
        resolve_gateway_url(&document, &args.network, std::env::var(GATEWAY_URL_ENV).ok())?;
    tracing::debug!(%gateway_url, network = %args.network, "Using gateway");

    let gateway = GatewayClient::new(gateway_url)?;
    let pipeline = InstantiationPipeline::new(
        EntityExtractor::new(gateway),
        store,
        &args.templates,
        &args.output,
    )
    .with_merger(ConfigMerger::new(args.merge_policy()));

    let summary = pipeline
        .run(document, &transaction_id)
        .await
        .with_context(|| format!("Manifest generation failed for transaction {}", transaction_id))?;

    println!(
        "Updated {} with {} value(s) and generated {} manifest(s) in {}",
        args.config.display(),
        summary.updated_keys.len(),
        summary.manifests.len(),
        args.output.display()
    );

    Ok(())
}
