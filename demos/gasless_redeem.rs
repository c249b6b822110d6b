use polymarket_sdk::config::{Registry, RelayConfig, POLYGON};
use polymarket_sdk::web3::{GaslessClient, HttpRpcClient, RelayClient, WalletLocks};
use polymarket_sdk::web3::RedeemPosition;
use polymarket_sdk::{BuilderCreds, PrivateKeySigner, Result, SignatureType, B256};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let private_key =
        std::env::var("PRIVATE_KEY").expect("PRIVATE_KEY environment variable not set");
    let rpc_url = std::env::var("RPC_URL").unwrap_or_else(|_| "https://polygon-rpc.com".to_string());
    let signer = PrivateKeySigner::from_str(&private_key).expect("Invalid private key");

    // Builder credentials sign relay requests locally; without them the
    // remote signing service is used.
    let builder_creds = match (
        std::env::var("BUILDER_API_KEY"),
        std::env::var("BUILDER_SECRET"),
        std::env::var("BUILDER_PASSPHRASE"),
    ) {
        (Ok(key), Ok(secret), Ok(passphrase)) => Some(BuilderCreds::new(key, secret, passphrase)),
        _ => None,
    };

    let registry = Registry::polymarket();
    let relay_config = RelayConfig::default();
    let relay = RelayClient::from_config(&relay_config, builder_creds);

    let gasless = GaslessClient::new(
        Arc::new(signer),
        SignatureType::PolyProxy,
        *registry.chain(POLYGON)?,
        Arc::new(HttpRpcClient::new(&rpc_url)?),
        Arc::new(relay),
        Arc::new(WalletLocks::new()),
    )
    .await?
    .with_relay_config(relay_config);
    println!("Owner {} / proxy wallet {}", gasless.owner(), gasless.wallet());

    // Condition ids of resolved markets to redeem, comma separated
    let conditions = std::env::var("CONDITION_IDS").unwrap_or_default();
    let positions: Vec<RedeemPosition> = conditions
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| B256::from_str(s.trim()).map(RedeemPosition::new))
        .collect::<std::result::Result<_, _>>()
        .expect("Invalid condition id");

    if positions.is_empty() {
        println!("Set CONDITION_IDS to redeem positions");
        return Ok(());
    }

    // All markets go out in one relay transaction
    let receipt = gasless.redeem_many(&positions).await?;
    println!(
        "Redeemed {} markets in {} (status {}, block {})",
        positions.len(),
        receipt.tx_hash,
        receipt.status,
        receipt.block_number
    );

    Ok(())
}
