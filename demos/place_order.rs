use polymarket_sdk::client::TradingClient;
use polymarket_sdk::config::{DEFAULT_CLOB_HOST, POLYGON};
use polymarket_sdk::orders::OrderBuilder;
use polymarket_sdk::types::{CreateOrderOptions, MarketOrderArgs, OrderArgs, OrderType, Side, SignatureType};
use polymarket_sdk::{PrivateKeySigner, Result};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let private_key =
        std::env::var("PRIVATE_KEY").expect("PRIVATE_KEY environment variable not set");
    let signer = PrivateKeySigner::from_str(&private_key).expect("Invalid private key");
    println!("Signer address: {}", signer.address());

    // Step 1: L1 client, then derive API credentials to reach L2
    let order_builder = OrderBuilder::new(signer, Some(SignatureType::Eoa), None);
    let client = TradingClient::new(DEFAULT_CLOB_HOST, POLYGON).with_signer(order_builder);
    println!("Auth level: {}", client.auth_level());

    let creds = client.create_or_derive_api_creds(None).await?;
    println!("API key: {}", creds.api_key);
    println!("Auth level: {}", client.auth_level());

    let token_id = "109648317055340591503076024421581448189531885907475125926203413622318314876012";

    // Step 2: a limit order; tick size and neg-risk are looked up and cached
    println!("\n2. Creating a limit order...");
    let args = OrderArgs::new(
        token_id,
        Decimal::from_str("0.50").unwrap(),
        Decimal::from_str("10.0").unwrap(),
        Side::Buy,
    );
    let order = client
        .create_order(&args, None, None, CreateOrderOptions::default())
        .await?;
    println!(
        "Signed order: maker {} / taker {} (signature {})",
        order.maker_amount, order.taker_amount, order.signature
    );

    // Step 3: price a market order against the live book
    println!("\n3. Pricing a $5 market buy...");
    let market = MarketOrderArgs::new(token_id, Decimal::from_str("5").unwrap(), Side::Buy);
    match client
        .calculate_market_price(&market.token_id, market.side, market.amount, OrderType::FOK)
        .await
    {
        Ok(price) => println!("Market price: {}", price),
        Err(polymarket_sdk::Error::NoMatch) => println!("Book too thin for a FOK order"),
        Err(e) => return Err(e),
    }

    // Uncomment to post:
    // let response = client.post_order(order, OrderType::GTC, false).await?;
    // println!("Order posted: {:?}", response);

    println!("\nExample completed (no order posted)");
    Ok(())
}
