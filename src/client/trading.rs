use alloy_primitives::U256;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use super::authenticated::AuthenticatedClient;
use super::clob::ClobClient;
use super::metadata::{CachedMetadata, MarketMetadataSource};
use crate::config::Registry;
use crate::error::{Error, Result};
use crate::http::{create_l2_headers, HttpClient};
use crate::orders::{calculate_market_price, price_valid, OrderBuilder, OrderContext};
use crate::types::{
    ApiCreds, AuthLevel, CancelOrdersResponse, CreateOrderOptions, ExtraOrderArgs,
    MarketOrderArgs, OrderArgs, OrderId, OrderType, PostOrder, PostOrderResponse,
    PostOrdersArgs, Side, SignedOrderRequest, TokenId,
};

/// Market parameters after remote lookup and validation
#[derive(Debug, Clone, Copy, PartialEq)]
struct ResolvedMarket {
    tick_size: Decimal,
    neg_risk: bool,
    fee_rate_bps: u32,
}

/// Client for order creation, submission and cancellation
///
/// The authentication level is derived from what the client holds: no signer
/// is L0, a signer is L1, a signer plus API credentials is L2. Creating orders
/// needs L1, posting and cancelling needs L2.
pub struct TradingClient {
    http_client: HttpClient,
    host: String,
    chain_id: u64,
    registry: Arc<Registry>,
    order_builder: Option<OrderBuilder>,
    api_creds: RwLock<Option<ApiCreds>>,
    metadata: Arc<dyn MarketMetadataSource>,
}

impl TradingClient {
    /// Create a new L0 TradingClient
    ///
    /// Market metadata is read from the same host and cached per token.
    ///
    /// # Arguments
    /// * `host` - The base URL for the API
    /// * `chain_id` - The chain ID (137 for Polygon, 80002 for Amoy testnet)
    pub fn new(host: impl Into<String>, chain_id: u64) -> Self {
        let host = host.into();
        Self {
            http_client: HttpClient::new(host.clone()),
            metadata: Arc::new(CachedMetadata::new(ClobClient::new(host.clone()))),
            host,
            chain_id,
            registry: Arc::new(Registry::polymarket()),
            order_builder: None,
            api_creds: RwLock::new(None),
        }
    }

    /// Attach a signer (through its order builder), raising the client to L1
    pub fn with_signer(mut self, order_builder: OrderBuilder) -> Self {
        self.order_builder = Some(order_builder);
        self
    }

    pub fn with_api_creds(self, api_creds: ApiCreds) -> Self {
        *self.api_creds.write() = Some(api_creds);
        self
    }

    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_metadata_source(mut self, metadata: Arc<dyn MarketMetadataSource>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Replace the API credentials on a live client.
    ///
    /// Requests already building headers keep the credentials they read.
    pub fn set_api_creds(&self, api_creds: ApiCreds) {
        *self.api_creds.write() = Some(api_creds);
    }

    pub fn api_creds(&self) -> Option<ApiCreds> {
        self.api_creds.read().clone()
    }

    pub fn auth_level(&self) -> AuthLevel {
        match (&self.order_builder, self.api_creds.read().is_some()) {
            (None, _) => AuthLevel::L0,
            (Some(_), false) => AuthLevel::L1,
            (Some(_), true) => AuthLevel::L2,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Create (or derive) API credentials with the signer and start using them
    pub async fn create_or_derive_api_creds(&self, nonce: Option<U256>) -> Result<ApiCreds> {
        let builder = self.require_l1()?;
        let auth = AuthenticatedClient::from_arc(
            self.host.clone(),
            builder.signer().clone(),
            self.chain_id,
            None,
        );
        let creds = auth.create_or_derive_api_key(nonce).await?;
        self.set_api_creds(creds.clone());
        info!(api_key = %creds.api_key, "API credentials set");
        Ok(creds)
    }

    /// Create and sign a limit order (not posted)
    ///
    /// # Arguments
    /// * `order_args` - Order arguments (token_id, price, size, side)
    /// * `expiration` - Optional expiration timestamp (defaults to 0 = no expiration)
    /// * `extras` - Optional extra order parameters (defaults to ExtraOrderArgs::default())
    /// * `options` - Tick size / neg-risk overrides and raw mode
    pub async fn create_order(
        &self,
        order_args: &OrderArgs,
        expiration: Option<u64>,
        extras: Option<&ExtraOrderArgs>,
        options: CreateOrderOptions,
    ) -> Result<SignedOrderRequest> {
        let builder = self.require_l1()?;
        let extras = extras.cloned().unwrap_or_default();

        let market = self
            .resolve_market(&order_args.token_id, &options, extras.fee_rate_bps)
            .await?;
        ensure_price_valid(order_args.price, market.tick_size)?;

        let ctx = self.order_context(&market)?;
        let extras = ExtraOrderArgs {
            fee_rate_bps: market.fee_rate_bps,
            ..extras
        };
        builder.create_order(&ctx, order_args, expiration.unwrap_or(0), &extras)
    }

    /// Create and sign a market order (not posted)
    ///
    /// Without an explicit price the order book is walked to find the price
    /// that fills `amount`.
    pub async fn create_market_order(
        &self,
        order_args: &MarketOrderArgs,
        extras: Option<&ExtraOrderArgs>,
        options: CreateOrderOptions,
    ) -> Result<SignedOrderRequest> {
        let builder = self.require_l1()?;
        let extras = extras.cloned().unwrap_or_default();

        let market = self
            .resolve_market(&order_args.token_id, &options, extras.fee_rate_bps)
            .await?;

        let price = match order_args.price {
            Some(price) => price,
            None if options.raw => {
                return Err(Error::MissingField(
                    "price (market orders in raw mode need an explicit price)".to_string(),
                ))
            }
            None => {
                self.calculate_market_price(
                    &order_args.token_id,
                    order_args.side,
                    order_args.amount,
                    order_args.order_type,
                )
                .await?
            }
        };
        ensure_price_valid(price, market.tick_size)?;

        let ctx = self.order_context(&market)?;
        let extras = ExtraOrderArgs {
            fee_rate_bps: market.fee_rate_bps,
            ..extras
        };
        builder.create_market_order(&ctx, order_args, price, &extras)
    }

    /// Price at which `amount` fills against the current book
    pub async fn calculate_market_price(
        &self,
        token_id: &TokenId,
        side: Side,
        amount: Decimal,
        order_type: OrderType,
    ) -> Result<Decimal> {
        let book = self.metadata.order_book(token_id).await?;
        // use asks for BUY (taking from sellers), bids for SELL (taking from buyers)
        let levels = match side {
            Side::Buy => &book.asks,
            Side::Sell => &book.bids,
        };
        calculate_market_price(side, levels, amount, order_type)
    }

    /// Post a signed order
    ///
    /// # Arguments
    /// * `order` - The signed order to post
    /// * `order_type` - The order type (GTC, FOK, GTD, FAK)
    /// * `post_only` - Reject instead of matching on arrival (GTC and GTD only)
    pub async fn post_order(
        &self,
        order: SignedOrderRequest,
        order_type: OrderType,
        post_only: bool,
    ) -> Result<PostOrderResponse> {
        ensure_post_only(order_type, post_only)?;
        let creds = self.require_l2()?;

        let post_order = PostOrder::new(order, creds.api_key.clone(), order_type, post_only);
        let body = serde_json::to_string(&post_order)?;
        let headers = self.l2_headers(&creds, "POST", "/order", Some(&body))?;

        let response: PostOrderResponse = self
            .http_client
            .post("/order", Some(body), Some(headers))
            .await?;
        info!(order_id = %response.order_id, status = %response.status, "order posted");
        Ok(response)
    }

    /// Post several signed orders in one request
    pub async fn post_orders(&self, orders: Vec<PostOrdersArgs>) -> Result<Vec<PostOrderResponse>> {
        for args in &orders {
            ensure_post_only(args.order_type, args.post_only)?;
        }
        let creds = self.require_l2()?;

        let payload: Vec<PostOrder> = orders
            .into_iter()
            .map(|args| PostOrder::new(args.order, creds.api_key.clone(), args.order_type, args.post_only))
            .collect();
        let body = serde_json::to_string(&payload)?;
        let headers = self.l2_headers(&creds, "POST", "/orders", Some(&body))?;
        debug!(count = payload.len(), "posting orders");

        self.http_client
            .post("/orders", Some(body), Some(headers))
            .await
    }

    /// Create, sign and post a limit order in one step
    pub async fn create_and_post_order(
        &self,
        order_args: &OrderArgs,
        expiration: Option<u64>,
        extras: Option<&ExtraOrderArgs>,
        options: CreateOrderOptions,
        order_type: OrderType,
    ) -> Result<PostOrderResponse> {
        let order = self
            .create_order(order_args, expiration, extras, options)
            .await?;
        self.post_order(order, order_type, false).await
    }

    /// Cancel a specific order
    pub async fn cancel(&self, order_id: &OrderId) -> Result<CancelOrdersResponse> {
        let body = serde_json::json!({ "orderID": order_id.as_str() });
        self.delete_l2("/order", Some(body.to_string())).await
    }

    /// Cancel multiple orders
    pub async fn cancel_orders(&self, order_ids: &[OrderId]) -> Result<CancelOrdersResponse> {
        let ids: Vec<&str> = order_ids.iter().map(|id| id.as_str()).collect();
        self.delete_l2("/orders", Some(serde_json::to_string(&ids)?))
            .await
    }

    /// Cancel all open orders
    pub async fn cancel_all(&self) -> Result<CancelOrdersResponse> {
        self.delete_l2("/cancel-all", None).await
    }

    /// Cancel all orders for a market and/or asset
    pub async fn cancel_market_orders(
        &self,
        market: Option<&str>,
        asset_id: Option<&TokenId>,
    ) -> Result<CancelOrdersResponse> {
        let body = serde_json::json!({
            "market": market.unwrap_or(""),
            "asset_id": asset_id.map(|id| id.as_str()).unwrap_or(""),
        });
        self.delete_l2("/cancel-market-orders", Some(body.to_string()))
            .await
    }

    async fn delete_l2(&self, path: &str, body: Option<String>) -> Result<CancelOrdersResponse> {
        let creds = self.require_l2()?;
        let headers = self.l2_headers(&creds, "DELETE", path, body.as_deref())?;
        self.http_client.delete(path, body, Some(headers)).await
    }

    async fn resolve_market(
        &self,
        token_id: &TokenId,
        options: &CreateOrderOptions,
        user_fee_rate_bps: u32,
    ) -> Result<ResolvedMarket> {
        if options.raw {
            let tick_size = options.tick_size.ok_or_else(|| {
                Error::MissingField("tick_size (required in raw mode)".to_string())
            })?;
            let neg_risk = options.neg_risk.ok_or_else(|| {
                Error::MissingField("neg_risk (required in raw mode)".to_string())
            })?;
            return Ok(ResolvedMarket {
                tick_size,
                neg_risk,
                fee_rate_bps: user_fee_rate_bps,
            });
        }

        let neg_risk = async {
            match options.neg_risk {
                Some(neg_risk) => Ok(neg_risk),
                None => self.metadata.neg_risk(token_id).await,
            }
        };
        let (min_tick_size, neg_risk, market_fee_rate_bps) = futures_util::try_join!(
            self.metadata.tick_size(token_id),
            neg_risk,
            self.metadata.fee_rate_bps(token_id),
        )?;

        Ok(ResolvedMarket {
            tick_size: resolve_tick_size(options.tick_size, min_tick_size)?,
            neg_risk,
            fee_rate_bps: resolve_fee_rate(user_fee_rate_bps, market_fee_rate_bps)?,
        })
    }

    fn order_context(&self, market: &ResolvedMarket) -> Result<OrderContext> {
        let round_config = self.registry.rounding().get(market.tick_size)?;
        let chain = self.registry.chain(self.chain_id)?;
        Ok(OrderContext {
            chain_id: self.chain_id,
            verifying_contract: chain.exchange_for(market.neg_risk),
            round_config,
        })
    }

    fn require_l1(&self) -> Result<&OrderBuilder> {
        self.order_builder
            .as_ref()
            .ok_or_else(|| Error::AuthRequired("a signer is required (L1)".to_string()))
    }

    /// Snapshot of the credentials used for one request
    fn require_l2(&self) -> Result<ApiCreds> {
        self.require_l1()?;
        self.api_creds
            .read()
            .clone()
            .ok_or_else(|| Error::AuthRequired("API credentials are required (L2)".to_string()))
    }

    fn l2_headers(
        &self,
        creds: &ApiCreds,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<crate::http::Headers> {
        let builder = self.require_l1()?;
        create_l2_headers(builder.signer().as_ref(), creds, method, path, body)
    }
}

fn ensure_price_valid(price: Decimal, tick_size: Decimal) -> Result<()> {
    if price_valid(price, tick_size) {
        Ok(())
    } else {
        Err(Error::InvalidOrder(format!(
            "price ({}), min: {} - max: {}",
            price,
            tick_size,
            Decimal::ONE - tick_size
        )))
    }
}

fn ensure_post_only(order_type: OrderType, post_only: bool) -> Result<()> {
    if post_only && !order_type.allows_post_only() {
        return Err(Error::InvalidOrder(format!(
            "post_only orders can only be of type GTC or GTD, got {}",
            order_type.as_str()
        )));
    }
    Ok(())
}

fn resolve_tick_size(requested: Option<Decimal>, min_tick_size: Decimal) -> Result<Decimal> {
    match requested {
        Some(tick) if tick < min_tick_size => Err(Error::InvalidParameter(format!(
            "invalid tick size ({}), minimum for the market is {}",
            tick, min_tick_size
        ))),
        Some(tick) => Ok(tick),
        None => Ok(min_tick_size),
    }
}

fn resolve_fee_rate(user_fee_rate_bps: u32, market_fee_rate_bps: u64) -> Result<u32> {
    if market_fee_rate_bps > 0
        && user_fee_rate_bps > 0
        && u64::from(user_fee_rate_bps) != market_fee_rate_bps
    {
        return Err(Error::InvalidOrder(format!(
            "invalid user provided fee rate: ({}), fee rate for the market must be {}",
            user_fee_rate_bps, market_fee_rate_bps
        )));
    }
    u32::try_from(market_fee_rate_bps).map_err(|_| {
        Error::InvalidParameter(format!("market fee rate {} out of range", market_fee_rate_bps))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::metadata::MockMarketMetadataSource;
    use crate::config::POLYGON;
    use crate::signing::{order_signing_hash, test_utils::test_signer, Order};
    use crate::types::{OrderBookSummary, OrderSummary, SignatureType};
    use alloy_primitives::{hex, PrimitiveSignature};
    use rust_decimal_macros::dec;

    // nothing listens here; any request that slips through fails with Error::Http
    const HOST: &str = "http://127.0.0.1:9";

    fn mock_market(tick: Decimal, neg_risk: bool, fee: u64) -> MockMarketMetadataSource {
        let mut mock = MockMarketMetadataSource::new();
        mock.expect_tick_size().returning(move |_| Ok(tick));
        mock.expect_neg_risk().returning(move |_| Ok(neg_risk));
        mock.expect_fee_rate_bps().returning(move |_| Ok(fee));
        mock
    }

    fn l1_client(metadata: MockMarketMetadataSource) -> TradingClient {
        TradingClient::new(HOST, POLYGON)
            .with_signer(OrderBuilder::new(test_signer(), None, None))
            .with_metadata_source(Arc::new(metadata))
    }

    fn creds() -> ApiCreds {
        ApiCreds::new("key".into(), "c2VjcmV0".into(), "pass".into())
    }

    fn recover(order: &SignedOrderRequest, verifying_contract: alloy_primitives::Address) -> alloy_primitives::Address {
        let typed = Order {
            salt: U256::from(order.salt),
            maker: order.maker,
            signer: order.signer,
            taker: order.taker,
            tokenId: order.token_id.parse().unwrap(),
            makerAmount: order.maker_amount.parse().unwrap(),
            takerAmount: order.taker_amount.parse().unwrap(),
            expiration: order.expiration.parse().unwrap(),
            nonce: order.nonce.parse().unwrap(),
            feeRateBps: order.fee_rate_bps.parse().unwrap(),
            side: order.side.as_u8(),
            signatureType: order.signature_type.as_u8(),
        };
        let hash = order_signing_hash(&typed, POLYGON, verifying_contract);
        let bytes = hex::decode(&order.signature).unwrap();
        PrimitiveSignature::try_from(bytes.as_slice())
            .unwrap()
            .recover_address_from_prehash(&hash)
            .unwrap()
    }

    #[test]
    fn test_auth_level_is_derived() {
        let client = TradingClient::new(HOST, POLYGON);
        assert_eq!(client.auth_level(), AuthLevel::L0);

        let client = client.with_signer(OrderBuilder::new(test_signer(), None, None));
        assert_eq!(client.auth_level(), AuthLevel::L1);

        client.set_api_creds(creds());
        assert_eq!(client.auth_level(), AuthLevel::L2);
        assert_eq!(client.api_creds().unwrap().api_key, "key");
    }

    #[test]
    fn test_creds_without_signer_stay_l0() {
        let client = TradingClient::new(HOST, POLYGON).with_api_creds(creds());
        assert_eq!(client.auth_level(), AuthLevel::L0);
    }

    #[tokio::test]
    async fn test_create_order_requires_signer() {
        let client = TradingClient::new(HOST, POLYGON)
            .with_metadata_source(Arc::new(MockMarketMetadataSource::new()));
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);
        let result = client
            .create_order(&args, None, None, CreateOrderOptions::default())
            .await;
        assert!(matches!(result, Err(Error::AuthRequired(_))));
    }

    #[tokio::test]
    async fn test_create_order_resolves_metadata() {
        let client = l1_client(mock_market(dec!(0.01), false, 0));
        let args = OrderArgs::new("1234", dec!(0.55), dec!(10), Side::Buy);
        let order = client
            .create_order(&args, None, None, CreateOrderOptions::default())
            .await
            .unwrap();

        assert_eq!(order.maker_amount, "5500000");
        assert_eq!(order.taker_amount, "10000000");
        assert_eq!(order.signature_type, SignatureType::Eoa);
        let exchange = Registry::polymarket().chain(POLYGON).unwrap().exchange;
        assert_eq!(recover(&order, exchange), order.signer);
    }

    #[tokio::test]
    async fn test_neg_risk_market_uses_neg_risk_exchange() {
        let client = l1_client(mock_market(dec!(0.001), true, 0));
        let args = OrderArgs::new("77", dec!(0.123), dec!(20), Side::Sell);
        let order = client
            .create_order(&args, None, None, CreateOrderOptions::default())
            .await
            .unwrap();

        let chain = Registry::polymarket().chain(POLYGON).unwrap().clone();
        assert_eq!(recover(&order, chain.neg_risk_exchange), order.signer);
        assert_ne!(recover(&order, chain.exchange), order.signer);
    }

    #[tokio::test]
    async fn test_price_outside_tick_bounds() {
        let client = l1_client(mock_market(dec!(0.001), false, 0));
        let too_high = OrderArgs::new("1", dec!(0.9999), dec!(10), Side::Buy);
        let result = client
            .create_order(&too_high, None, None, CreateOrderOptions::default())
            .await;
        assert!(matches!(result, Err(Error::InvalidOrder(_))));

        let edge = OrderArgs::new("1", dec!(0.999), dec!(10), Side::Buy);
        assert!(client
            .create_order(&edge, None, None, CreateOrderOptions::default())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_fee_rate_mismatch() {
        let client = l1_client(mock_market(dec!(0.01), false, 100));
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);

        let wrong = ExtraOrderArgs {
            fee_rate_bps: 50,
            ..Default::default()
        };
        let result = client
            .create_order(&args, None, Some(&wrong), CreateOrderOptions::default())
            .await;
        assert!(matches!(result, Err(Error::InvalidOrder(_))));

        // zero means "use the market's rate"
        let order = client
            .create_order(&args, None, None, CreateOrderOptions::default())
            .await
            .unwrap();
        assert_eq!(order.fee_rate_bps, "100");
    }

    #[tokio::test]
    async fn test_tick_size_below_market_minimum() {
        let client = l1_client(mock_market(dec!(0.01), false, 0));
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);
        let result = client
            .create_order(&args, None, None, CreateOrderOptions::new().tick_size(dec!(0.001)))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));

        let coarser = client
            .create_order(&args, None, None, CreateOrderOptions::new().tick_size(dec!(0.1)))
            .await;
        assert!(coarser.is_ok());
    }

    #[tokio::test]
    async fn test_unsupported_tick_size() {
        let client = l1_client(mock_market(dec!(0.05), false, 0));
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);
        let result = client
            .create_order(&args, None, None, CreateOrderOptions::default())
            .await;
        assert!(matches!(result, Err(Error::UnsupportedTickSize(_))));
    }

    #[tokio::test]
    async fn test_raw_mode_skips_lookups() {
        // the mock has no expectations and panics on any lookup
        let client = l1_client(MockMarketMetadataSource::new());
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);

        let missing = client
            .create_order(&args, None, None, CreateOrderOptions::new().raw().tick_size(dec!(0.01)))
            .await;
        assert!(matches!(missing, Err(Error::MissingField(_))));

        let options = CreateOrderOptions::new().raw().tick_size(dec!(0.01)).neg_risk(false);
        let order = client.create_order(&args, None, None, options).await.unwrap();
        assert_eq!(order.maker_amount, "5000000");
    }

    #[tokio::test]
    async fn test_market_order_walks_book() {
        let mut metadata = mock_market(dec!(0.01), false, 0);
        metadata.expect_order_book().returning(|_| {
            Ok(OrderBookSummary {
                asks: vec![
                    OrderSummary::new(dec!(0.52), dec!(100)),
                    OrderSummary::new(dec!(0.50), dec!(100)),
                ],
                ..Default::default()
            })
        });
        let client = l1_client(metadata);

        let args = MarketOrderArgs::new("1", dec!(100), Side::Buy);
        let order = client
            .create_market_order(&args, None, CreateOrderOptions::default())
            .await
            .unwrap();
        // 50 at 0.50 + 52 at 0.52 covers 100
        assert_eq!(order.maker_amount, "99996000");
        assert_eq!(order.taker_amount, "192300000");
    }

    #[tokio::test]
    async fn test_market_order_no_match() {
        let mut metadata = mock_market(dec!(0.01), false, 0);
        metadata.expect_order_book().returning(|_| {
            Ok(OrderBookSummary {
                asks: vec![OrderSummary::new(dec!(0.50), dec!(10))],
                ..Default::default()
            })
        });
        let client = l1_client(metadata);

        let fok = MarketOrderArgs::new("1", dec!(100), Side::Buy);
        let result = client
            .create_market_order(&fok, None, CreateOrderOptions::default())
            .await;
        assert!(matches!(result, Err(Error::NoMatch)));

        let fak = MarketOrderArgs::new("1", dec!(100), Side::Buy).with_order_type(OrderType::FAK);
        let order = client
            .create_market_order(&fak, None, CreateOrderOptions::default())
            .await
            .unwrap();
        assert_eq!(order.taker_amount, "200000000");
    }

    #[tokio::test]
    async fn test_raw_market_order_needs_price() {
        let client = l1_client(MockMarketMetadataSource::new());
        let options = CreateOrderOptions::new().raw().tick_size(dec!(0.01)).neg_risk(false);
        let args = MarketOrderArgs::new("1", dec!(100), Side::Sell);
        let result = client
            .create_market_order(&args, None, options.clone())
            .await;
        assert!(matches!(result, Err(Error::MissingField(_))));

        let priced = args.with_price(dec!(0.4));
        let order = client.create_market_order(&priced, None, options).await.unwrap();
        assert_eq!(order.maker_amount, "100000000");
        assert_eq!(order.taker_amount, "40000000");
    }

    #[tokio::test]
    async fn test_post_only_validated_before_network() {
        let client = l1_client(MockMarketMetadataSource::new()).with_api_creds(creds());
        let options = CreateOrderOptions::new().raw().tick_size(dec!(0.01)).neg_risk(false);
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);
        let order = client.create_order(&args, None, None, options).await.unwrap();

        let result = client.post_order(order.clone(), OrderType::FOK, true).await;
        assert!(matches!(result, Err(Error::InvalidOrder(_))));

        let batch = vec![
            PostOrdersArgs {
                order: order.clone(),
                order_type: OrderType::GTC,
                post_only: true,
            },
            PostOrdersArgs {
                order,
                order_type: OrderType::FAK,
                post_only: true,
            },
        ];
        assert!(matches!(client.post_orders(batch).await, Err(Error::InvalidOrder(_))));
    }

    #[tokio::test]
    async fn test_post_requires_l2() {
        let client = l1_client(MockMarketMetadataSource::new());
        let options = CreateOrderOptions::new().raw().tick_size(dec!(0.01)).neg_risk(false);
        let args = OrderArgs::new("1", dec!(0.5), dec!(10), Side::Buy);
        let order = client.create_order(&args, None, None, options).await.unwrap();

        let result = client.post_order(order, OrderType::GTC, false).await;
        assert!(matches!(result, Err(Error::AuthRequired(_))));
        assert!(matches!(client.cancel_all().await, Err(Error::AuthRequired(_))));
    }

    #[test]
    fn test_resolve_fee_rate() {
        assert_eq!(resolve_fee_rate(0, 0).unwrap(), 0);
        assert_eq!(resolve_fee_rate(0, 100).unwrap(), 100);
        assert_eq!(resolve_fee_rate(100, 100).unwrap(), 100);
        assert_eq!(resolve_fee_rate(25, 0).unwrap(), 0);
        assert!(resolve_fee_rate(25, 100).is_err());
    }
}
