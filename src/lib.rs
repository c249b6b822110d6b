//! # polymarket-sdk
//!
//! A Rust client library for signing and submitting Polymarket orders and for
//! settling positions on-chain.
//!
//! This library provides:
//! - Fixed-point order amount calculation and EIP-712 order signing
//! - L1 (EIP-712) and L2 (HMAC) request authentication
//! - An order orchestrator that resolves market metadata and posts orders
//! - Split / merge / redeem / convert through the gas-less relayer or direct
//!   transactions, for EOA, proxy and Safe wallets
//!
//! ## Features
//!
//! - **Builder Pattern**: Fluent API for constructing clients and orders
//! - **Type Safety**: Strong typing with newtypes for IDs (TokenId, OrderId, ConditionId)
//! - **Proper Error Handling**: No panics, comprehensive error types
//! - **Decimal Precision**: Accurate decimal math for prices and amounts
//! - **Per-wallet serialization**: relay nonces are never raced by concurrent callers
//!

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod orders;
pub mod signing;
pub mod types;
pub mod web3;

// Internal modules
mod http;

// Re-export commonly used types
pub use alloy_primitives::{Address, B256, U256};
pub use alloy_signer_local::PrivateKeySigner;
pub use error::{Error, Result};
pub use types::{
    ApiCreds, AuthLevel, BuilderCreds, ConditionId, CreateOrderOptions, ExtraOrderArgs,
    MarketOrderArgs, OrderArgs, OrderId, OrderType, Side, SignatureType, SignedOrderRequest,
    TokenId,
};

// Re-export clients
pub use client::{AuthenticatedClient, ClobClient, TradingClient};
pub use web3::{GaslessClient, Web3Client};

// Re-export configuration
pub use config::{ChainConfig, Registry, RelayConfig};

// Re-export order builder
pub use orders::OrderBuilder;

// Re-export signer trait
pub use signing::EthSigner;
