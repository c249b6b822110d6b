mod authenticated;
mod clob;
mod metadata;
mod trading;

pub use authenticated::AuthenticatedClient;
pub use clob::ClobClient;
pub use metadata::{CachedMetadata, MarketMetadataSource};
pub use trading::TradingClient;
