mod amounts;
mod builder;
mod price;
mod rounding;

pub use amounts::{get_market_order_amounts, get_order_amounts, OrderAmounts};
pub use builder::{OrderBuilder, OrderContext};
pub use price::{calculate_market_price, price_valid};
pub use rounding::{
    decimal_places, fix_amount_rounding, round_down, round_normal, round_up, to_token_decimals,
    RoundConfig, RoundingTable, TOKEN_DECIMALS,
};
