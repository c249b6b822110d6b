use rust_decimal::Decimal;

use super::rounding::{
    checked_div, checked_mul, decimal_places, fix_amount_rounding, round_down, round_normal,
    to_token_decimals, RoundConfig,
};
use crate::error::{Error, Result};
use crate::types::Side;

/// Integer maker/taker amounts in token units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderAmounts {
    pub side: Side,
    pub maker_amount: u64,
    pub taker_amount: u64,
}

impl OrderAmounts {
    fn from_raw(side: Side, maker: Decimal, taker: Decimal) -> Result<Self> {
        Ok(Self {
            side,
            maker_amount: to_token_decimals(maker)?,
            taker_amount: to_token_decimals(taker)?,
        })
    }
}

/// Amounts for a limit order of `size` shares at `price`
pub fn get_order_amounts(
    side: Side,
    size: Decimal,
    price: Decimal,
    round_config: &RoundConfig,
) -> Result<OrderAmounts> {
    let raw_price = round_normal(price, round_config.price);

    match side {
        Side::Buy => {
            let raw_taker = round_down(size, round_config.size);
            let raw_maker = fix_amount_rounding(checked_mul(raw_taker, raw_price)?, round_config);
            OrderAmounts::from_raw(side, raw_maker, raw_taker)
        }
        Side::Sell => {
            let raw_maker = round_down(size, round_config.size);
            let raw_taker = fix_amount_rounding(checked_mul(raw_maker, raw_price)?, round_config);
            OrderAmounts::from_raw(side, raw_maker, raw_taker)
        }
    }
}

/// Amounts for a market order.
///
/// For a BUY `amount` is collateral to spend; for a SELL it is shares to sell.
pub fn get_market_order_amounts(
    side: Side,
    amount: Decimal,
    price: Decimal,
    round_config: &RoundConfig,
) -> Result<OrderAmounts> {
    let raw_price = round_normal(price, round_config.price);
    if raw_price.is_zero() {
        return Err(Error::InvalidOrder(format!(
            "price {} rounds to zero",
            price
        )));
    }

    match side {
        Side::Buy => {
            let raw_maker = round_down(amount, round_config.size);
            let mut raw_taker = checked_div(raw_maker, raw_price)?;
            if decimal_places(raw_taker) > round_config.size {
                raw_taker = round_down(raw_taker, round_config.size);
            }
            // the exchange checks maker == taker * price exactly
            let raw_maker = fix_amount_rounding(checked_mul(raw_taker, raw_price)?, round_config);
            OrderAmounts::from_raw(side, raw_maker, raw_taker)
        }
        Side::Sell => {
            let raw_maker = round_down(amount, round_config.size);
            let raw_taker = round_down(checked_mul(raw_maker, raw_price)?, round_config.amount);
            OrderAmounts::from_raw(side, raw_maker, raw_taker)
        }
    }
}
