use rust_decimal::Decimal;

use crate::error::{Error, Result};
use crate::types::{OrderSummary, OrderType, Side};

/// Whether `price` lies within `[tick_size, 1 - tick_size]`
pub fn price_valid(price: Decimal, tick_size: Decimal) -> bool {
    price >= tick_size && price <= Decimal::ONE - tick_size
}

/// Walk the opposite side of the book from the best level outward and return
/// the price of the level where the requested amount is covered.
///
/// `levels` are asks when buying and bids when selling. A BUY accumulates
/// notional (`size * price`), a SELL accumulates shares. If the book is too
/// thin, FOK orders fail with [`Error::NoMatch`] and every other order type
/// falls back to the best price.
pub fn calculate_market_price(
    side: Side,
    levels: &[OrderSummary],
    amount: Decimal,
    order_type: OrderType,
) -> Result<Decimal> {
    let mut sorted: Vec<&OrderSummary> = levels.iter().collect();
    match side {
        Side::Buy => sorted.sort_by(|a, b| a.price.cmp(&b.price)),
        Side::Sell => sorted.sort_by(|a, b| b.price.cmp(&a.price)),
    }

    let best = sorted.first().ok_or(Error::NoMatch)?;

    let mut matched = Decimal::ZERO;
    for level in &sorted {
        matched = matched.saturating_add(match side {
            Side::Buy => level.size.saturating_mul(level.price),
            Side::Sell => level.size,
        });
        if matched >= amount {
            return Ok(level.price);
        }
    }

    if order_type == OrderType::FOK {
        return Err(Error::NoMatch);
    }
    Ok(best.price)
}
