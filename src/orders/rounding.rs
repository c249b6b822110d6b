use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy::{AwayFromZero, MidpointAwayFromZero, ToZero};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Number of decimals of collateral and outcome tokens
pub const TOKEN_DECIMALS: u32 = 6;

/// Rounding configuration for a specific tick size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundConfig {
    pub price: u32,
    pub size: u32,
    pub amount: u32,
}

impl RoundConfig {
    pub const fn new(price: u32, size: u32, amount: u32) -> Self {
        Self {
            price,
            size,
            amount,
        }
    }
}

/// Closed lookup table from tick size to rounding precision
#[derive(Debug, Clone)]
pub struct RoundingTable {
    configs: HashMap<Decimal, RoundConfig>,
}

impl RoundingTable {
    /// An empty table; every lookup fails until ticks are added
    pub fn empty() -> Self {
        Self {
            configs: HashMap::new(),
        }
    }

    /// The tick sizes listed by the exchange
    pub fn polymarket() -> Self {
        Self::empty()
            .with_tick_size(Decimal::new(1, 1), RoundConfig::new(1, 2, 3))
            .with_tick_size(Decimal::new(1, 2), RoundConfig::new(2, 2, 4))
            .with_tick_size(Decimal::new(1, 3), RoundConfig::new(3, 2, 5))
            .with_tick_size(Decimal::new(1, 4), RoundConfig::new(4, 2, 6))
    }

    pub fn with_tick_size(mut self, tick_size: Decimal, config: RoundConfig) -> Self {
        self.configs.insert(tick_size.normalize(), config);
        self
    }

    /// Look up the rounding config for a tick size
    pub fn get(&self, tick_size: Decimal) -> Result<RoundConfig> {
        self.configs
            .get(&tick_size.normalize())
            .copied()
            .ok_or(Error::UnsupportedTickSize(tick_size))
    }

    pub fn contains(&self, tick_size: Decimal) -> bool {
        self.configs.contains_key(&tick_size.normalize())
    }
}

impl Default for RoundingTable {
    fn default() -> Self {
        Self::polymarket()
    }
}

/// Truncate toward zero at `places` decimals
pub fn round_down(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, ToZero)
}

/// Round away from zero at `places` decimals
pub fn round_up(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, AwayFromZero)
}

/// Round half away from zero at `places` decimals
pub fn round_normal(value: Decimal, places: u32) -> Decimal {
    value.round_dp_with_strategy(places, MidpointAwayFromZero)
}

/// Count of significant fractional digits, ignoring trailing zeros
pub fn decimal_places(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Scale a decimal amount to integer token units, truncating any remainder
pub fn to_token_decimals(value: Decimal) -> Result<u64> {
    let scaled = checked_mul(value, Decimal::from(10u64.pow(TOKEN_DECIMALS)))?;
    scaled
        .trunc()
        .to_u64()
        .ok_or_else(|| out_of_range(value))
}

/// `a * b`, failing instead of overflowing
pub(crate) fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(a))
}

/// `a / b`, failing instead of overflowing or dividing by zero
pub(crate) fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_div(b).ok_or_else(|| out_of_range(a))
}

fn out_of_range(value: Decimal) -> Error {
    Error::InvalidParameter(format!("amount {} out of range", value))
}

/// Bring an amount back within `amount` decimals.
///
/// Rounds up at `amount + 4` places first so values like `5.4999999999` snap to
/// `5.5`; anything still too precise is truncated.
pub fn fix_amount_rounding(mut amt: Decimal, round_config: &RoundConfig) -> Decimal {
    if decimal_places(amt) > round_config.amount {
        amt = round_up(amt, round_config.amount + 4);
        if decimal_places(amt) > round_config.amount {
            amt = round_down(amt, round_config.amount);
        }
    }
    amt
}
