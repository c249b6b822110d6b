use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }

    /// Numeric value used in the signed order struct
    pub fn as_u8(&self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(Error::InvalidParameter(format!(
                "side must be BUY or SELL, got {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time-in-force of a posted order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    /// Good till cancelled
    #[default]
    GTC,
    /// Fill or kill
    FOK,
    /// Good till date
    GTD,
    /// Fill and kill
    FAK,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::GTC => "GTC",
            OrderType::FOK => "FOK",
            OrderType::GTD => "GTD",
            OrderType::FAK => "FAK",
        }
    }

    /// Only resting orders may be flagged post-only
    pub fn allows_post_only(&self) -> bool {
        matches!(self, OrderType::GTC | OrderType::GTD)
    }
}

/// Wallet scheme that owns the funds behind an order or settlement call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SignatureType {
    /// Externally owned account
    #[default]
    Eoa,
    /// Polymarket proxy wallet
    PolyProxy,
    /// Gnosis Safe wallet
    PolyGnosisSafe,
}

impl SignatureType {
    pub fn as_u8(&self) -> u8 {
        match self {
            SignatureType::Eoa => 0,
            SignatureType::PolyProxy => 1,
            SignatureType::PolyGnosisSafe => 2,
        }
    }

    /// Wallet type name understood by the relay service
    pub fn relay_type(&self) -> Option<&'static str> {
        match self {
            SignatureType::Eoa => None,
            SignatureType::PolyProxy => Some("PROXY"),
            SignatureType::PolyGnosisSafe => Some("SAFE"),
        }
    }
}

impl Serialize for SignatureType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for SignatureType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(SignatureType::Eoa),
            1 => Ok(SignatureType::PolyProxy),
            2 => Ok(SignatureType::PolyGnosisSafe),
            other => Err(serde::de::Error::custom(format!(
                "unknown signature type {}",
                other
            ))),
        }
    }
}

/// Client authentication level, derived from what the client holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthLevel {
    /// No signer: public endpoints only
    L0,
    /// Signer present: EIP-712 authenticated endpoints
    L1,
    /// Signer and API credentials: HMAC authenticated endpoints
    L2,
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthLevel::L0 => "L0",
            AuthLevel::L1 => "L1",
            AuthLevel::L2 => "L2",
        };
        f.write_str(s)
    }
}
