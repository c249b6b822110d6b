use alloy_primitives::Address;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Str(String),
    Num(serde_json::Number),
}

/// Deserialize a decimal that the server may send as either a JSON number or a string
pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Str(s) => s,
        NumberOrString::Num(n) => n.to_string(),
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(de::Error::custom)
}

/// Deserialize an unsigned integer sent as either a JSON number or a string
pub fn deserialize_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Str(s) => s.parse().map_err(de::Error::custom),
        NumberOrString::Num(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("expected unsigned integer, got {}", n))),
    }
}

/// Serialize an address with EIP-55 checksum casing
pub fn serialize_checksummed<S>(address: &Address, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&address.to_checksum(None))
}
