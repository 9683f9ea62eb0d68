use serde::de::Visitor;
use serde::{Deserializer, Serializer};

/// Serializes a value as a hexadecimal string with "0x" prefix.
pub fn serialize_as_hex<S, T>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    T: std::fmt::LowerHex,
{
    serializer.serialize_str(&format!("{value:#x}"))
}

/// Deserializes a `u64` from either a hexadecimal string with "0x" prefix, a decimal string, or a
/// JSON number.
pub fn deserialize_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    struct U64Visitor;

    impl Visitor<'_> for U64Visitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(formatter, "0x-prefix hex string or decimal number")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Self::Value, E> {
            u64::try_from(v).map_err(serde::de::Error::custom)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
            parse_u64(v).map_err(serde::de::Error::custom)
        }
    }

    deserializer.deserialize_any(U64Visitor)
}

/// Parses a `u64` from a "0x"/"0X"-prefixed hex string or a plain decimal string.
pub fn parse_u64(s: &str) -> Result<u64, std::num::ParseIntError> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    }
}

/// Serde helpers for fixed size byte arrays encoded as "0x"-prefixed hex strings.
pub mod hex_array {
    use serde::de::Visitor;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(value: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(value)))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HexArrayVisitor<const N: usize>;

        impl<const N: usize> Visitor<'_> for HexArrayVisitor<N> {
            type Value = [u8; N];

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(formatter, "0x-prefix hex string of {N} bytes")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let digits = v.strip_prefix("0x").unwrap_or(v);
                let mut out = [0u8; N];
                hex::decode_to_slice(digits, &mut out).map_err(serde::de::Error::custom)?;
                Ok(out)
            }
        }

        deserializer.deserialize_str(HexArrayVisitor::<N>)
    }
}
