use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cell;

/// Block number type.
pub type BlockNumber = u64;

/// 32-byte block hash, encoded on the wire as a `0x`-prefixed hex string.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash(#[serde(with = "serde_utils::hex_array")] pub [u8; 32]);

impl BlockHash {
    pub const ZERO: Self = Self([0u8; 32]);
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for BlockHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut out)?;
        Ok(Self(out))
    }
}

impl From<[u8; 32]> for BlockHash {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

/// The commitment section of a header: the data matrix dimensions and the concatenated per-row
/// commitments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtrinsicsRoot {
    pub rows: u16,
    pub cols: u16,
    #[serde(default)]
    pub hash: BlockHash,
    pub commitment: Vec<u8>,
}

impl ExtrinsicsRoot {
    /// Returns the commitment segment of `row`, or `None` if the commitment is too short to
    /// contain it.
    pub fn row_commitment(&self, row: u32) -> Option<&[u8]> {
        cell::row_commitment(&self.commitment, row)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default)]
    pub parent_hash: BlockHash,
    #[serde(
        serialize_with = "serde_utils::serialize_as_hex",
        deserialize_with = "serde_utils::deserialize_u64"
    )]
    pub number: BlockNumber,
    #[serde(default)]
    pub state_root: BlockHash,
    pub extrinsics_root: ExtrinsicsRoot,
}

impl Header {
    pub fn rows(&self) -> u32 {
        self.extrinsics_root.rows as u32
    }

    pub fn cols(&self) -> u32 {
        self.extrinsics_root.cols as u32
    }

    pub fn commitment(&self) -> &[u8] {
        &self.extrinsics_root.commitment
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: Header,
}

/// The response shape of `chain_getBlock`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    pub block: Block,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::cell::ROW_COMMITMENT_SIZE;

    #[test]
    fn decode_node_header() {
        let json = r#"{
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "number": "0x1f",
            "stateRoot": "0x0000000000000000000000000000000000000000000000000000000000000002",
            "extrinsicsRoot": {
                "rows": 2,
                "cols": 4,
                "hash": "0x0000000000000000000000000000000000000000000000000000000000000003",
                "commitment": [1, 2, 3],
                "dataRoot": "0x00"
            },
            "digest": { "logs": [] }
        }"#;

        let header: Header = serde_json::from_str(json).unwrap();
        assert_eq!(header.number, 31);
        assert_eq!(header.rows(), 2);
        assert_eq!(header.cols(), 4);
        assert_eq!(header.commitment(), &[1, 2, 3]);
        assert_eq!(header.parent_hash.0[31], 1);
    }

    #[test]
    fn decode_signed_block() {
        let json = r#"{
            "block": {
                "header": {
                    "number": "0x2",
                    "extrinsicsRoot": { "rows": 1, "cols": 1, "commitment": [] }
                },
                "extrinsics": ["0x00"]
            },
            "justifications": null
        }"#;

        let block: SignedBlock = serde_json::from_str(json).unwrap();
        assert_eq!(block.block.header.number, 2);
    }

    #[test]
    fn row_commitment_segments() {
        let root = ExtrinsicsRoot {
            rows: 2,
            cols: 2,
            commitment: (0..2 * ROW_COMMITMENT_SIZE as u8).collect(),
            ..Default::default()
        };

        let second = root.row_commitment(1).unwrap();
        assert_eq!(second.len(), ROW_COMMITMENT_SIZE);
        assert_eq!(second[0], ROW_COMMITMENT_SIZE as u8);
        assert_matches!(root.row_commitment(2), None);
        assert_matches!(root.row_commitment(u32::MAX), None);
    }

    #[test]
    fn block_hash_from_str() {
        let hash: BlockHash =
            "0x00000000000000000000000000000000000000000000000000000000000000ff".parse().unwrap();
        assert_eq!(hash.0[31], 0xff);
        assert_eq!(hash.to_string().len(), 66);
        assert!("0x1234".parse::<BlockHash>().is_err());
    }
}
