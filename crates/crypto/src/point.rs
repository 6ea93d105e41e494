//! SEC1 point-format conversions for NIST P-256.
//!
//! Every decode validates that the point lies on the curve and is not the
//! identity; no unchecked coordinates ever leave this module.

use keystamp_core::{Error, Result};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::PublicKey;

/// Length of a SEC1 compressed P-256 point (`0x02|0x03 || x`).
pub const COMPRESSED_POINT_LEN: usize = 33;

/// Length of a SEC1 uncompressed P-256 point (`0x04 || x || y`).
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

pub type CompressedPoint = [u8; COMPRESSED_POINT_LEN];
pub type UncompressedPoint = [u8; UNCOMPRESSED_POINT_LEN];

/// Expands a compressed point into its uncompressed form.
pub fn decompress(compressed: &[u8]) -> Result<UncompressedPoint> {
    if compressed.len() != COMPRESSED_POINT_LEN {
        return Err(Error::Decode(format!(
            "expected {}-byte compressed point, got {} bytes",
            COMPRESSED_POINT_LEN,
            compressed.len()
        )));
    }
    if !matches!(compressed[0], 0x02 | 0x03) {
        return Err(Error::Decode(format!(
            "invalid compressed point prefix {:#04x}",
            compressed[0]
        )));
    }
    let key = PublicKey::from_sec1_bytes(compressed)
        .map_err(|_| Error::Decode("compressed point is not on the P-256 curve".into()))?;
    Ok(encode_uncompressed(&key))
}

/// Compresses an uncompressed point.
pub fn compress(uncompressed: &[u8]) -> Result<CompressedPoint> {
    if uncompressed.len() != UNCOMPRESSED_POINT_LEN {
        return Err(Error::Decode(format!(
            "expected {}-byte uncompressed point, got {} bytes",
            UNCOMPRESSED_POINT_LEN,
            uncompressed.len()
        )));
    }
    if uncompressed[0] != 0x04 {
        return Err(Error::Decode(format!(
            "invalid uncompressed point prefix {:#04x}",
            uncompressed[0]
        )));
    }
    let key = PublicKey::from_sec1_bytes(uncompressed)
        .map_err(|_| Error::Decode("uncompressed point is not on the P-256 curve".into()))?;
    Ok(encode_compressed(&key))
}

pub fn encode_compressed(key: &PublicKey) -> CompressedPoint {
    let mut out = [0u8; COMPRESSED_POINT_LEN];
    out.copy_from_slice(key.to_encoded_point(true).as_bytes());
    out
}

pub fn encode_uncompressed(key: &PublicKey) -> UncompressedPoint {
    let mut out = [0u8; UNCOMPRESSED_POINT_LEN];
    out.copy_from_slice(key.to_encoded_point(false).as_bytes());
    out
}
