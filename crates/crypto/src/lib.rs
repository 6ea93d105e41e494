//! Cryptographic primitives for the keystamp client.
//!
//! This crate owns everything that touches the ephemeral HPKE recipient key:
//! P-256 point-format conversions, the zeroizing secret type, the fixed HPKE
//! suite and the [`TekManager`] that generates, exports and imports the key
//! and opens sealed payloads addressed to it.
//!
//! # Supported Algorithms
//!
//! - **KEM**: DHKEM(P-256, HKDF-SHA256)
//! - **KDF**: HKDF-SHA256
//! - **AEAD**: AES-256-GCM
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secrets must never be logged or hardcoded
//! - Private scalars are zeroized on drop and never cloned
//! - Every decoded curve point is validated

pub mod point;
pub mod secret;
pub mod store;
pub mod suite;
pub mod tek;

pub use point::{
    compress, decompress, CompressedPoint, UncompressedPoint, COMPRESSED_POINT_LEN,
    UNCOMPRESSED_POINT_LEN,
};
pub use secret::{SecretScalar, SCALAR_LEN};
pub use store::{MemoryTekStore, TekStore};
pub use suite::{HpkeSuite, OutputPrefix, SuiteAead, SuiteKdf, SuiteKem, HPKE_SUITE};
pub use tek::{TekManager, TEK_BLOB_VERSION};

pub use keystamp_core::{Error, Result};
