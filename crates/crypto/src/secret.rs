//! Secret-holding types.
//!
//! Private scalars live in [`SecretScalar`], which is zeroized on drop,
//! cannot be cloned, and never prints its contents.

use keystamp_core::{Error, Result};
use p256::elliptic_curve::subtle::ConstantTimeEq;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Length of a P-256 private scalar.
pub const SCALAR_LEN: usize = 32;

/// A 32-byte private scalar, zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretScalar([u8; SCALAR_LEN]);

impl SecretScalar {
    /// Copies a scalar out of `bytes`. The caller remains responsible for
    /// wiping its own buffer.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SCALAR_LEN {
            return Err(Error::InvalidKeyMaterial(format!(
                "private scalar must be {} bytes, got {}",
                SCALAR_LEN,
                bytes.len()
            )));
        }
        let mut scalar = [0u8; SCALAR_LEN];
        scalar.copy_from_slice(bytes);
        Ok(Self(scalar))
    }

    /// Takes the scalar out of a p256 secret key.
    pub fn from_secret_key(secret: &p256::SecretKey) -> Self {
        let bytes = Zeroizing::new(secret.to_bytes());
        let mut scalar = [0u8; SCALAR_LEN];
        scalar.copy_from_slice(bytes.as_slice());
        Self(scalar)
    }

    /// Parses the scalar as a P-256 secret key (rejects zero and values >= n).
    pub fn to_secret_key(&self) -> Result<p256::SecretKey> {
        p256::SecretKey::from_slice(&self.0).map_err(|_| {
            Error::InvalidKeyMaterial("scalar is not a valid P-256 private key".into())
        })
    }

    pub fn expose_secret(&self) -> &[u8; SCALAR_LEN] {
        &self.0
    }

    /// Constant-time equality.
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for SecretScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretScalar([REDACTED])")
    }
}
