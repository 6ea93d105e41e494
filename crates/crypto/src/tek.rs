//! Target encryption key (TEK) management.
//!
//! A [`TekManager`] owns at most one ephemeral P-256 key pair that acts as the
//! HPKE recipient key for credential bundles. The public half is handed to
//! the authentication endpoint; the private half never leaves this module
//! except through the explicit serialized export.
//!
//! # Lifecycle
//!
//! 1. **Create**: `generate()` on an empty manager, or `import()` /
//!    `from_private_key()` / `restore_or_generate()` to construct a loaded one
//! 2. **Use**: `public_key()` for the handshake, `open()` to decrypt
//! 3. **Drop**: the private scalar is zeroized
//!
//! Once a key pair exists it is never replaced.

use hpke::{Deserializable, Kem as KemTrait, OpModeR};
use keystamp_core::{Error, Result};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::point::{self, UncompressedPoint};
use crate::secret::{SecretScalar, SCALAR_LEN};
use crate::store::TekStore;
use crate::suite::{SuiteAead, SuiteKdf, SuiteKem, HPKE_SUITE};

/// Version tag of the serialized key blob.
pub const TEK_BLOB_VERSION: u32 = 1;

/// Ephemeral HPKE recipient key pair.
struct TekKeyPair {
    public_key: UncompressedPoint,
    private_key: SecretScalar,
}

impl TekKeyPair {
    fn generate() -> Self {
        let secret = p256::SecretKey::random(&mut OsRng);
        Self::from_secret_key(&secret)
    }

    fn from_secret_key(secret: &p256::SecretKey) -> Self {
        Self {
            public_key: point::encode_uncompressed(&secret.public_key()),
            private_key: SecretScalar::from_secret_key(secret),
        }
    }

    fn from_scalar(private_key: SecretScalar) -> Result<Self> {
        let secret = private_key.to_secret_key()?;
        Ok(Self {
            public_key: point::encode_uncompressed(&secret.public_key()),
            private_key,
        })
    }
}

/// On-disk form of a [`TekKeyPair`].
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(deny_unknown_fields)]
struct SerializedTek {
    version: u32,
    kem_id: u16,
    kdf_id: u16,
    aead_id: u16,
    private_key: String,
    public_key: String,
}

/// Holder of the session's HPKE recipient key.
#[derive(Default)]
pub struct TekManager {
    key_pair: Option<TekKeyPair>,
}

impl TekManager {
    /// Creates a manager with no key pair.
    pub fn new() -> Self {
        Self { key_pair: None }
    }

    /// Generates the key pair if none exists and returns its public key.
    ///
    /// Calling this on a manager that already holds a key pair is a no-op.
    pub fn generate(&mut self) -> UncompressedPoint {
        if let Some(existing) = &self.key_pair {
            return existing.public_key;
        }
        let key_pair = TekKeyPair::generate();
        debug!(
            public_key = %hex::encode(key_pair.public_key),
            "Generated target encryption key"
        );
        let public_key = key_pair.public_key;
        self.key_pair = Some(key_pair);
        public_key
    }

    /// Builds a manager from a raw 32-byte private scalar.
    pub fn from_private_key(private_key: &[u8]) -> Result<Self> {
        let scalar = SecretScalar::from_slice(private_key)?;
        Ok(Self {
            key_pair: Some(TekKeyPair::from_scalar(scalar)?),
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.key_pair.is_some()
    }

    /// Returns the uncompressed (65-byte) recipient public key.
    pub fn public_key(&self) -> Result<UncompressedPoint> {
        self.key_pair
            .as_ref()
            .map(|key_pair| key_pair.public_key)
            .ok_or(Error::NotInitialized)
    }

    /// Returns the recipient public key as lowercase hex, the form sent to the
    /// authentication endpoint.
    pub fn public_key_hex(&self) -> Result<String> {
        self.public_key().map(hex::encode)
    }

    /// Serializes the full key pair, including the private scalar.
    ///
    /// The blob is opaque to callers and must be stored as a secret.
    pub fn export_serialized(&self) -> Result<Zeroizing<String>> {
        let key_pair = self.key_pair.as_ref().ok_or(Error::NotInitialized)?;
        let serialized = SerializedTek {
            version: TEK_BLOB_VERSION,
            kem_id: HPKE_SUITE.kem_id,
            kdf_id: HPKE_SUITE.kdf_id,
            aead_id: HPKE_SUITE.aead_id,
            private_key: hex::encode(key_pair.private_key.expose_secret()),
            public_key: hex::encode(key_pair.public_key),
        };
        Ok(Zeroizing::new(serde_json::to_string(&serialized)?))
    }

    /// Reconstructs a manager from a blob produced by [`export_serialized`].
    ///
    /// Only the exact exported form is accepted, so exporting the result
    /// reproduces `blob` byte for byte.
    ///
    /// [`export_serialized`]: TekManager::export_serialized
    pub fn import(blob: &str) -> Result<Self> {
        let serialized: SerializedTek = serde_json::from_str(blob)
            .map_err(|e| Error::InvalidKeyMaterial(format!("malformed key blob: {}", e)))?;

        if serialized.version != TEK_BLOB_VERSION {
            return Err(Error::InvalidKeyMaterial(format!(
                "unsupported key blob version {}",
                serialized.version
            )));
        }
        if !HPKE_SUITE.matches(serialized.kem_id, serialized.kdf_id, serialized.aead_id) {
            return Err(Error::InvalidKeyMaterial(format!(
                "key blob suite ({:#06x}, {:#06x}, {:#06x}) does not match",
                serialized.kem_id, serialized.kdf_id, serialized.aead_id
            )));
        }

        let mut scalar = Zeroizing::new([0u8; SCALAR_LEN]);
        hex::decode_to_slice(&serialized.private_key, &mut scalar[..])
            .map_err(|_| Error::InvalidKeyMaterial("malformed private key hex".into()))?;
        let key_pair = TekKeyPair::from_scalar(SecretScalar::from_slice(&scalar[..])?)?;

        let mut stored_public = [0u8; point::UNCOMPRESSED_POINT_LEN];
        hex::decode_to_slice(&serialized.public_key, &mut stored_public)
            .map_err(|_| Error::InvalidKeyMaterial("malformed public key hex".into()))?;
        if stored_public != key_pair.public_key {
            return Err(Error::InvalidKeyMaterial(
                "public key does not match private key".into(),
            ));
        }

        let manager = Self {
            key_pair: Some(key_pair),
        };
        if manager.export_serialized()?.as_str() != blob {
            return Err(Error::InvalidKeyMaterial("non-canonical key blob".into()));
        }

        debug!(
            public_key = %manager.public_key_hex()?,
            "Imported target encryption key"
        );
        Ok(manager)
    }

    /// Restores the key pair from `store`, or generates and persists a new one.
    pub fn restore_or_generate(store: &dyn TekStore) -> Result<Self> {
        if let Some(blob) = store.load()? {
            return Self::import(&blob);
        }
        let mut manager = Self::new();
        manager.generate();
        manager.persist(store)?;
        Ok(manager)
    }

    /// Writes the serialized key pair to `store`.
    pub fn persist(&self, store: &dyn TekStore) -> Result<()> {
        let blob = self.export_serialized()?;
        store.save(&blob)
    }

    /// HPKE single-shot decapsulation and authenticated decryption.
    ///
    /// `sender_public_key` is the uncompressed encapsulated key. On any
    /// failure no plaintext is returned.
    pub fn open(
        &self,
        sender_public_key: &[u8],
        ciphertext: &[u8],
        info: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        let key_pair = self.key_pair.as_ref().ok_or(Error::NoKey)?;

        let encapped_key = <SuiteKem as KemTrait>::EncappedKey::from_bytes(sender_public_key)
            .map_err(|e| Error::Decode(format!("invalid encapsulated key: {:?}", e)))?;
        let recipient_key =
            <SuiteKem as KemTrait>::PrivateKey::from_bytes(key_pair.private_key.expose_secret())
                .map_err(|e| Error::InvalidKeyMaterial(format!("{:?}", e)))?;

        let plaintext = hpke::single_shot_open::<SuiteAead, SuiteKdf, SuiteKem>(
            &OpModeR::Base,
            &recipient_key,
            &encapped_key,
            info,
            ciphertext,
            aad,
        )
        .map_err(|_| {
            warn!(
                ciphertext_len = ciphertext.len(),
                "HPKE open failed authentication"
            );
            Error::DecryptionFailure
        })?;

        Ok(Zeroizing::new(plaintext))
    }
}

impl fmt::Debug for TekManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let public_key = self.key_pair.as_ref().map(|kp| hex::encode(kp.public_key));
        f.debug_struct("TekManager")
            .field("public_key", &public_key)
            .finish_non_exhaustive()
    }
}
