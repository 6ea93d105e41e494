//! Credential bundles.
//!
//! The authentication service returns the client's API signing key sealed to
//! the session's target encryption key. On the wire a bundle is the base58check
//! encoding of
//!
//! ```text
//! compressed_sender_public_key (33 bytes) || hpke_ciphertext
//! ```
//!
//! where the HPKE plaintext is the raw 32-byte P-256 private scalar, the info
//! string is [`BUNDLE_HPKE_INFO`], and the AAD is the uncompressed sender key
//! followed by the uncompressed recipient key.
//!
//! # Security Model
//!
//! - The bundle's public key is never trusted from the wire; it is derived
//!   from the decrypted scalar and checked against it
//! - Decryption failures are surfaced as security events, never retried

use hpke::{Deserializable, Kem as KemTrait, OpModeS, Serializable};
use keystamp_core::{Error, Result};
use keystamp_crypto::point::{self, CompressedPoint, COMPRESSED_POINT_LEN};
use keystamp_crypto::{SecretScalar, SuiteAead, SuiteKdf, SuiteKem, TekManager};
use p256::ecdsa::signature::{RandomizedSigner, Verifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use tracing::{debug, warn};

/// HPKE info label binding bundle encryption to this use of the key.
pub const BUNDLE_HPKE_INFO: &[u8] = b"turnkey_hpke";

/// Message signed and verified when checking a derived key pair.
const CONSISTENCY_PROBE: &[u8] = b"keystamp credential consistency probe";

/// Decrypted API signing credentials.
///
/// The private scalar is zeroized on drop.
pub struct CredentialBundle {
    private_key: SecretScalar,
    public_key: CompressedPoint,
}

impl CredentialBundle {
    /// Derives the public key from `private_key` and checks the pair.
    pub fn from_private_key(private_key: SecretScalar) -> Result<Self> {
        let public_key = derive_public_key(&private_key)?;
        Ok(Self {
            private_key,
            public_key,
        })
    }

    pub fn private_key(&self) -> &SecretScalar {
        &self.private_key
    }

    /// Compressed SEC1 public key.
    pub fn public_key(&self) -> &CompressedPoint {
        &self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    /// ECDSA P-256 / SHA-256 with a randomized nonce, DER encoded.
    pub(crate) fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::from_slice(self.private_key.expose_secret())
            .map_err(|e| Error::Signing(format!("rejected private key: {}", e)))?;
        let signature: Signature = signing_key
            .try_sign_with_rng(&mut OsRng, payload)
            .map_err(|e| Error::Signing(e.to_string()))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Computes `compress(d·G)` and verifies the result is consistent with `d`.
fn derive_public_key(private_key: &SecretScalar) -> Result<CompressedPoint> {
    let secret = private_key
        .to_secret_key()
        .map_err(|_| Error::Integrity("decrypted scalar is not a valid P-256 private key".into()))?;
    let compressed = point::encode_compressed(&secret.public_key());

    let signing_key = SigningKey::from(secret);
    let verifying_key = VerifyingKey::from_sec1_bytes(&compressed)
        .map_err(|_| Error::Integrity("derived public key is not on the curve".into()))?;
    if signing_key.verifying_key() != &verifying_key {
        return Err(Error::Integrity(
            "derived public key does not match private key".into(),
        ));
    }

    let probe: Signature = signing_key
        .try_sign_with_rng(&mut OsRng, CONSISTENCY_PROBE)
        .map_err(|e| Error::Integrity(format!("probe signature failed: {}", e)))?;
    verifying_key
        .verify(CONSISTENCY_PROBE, &probe)
        .map_err(|_| Error::Integrity("probe signature does not verify".into()))?;

    Ok(compressed)
}

/// Decrypts a base58check credential bundle addressed to `tek`.
pub fn decrypt_credential_bundle(bundle: &str, tek: &TekManager) -> Result<CredentialBundle> {
    let recipient_public_key = tek.public_key()?;

    let decoded = bs58::decode(bundle)
        .with_check(None)
        .into_vec()
        .map_err(|e| Error::Decode(format!("invalid base58check bundle: {}", e)))?;
    if decoded.len() <= COMPRESSED_POINT_LEN {
        return Err(Error::Decode(format!(
            "bundle too short: {} bytes",
            decoded.len()
        )));
    }

    let (sender_compressed, ciphertext) = decoded.split_at(COMPRESSED_POINT_LEN);
    let sender_public_key = point::decompress(sender_compressed)?;

    let mut aad = Vec::with_capacity(sender_public_key.len() + recipient_public_key.len());
    aad.extend_from_slice(&sender_public_key);
    aad.extend_from_slice(&recipient_public_key);

    let plaintext = tek
        .open(&sender_public_key, ciphertext, BUNDLE_HPKE_INFO, &aad)
        .map_err(|e| {
            warn!(error = %e, "Credential bundle decryption rejected");
            e
        })?;

    let private_key = SecretScalar::from_slice(&plaintext).map_err(|_| {
        Error::Integrity(format!(
            "decrypted key has {} bytes, expected {}",
            plaintext.len(),
            keystamp_crypto::SCALAR_LEN
        ))
    })?;
    let credentials = CredentialBundle::from_private_key(private_key).map_err(|e| {
        warn!(error = %e, "Decrypted credential failed integrity check");
        e
    })?;

    debug!(
        public_key = %credentials.public_key_hex(),
        "Unwrapped credential bundle"
    );
    Ok(credentials)
}

/// Seals `private_key` to `recipient_public_key` in the credential-bundle
/// wire format. This is the issuing side of [`decrypt_credential_bundle`].
pub fn encrypt_credential_bundle(
    recipient_public_key: &[u8],
    private_key: &SecretScalar,
) -> Result<String> {
    seal_bundle(recipient_public_key, private_key.expose_secret())
}

fn seal_bundle(recipient_public_key: &[u8], plaintext: &[u8]) -> Result<String> {
    let recipient = <SuiteKem as KemTrait>::PublicKey::from_bytes(recipient_public_key)
        .map_err(|e| Error::InvalidKeyMaterial(format!("invalid recipient key: {:?}", e)))?;

    let (encapped_key, mut sender_ctx) = hpke::setup_sender::<SuiteAead, SuiteKdf, SuiteKem, _>(
        &OpModeS::Base,
        &recipient,
        BUNDLE_HPKE_INFO,
        &mut OsRng,
    )
    .map_err(|e| Error::InvalidState(format!("HPKE setup failed: {:?}", e)))?;

    let sender_public_key = encapped_key.to_bytes();
    let recipient_bytes = recipient.to_bytes();
    let mut aad = Vec::with_capacity(sender_public_key.len() + recipient_bytes.len());
    aad.extend_from_slice(&sender_public_key);
    aad.extend_from_slice(&recipient_bytes);

    let ciphertext = sender_ctx
        .seal(plaintext, &aad)
        .map_err(|e| Error::InvalidState(format!("HPKE seal failed: {:?}", e)))?;

    let sender_compressed = point::compress(&sender_public_key)?;
    let mut wire = Vec::with_capacity(COMPRESSED_POINT_LEN + ciphertext.len());
    wire.extend_from_slice(&sender_compressed);
    wire.extend_from_slice(&ciphertext);

    Ok(bs58::encode(wire).with_check().into_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_tek() -> TekManager {
        let mut tek = TekManager::new();
        tek.generate();
        tek
    }

    fn random_scalar() -> SecretScalar {
        SecretScalar::from_secret_key(&p256::SecretKey::random(&mut OsRng))
    }

    #[test]
    fn test_bundle_roundtrip() {
        let tek = ready_tek();
        let scalar = random_scalar();
        let bundle = encrypt_credential_bundle(&tek.public_key().unwrap(), &scalar).unwrap();

        let credentials = decrypt_credential_bundle(&bundle, &tek).unwrap();
        assert!(credentials.private_key().ct_eq(&scalar));

        let expected = point::encode_compressed(&scalar.to_secret_key().unwrap().public_key());
        assert_eq!(credentials.public_key(), &expected);
    }

    #[test]
    fn test_requires_initialized_tek() {
        let tek = ready_tek();
        let bundle =
            encrypt_credential_bundle(&tek.public_key().unwrap(), &random_scalar()).unwrap();

        let result = decrypt_credential_bundle(&bundle, &TekManager::new());
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let tek = ready_tek();
        let bundle =
            encrypt_credential_bundle(&tek.public_key().unwrap(), &random_scalar()).unwrap();

        let mut raw = bs58::decode(&bundle).into_vec().unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let corrupted = bs58::encode(raw).into_string();

        let result = decrypt_credential_bundle(&corrupted, &tek);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_rejects_non_base58() {
        let tek = ready_tek();
        let result = decrypt_credential_bundle("0OIl not base58", &tek);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_rejects_short_payload() {
        let tek = ready_tek();
        for len in [0usize, 1, 32, 33] {
            let bundle = bs58::encode(vec![0x02u8; len]).with_check().into_string();
            let result = decrypt_credential_bundle(&bundle, &tek);
            assert!(matches!(result, Err(Error::Decode(_))), "len {}", len);
        }
    }

    #[test]
    fn test_rejects_invalid_sender_point() {
        let tek = ready_tek();
        let mut wire = vec![0xffu8; COMPRESSED_POINT_LEN + 48];
        wire[0] = 0x02;
        let bundle = bs58::encode(wire).with_check().into_string();

        let result = decrypt_credential_bundle(&bundle, &tek);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_wrong_recipient_is_decryption_failure() {
        let intended = ready_tek();
        let other = ready_tek();
        let bundle =
            encrypt_credential_bundle(&intended.public_key().unwrap(), &random_scalar()).unwrap();

        let result = decrypt_credential_bundle(&bundle, &other);
        assert!(matches!(result, Err(Error::DecryptionFailure)));
    }

    #[test]
    fn test_zero_scalar_is_integrity_error() {
        let tek = ready_tek();
        let zero = SecretScalar::from_slice(&[0u8; 32]).unwrap();
        let bundle = encrypt_credential_bundle(&tek.public_key().unwrap(), &zero).unwrap();

        let result = decrypt_credential_bundle(&bundle, &tek);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_scalar_above_order_is_integrity_error() {
        let tek = ready_tek();
        let too_large = SecretScalar::from_slice(&[0xffu8; 32]).unwrap();
        let bundle = encrypt_credential_bundle(&tek.public_key().unwrap(), &too_large).unwrap();

        let result = decrypt_credential_bundle(&bundle, &tek);
        assert!(matches!(result, Err(Error::Integrity(_))));
    }

    #[test]
    fn test_wrong_length_plaintext_is_integrity_error() {
        let tek = ready_tek();
        let recipient = tek.public_key().unwrap();
        for len in [31usize, 33] {
            let bundle = seal_bundle(&recipient, &vec![0x42u8; len]).unwrap();
            let result = decrypt_credential_bundle(&bundle, &tek);
            assert!(matches!(result, Err(Error::Integrity(_))), "len {}", len);
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let credentials = CredentialBundle::from_private_key(
            SecretScalar::from_slice(&[0x11u8; 32]).unwrap(),
        )
        .unwrap();
        let printed = format!("{:?}", credentials);
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains(&"11".repeat(32)));
    }

    #[test]
    fn test_sign_produces_verifiable_der() {
        let credentials = CredentialBundle::from_private_key(random_scalar()).unwrap();
        let der = credentials.sign(b"payload").unwrap();
        let signature = Signature::from_der(&der).unwrap();
        let verifying_key = VerifyingKey::from_sec1_bytes(credentials.public_key()).unwrap();
        assert!(verifying_key.verify(b"payload", &signature).is_ok());
    }
}
