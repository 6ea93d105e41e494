//! Request stamps.
//!
//! A stamp is a detached signature carried in a single HTTP header. The header
//! value is the unpadded base64url encoding of the JSON object
//!
//! ```json
//! {"publicKey":"<hex>","scheme":"SIGNATURE_SCHEME_TK_API_P256","signature":"<hex>"}
//! ```
//!
//! with fields in exactly that order. Hex is lowercase.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use keystamp_core::{Error, Result};
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Header carrying the stamp.
pub const STAMP_HEADER_NAME: &str = "X-Stamp";

/// Scheme identifier for ECDSA over P-256 with SHA-256.
pub const SIGNATURE_SCHEME: &str = "SIGNATURE_SCHEME_TK_API_P256";

/// The JSON object encoded into the header value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApiStamp {
    pub public_key: String,
    pub scheme: String,
    pub signature: String,
}

impl ApiStamp {
    pub fn to_header_value(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn from_header_value(value: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD
            .decode(value)
            .map_err(|e| Error::Decode(format!("stamp is not unpadded base64url: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| Error::Decode(format!("stamp is not a valid API stamp: {}", e)))
    }

    /// Checks the scheme and verifies the signature over `payload`.
    ///
    /// Returns `Ok(false)` for a well-formed stamp that does not verify and an
    /// error when the key or signature cannot be decoded.
    pub fn verify(&self, payload: &[u8]) -> Result<bool> {
        if self.scheme != SIGNATURE_SCHEME {
            return Ok(false);
        }
        let public_key = hex::decode(&self.public_key)
            .map_err(|_| Error::Decode("stamp public key is not hex".into()))?;
        let verifying_key = VerifyingKey::from_sec1_bytes(&public_key)
            .map_err(|_| Error::Decode("stamp public key is not a P-256 point".into()))?;
        let der = hex::decode(&self.signature)
            .map_err(|_| Error::Decode("stamp signature is not hex".into()))?;
        let signature = Signature::from_der(&der)
            .map_err(|_| Error::Decode("stamp signature is not DER".into()))?;

        Ok(verifying_key.verify(payload, &signature).is_ok())
    }
}

/// A header name/value pair ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub header_name: String,
    pub header_value: String,
}

impl Stamp {
    pub(crate) fn from_api_stamp(api_stamp: &ApiStamp) -> Result<Self> {
        Ok(Self {
            header_name: STAMP_HEADER_NAME.to_string(),
            header_value: api_stamp.to_header_value()?,
        })
    }

    /// Decodes the header value back into its JSON object.
    pub fn decode(&self) -> Result<ApiStamp> {
        ApiStamp::from_header_value(&self.header_value)
    }

    /// Decodes and verifies the stamp against `payload`.
    pub fn verify(&self, payload: &[u8]) -> Result<bool> {
        self.decode()?.verify(payload)
    }
}
