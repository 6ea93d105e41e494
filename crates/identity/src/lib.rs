//! Credential unwrapping and request authentication for keystamp clients.
//!
//! This crate turns a server-issued credential bundle into API signing
//! credentials and uses them to stamp outgoing requests.
//!
//! # Core Concepts
//!
//! - **Credential Bundle**: the API signing key, HPKE-sealed to the session's
//!   target encryption key and base58check encoded
//! - **Stamp**: a detached ECDSA P-256 signature over the request body, carried
//!   in the `X-Stamp` header
//!
//! # Flow
//!
//! ```no_run
//! use keystamp_crypto::TekManager;
//! use keystamp_identity::Stamper;
//!
//! # fn bundle_from_auth_endpoint(_: &str) -> String { unimplemented!() }
//! # fn main() -> keystamp_identity::Result<()> {
//! let mut tek = TekManager::new();
//! tek.generate();
//! let bundle = bundle_from_auth_endpoint(&tek.public_key_hex()?);
//!
//! let stamper = Stamper::new();
//! stamper.inject_credential_bundle(&bundle, &tek)?;
//! let stamp = stamper.stamp(br#"{"type":"ACTIVITY_TYPE_SIGN_RAW_PAYLOAD_V2"}"#)?;
//! println!("{}: {}", stamp.header_name, stamp.header_value);
//! # Ok(())
//! # }
//! ```

pub mod bundle;
pub mod stamp;
pub mod stamper;

pub use bundle::{
    decrypt_credential_bundle, encrypt_credential_bundle, CredentialBundle, BUNDLE_HPKE_INFO,
};
pub use stamp::{ApiStamp, Stamp, SIGNATURE_SCHEME, STAMP_HEADER_NAME};
pub use stamper::{StampedRequest, Stamper};

// Re-export core types for convenience
pub use keystamp_core::{Error, Result};
