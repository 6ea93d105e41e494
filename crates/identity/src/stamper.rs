//! Request Stamper - per-request authentication.
//!
//! A [`Stamper`] holds the session's [`CredentialBundle`] and turns request
//! bodies into [`Stamp`] headers. It starts without credentials and becomes
//! ready once a bundle is injected; it never goes back.
//!
//! # Concurrency
//!
//! All methods take `&self`, so a stamper can be shared behind an `Arc` by
//! concurrent outbound requests. The credential lock is held only while the
//! signature is produced; encoding happens after it is released.

use keystamp_core::{ApiConfig, Error, Result};
use keystamp_crypto::TekManager;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::bundle::{decrypt_credential_bundle, CredentialBundle};
use crate::stamp::{ApiStamp, Stamp, SIGNATURE_SCHEME};

/// A request body together with the stamp authenticating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampedRequest {
    pub url: String,
    pub body: String,
    pub stamp: Stamp,
}

/// Signs request payloads with injected API credentials.
#[derive(Debug, Default)]
pub struct Stamper {
    credentials: Mutex<Option<CredentialBundle>>,
}

impl Stamper {
    /// Creates a stamper with no credentials.
    pub fn new() -> Self {
        Self {
            credentials: Mutex::new(None),
        }
    }

    /// Creates a ready stamper.
    pub fn with_credentials(credentials: CredentialBundle) -> Self {
        Self {
            credentials: Mutex::new(Some(credentials)),
        }
    }

    /// Installs credentials, replacing any previous ones.
    pub fn inject_credentials(&self, credentials: CredentialBundle) -> Result<()> {
        debug!(
            public_key = %credentials.public_key_hex(),
            "Injecting credentials into stamper"
        );
        *self.lock_credentials() = Some(credentials);
        Ok(())
    }

    /// Decrypts `bundle` with `tek` and installs the result.
    ///
    /// On failure the stamper keeps its previous state.
    pub fn inject_credential_bundle(&self, bundle: &str, tek: &TekManager) -> Result<()> {
        let credentials = decrypt_credential_bundle(bundle, tek)?;
        self.inject_credentials(credentials)
    }

    pub fn is_ready(&self) -> bool {
        self.lock_credentials().is_some()
    }

    /// Hex public key of the injected credentials.
    pub fn public_key_hex(&self) -> Option<String> {
        self.lock_credentials()
            .as_ref()
            .map(CredentialBundle::public_key_hex)
    }

    /// Signs `payload` and returns the stamp header.
    pub fn stamp(&self, payload: &[u8]) -> Result<Stamp> {
        let (public_key, signature) = {
            let guard = self.lock_credentials();
            let credentials = guard.as_ref().ok_or(Error::NoCredentials)?;
            (*credentials.public_key(), credentials.sign(payload)?)
        };

        let api_stamp = ApiStamp {
            public_key: hex::encode(public_key),
            scheme: SIGNATURE_SCHEME.to_string(),
            signature: hex::encode(signature),
        };
        debug!(payload_len = payload.len(), "Stamped payload");
        Stamp::from_api_stamp(&api_stamp)
    }

    // Every write under the lock is a single assignment, so a poisoned lock
    // still guards a consistent value.
    fn lock_credentials(&self) -> MutexGuard<'_, Option<CredentialBundle>> {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stamps `body` and addresses it to `path` under `api.base_url`.
    pub fn stamp_request(
        &self,
        api: &ApiConfig,
        path: &str,
        body: impl Into<String>,
    ) -> Result<StampedRequest> {
        let body = body.into();
        let stamp = self.stamp(body.as_bytes())?;
        Ok(StampedRequest {
            url: api.endpoint(path),
            body,
            stamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stamp::STAMP_HEADER_NAME;
    use keystamp_crypto::SecretScalar;
    use rand::rngs::OsRng;
    use std::sync::Arc;

    fn credentials() -> CredentialBundle {
        let secret = p256::SecretKey::random(&mut OsRng);
        CredentialBundle::from_private_key(SecretScalar::from_secret_key(&secret)).unwrap()
    }

    #[test]
    fn test_stamp_without_credentials() {
        let stamper = Stamper::new();
        assert!(!stamper.is_ready());
        assert!(stamper.public_key_hex().is_none());
        assert!(matches!(stamper.stamp(b"payload"), Err(Error::NoCredentials)));
        assert!(matches!(stamper.stamp(b""), Err(Error::NoCredentials)));
    }

    #[test]
    fn test_stamp_header_format() {
        let creds = credentials();
        let expected_key = creds.public_key_hex();
        let stamper = Stamper::with_credentials(creds);

        let stamp = stamper.stamp(b"{\"type\":\"whoami\"}").unwrap();
        assert_eq!(stamp.header_name, STAMP_HEADER_NAME);

        let decoded = stamp.decode().unwrap();
        assert_eq!(decoded.public_key, expected_key);
        assert_eq!(decoded.scheme, SIGNATURE_SCHEME);
        assert_eq!(decoded.signature, decoded.signature.to_lowercase());
        assert!(decoded.verify(b"{\"type\":\"whoami\"}").unwrap());
    }

    #[test]
    fn test_repeated_stamps_all_verify() {
        let stamper = Stamper::with_credentials(credentials());
        let first = stamper.stamp(b"same payload").unwrap();
        let second = stamper.stamp(b"same payload").unwrap();
        assert!(first.verify(b"same payload").unwrap());
        assert!(second.verify(b"same payload").unwrap());
    }

    #[test]
    fn test_reinjection_replaces_credentials() {
        let stamper = Stamper::new();
        let first = credentials();
        let first_key = first.public_key_hex();
        stamper.inject_credentials(first).unwrap();
        assert_eq!(stamper.public_key_hex(), Some(first_key));

        let second = credentials();
        let second_key = second.public_key_hex();
        stamper.inject_credentials(second).unwrap();
        assert!(stamper.is_ready());
        assert_eq!(stamper.public_key_hex(), Some(second_key.clone()));

        let stamp = stamper.stamp(b"x").unwrap();
        assert_eq!(stamp.decode().unwrap().public_key, second_key);
    }

    #[test]
    fn test_failed_injection_keeps_state() {
        let mut tek = TekManager::new();
        tek.generate();
        let stamper = Stamper::new();

        assert!(stamper.inject_credential_bundle("garbage", &tek).is_err());
        assert!(!stamper.is_ready());
    }

    #[test]
    fn test_concurrent_stamps() {
        let stamper = Arc::new(Stamper::with_credentials(credentials()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let stamper = Arc::clone(&stamper);
                std::thread::spawn(move || {
                    let payload = format!("request-{}", i);
                    let stamp = stamper.stamp(payload.as_bytes()).unwrap();
                    stamp.verify(payload.as_bytes()).unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn test_poisoned_lock_keeps_credentials_usable() {
        let creds = credentials();
        let expected_key = creds.public_key_hex();
        let stamper = Arc::new(Stamper::with_credentials(creds));

        let poisoner = Arc::clone(&stamper);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.credentials.lock().unwrap();
            panic!("poison the credential lock");
        })
        .join();
        assert!(joined.is_err());
        assert!(stamper.credentials.is_poisoned());

        assert!(stamper.is_ready());
        assert_eq!(stamper.public_key_hex(), Some(expected_key));
        let stamp = stamper.stamp(b"after poison").unwrap();
        assert!(stamp.verify(b"after poison").unwrap());

        stamper.inject_credentials(credentials()).unwrap();
        assert!(stamper.is_ready());
    }

    #[test]
    fn test_stamp_request() {
        let stamper = Stamper::with_credentials(credentials());
        let api = ApiConfig {
            base_url: "https://api.example.com".to_string(),
        };
        let request = stamper
            .stamp_request(&api, "/public/v1/query/whoami", "{\"organizationId\":\"org\"}")
            .unwrap();

        assert_eq!(request.url, "https://api.example.com/public/v1/query/whoami");
        assert!(request.stamp.verify(request.body.as_bytes()).unwrap());
    }

    #[test]
    fn test_stamp_request_without_credentials() {
        let stamper = Stamper::new();
        let result = stamper.stamp_request(&ApiConfig::default(), "/whoami", "{}");
        assert!(matches!(result, Err(Error::NoCredentials)));
    }
}
