//! Core error types
//!
//! Every fallible operation in the workspace returns [`Error`]. Each variant
//! is a distinct failure kind so callers can decide whether to prompt for
//! re-authentication, surface a security alert, or report a programming error.
//! Messages never carry secret material.

use thiserror::Error;

/// Error type shared by all keystamp crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A key pair was required but none was generated or imported.
    #[error("Key-encapsulation key pair not initialized")]
    NotInitialized,

    /// HPKE open was attempted on a manager holding no key.
    #[error("No key-encapsulation key available for decryption")]
    NoKey,

    /// The wire bundle failed checksum validation, was too short, or
    /// carried an invalid curve point.
    #[error("Bundle decode error: {0}")]
    Decode(String),

    /// HPKE authenticated decryption failed.
    #[error("HPKE decryption failed")]
    DecryptionFailure,

    /// A decrypted scalar did not reproduce a consistent key pair.
    #[error("Credential integrity check failed: {0}")]
    Integrity(String),

    /// `stamp` was called before credentials were injected.
    #[error("No credential bundle injected")]
    NoCredentials,

    /// The signing engine rejected the key material.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Malformed serialized key blob or raw key on import.
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Invalid internal state (e.g. HPKE sender setup failed)
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Payload-free tag for [`Error`], for branching and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotInitialized,
    NoKey,
    Decode,
    DecryptionFailure,
    Integrity,
    NoCredentials,
    Signing,
    InvalidKeyMaterial,
    InvalidState,
    Config,
    Serialization,
    Io,
}

impl Error {
    /// Returns the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotInitialized => ErrorKind::NotInitialized,
            Error::NoKey => ErrorKind::NoKey,
            Error::Decode(_) => ErrorKind::Decode,
            Error::DecryptionFailure => ErrorKind::DecryptionFailure,
            Error::Integrity(_) => ErrorKind::Integrity,
            Error::NoCredentials => ErrorKind::NoCredentials,
            Error::Signing(_) => ErrorKind::Signing,
            Error::InvalidKeyMaterial(_) => ErrorKind::InvalidKeyMaterial,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::Config(_) => ErrorKind::Config,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// True for failures that indicate tampering or corrupted key material.
    pub fn is_security_event(&self) -> bool {
        matches!(self, Error::DecryptionFailure | Error::Integrity(_))
    }
}

/// Result type for keystamp operations.
pub type Result<T> = std::result::Result<T, Error>;
