//! The fixed HPKE parameter set used for credential-bundle encryption.
//!
//! DHKEM(P-256, HKDF-SHA256) + HKDF-SHA256 + AES-256-GCM in base mode, with
//! no output prefix on ciphertexts. The parameters are compile-time
//! constants; nothing here is initialized lazily or mutated.

pub type SuiteKem = hpke::kem::DhP256HkdfSha256;
pub type SuiteKdf = hpke::kdf::HkdfSha256;
pub type SuiteAead = hpke::aead::AesGcm256;

/// Ciphertext framing. Only the raw RFC 9180 output is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPrefix {
    NoPrefix,
}

/// RFC 9180 algorithm identifiers for the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HpkeSuite {
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
    pub prefix: OutputPrefix,
}

pub const HPKE_SUITE: HpkeSuite = HpkeSuite {
    kem_id: 0x0010,
    kdf_id: 0x0001,
    aead_id: 0x0002,
    prefix: OutputPrefix::NoPrefix,
};

impl HpkeSuite {
    /// True if the algorithm identifiers match this suite.
    pub fn matches(&self, kem_id: u16, kdf_id: u16, aead_id: u16) -> bool {
        self.kem_id == kem_id && self.kdf_id == kdf_id && self.aead_id == aead_id
    }
}
