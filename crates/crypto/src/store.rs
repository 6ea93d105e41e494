//! Session storage for the serialized target encryption key.
//!
//! The blob written here contains the private scalar. Real backends (OS
//! keychain, encrypted preferences) live outside this crate and implement
//! [`TekStore`].

use keystamp_core::{Error, Result};
use std::sync::Mutex;
use zeroize::Zeroizing;

/// Storage seam for the serialized TEK blob.
pub trait TekStore: Send + Sync {
    /// Returns the stored blob, if any.
    fn load(&self) -> Result<Option<Zeroizing<String>>>;

    /// Replaces the stored blob.
    fn save(&self, blob: &str) -> Result<()>;

    /// Removes the stored blob.
    fn clear(&self) -> Result<()>;
}

/// Process-local store, used for tests and short-lived sessions.
#[derive(Default)]
pub struct MemoryTekStore {
    blob: Mutex<Option<Zeroizing<String>>>,
}

impl MemoryTekStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TekStore for MemoryTekStore {
    fn load(&self) -> Result<Option<Zeroizing<String>>> {
        let guard = self
            .blob
            .lock()
            .map_err(|_| Error::InvalidState("TEK store lock poisoned".into()))?;
        Ok(guard.as_ref().map(|blob| Zeroizing::new(blob.to_string())))
    }

    fn save(&self, blob: &str) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| Error::InvalidState("TEK store lock poisoned".into()))?;
        *guard = Some(Zeroizing::new(blob.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .blob
            .lock()
            .map_err(|_| Error::InvalidState("TEK store lock poisoned".into()))?;
        guard.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTekStore::new();
        assert!(store.load().unwrap().is_none());

        store.save("blob-1").unwrap();
        assert_eq!(store.load().unwrap().unwrap().as_str(), "blob-1");

        store.save("blob-2").unwrap();
        assert_eq!(store.load().unwrap().unwrap().as_str(), "blob-2");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
