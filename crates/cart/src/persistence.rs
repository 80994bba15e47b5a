//! Persisting cart contents across process restarts.
//!
//! The cart itself never touches storage. A [`CartRepository`] serializes the
//! line item collection on request; [`JsonFileCartRepository`] is the
//! file-backed implementation used by the CLI.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bitebox_core::CurrencyCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::error::CartError;
use crate::line_item::LineItem;
use crate::store::CartStore;

/// Current on-disk format version.
pub const STORED_CART_VERSION: u32 = 1;

/// Errors loading or saving a cart.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported cart format version {0} (expected {STORED_CART_VERSION})")]
    UnsupportedVersion(u32),

    #[error("Stored cart is priced in {stored} but the session uses {expected}")]
    CurrencyMismatch {
        stored: CurrencyCode,
        expected: CurrencyCode,
    },

    #[error("Stored cart is invalid: {0}")]
    InvalidCart(#[from] CartError),
}

/// Serialized form of a cart's contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCart {
    pub version: u32,
    pub currency: CurrencyCode,
    pub items: Vec<LineItem>,
}

impl StoredCart {
    /// Capture the current contents of `cart`.
    #[must_use]
    pub fn from_store(cart: &CartStore) -> Self {
        Self {
            version: STORED_CART_VERSION,
            currency: cart.currency(),
            items: cart.items(),
        }
    }

    /// Load these contents into `cart`, replacing whatever it holds.
    ///
    /// # Errors
    ///
    /// Fails on an unknown format version, a currency that differs from the
    /// cart's, or any item the cart would reject. The cart is untouched on
    /// failure.
    pub fn restore_into(self, cart: &CartStore) -> Result<(), PersistenceError> {
        if self.version != STORED_CART_VERSION {
            return Err(PersistenceError::UnsupportedVersion(self.version));
        }
        if self.currency != cart.currency() {
            return Err(PersistenceError::CurrencyMismatch {
                stored: self.currency,
                expected: cart.currency(),
            });
        }
        cart.restore(self.items)?;
        Ok(())
    }
}

/// Storage for a single session's cart.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Load the stored cart, or `None` if nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or decoded.
    async fn load(&self) -> Result<Option<StoredCart>, PersistenceError>;

    /// Replace the stored cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    async fn save(&self, cart: &StoredCart) -> Result<(), PersistenceError>;

    /// Remove the stored cart. Deleting a missing cart is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be modified.
    async fn delete(&self) -> Result<(), PersistenceError>;
}

/// Stores the cart as a JSON document at a fixed path.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write never leaves a truncated cart behind.
#[derive(Debug, Clone)]
pub struct JsonFileCartRepository {
    path: PathBuf,
}

impl JsonFileCartRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CartRepository for JsonFileCartRepository {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<StoredCart>, PersistenceError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved cart");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let stored: StoredCart = serde_json::from_slice(&bytes)?;
        debug!(lines = stored.items.len(), "Loaded saved cart");
        Ok(Some(stored))
    }

    #[instrument(skip(self, cart), fields(path = %self.path.display(), lines = cart.items.len()))]
    async fn save(&self, cart: &StoredCart) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(cart)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        debug!("Saved cart");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn delete(&self) -> Result<(), PersistenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Deleted saved cart");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bitebox_core::Money;

    use super::*;
    use crate::pricing::StandardPricing;

    fn usd(s: &str) -> Money {
        Money::parse(s, CurrencyCode::USD).unwrap()
    }

    fn cart() -> CartStore {
        CartStore::new(CurrencyCode::USD, StandardPricing::default())
    }

    #[tokio::test]
    async fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileCartRepository::new(dir.path().join("cart.json"));
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_reproduces_items() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileCartRepository::new(dir.path().join("nested").join("cart.json"));

        let original = cart();
        original.add_item("A", "Falafel wrap", usd("7.25"), 2).unwrap();
        original.add_item("B", "Hummus", usd("3.10"), 1).unwrap();
        repo.save(&StoredCart::from_store(&original)).await.unwrap();
        assert!(!repo.temp_path().exists());

        let restored = cart();
        repo.load()
            .await
            .unwrap()
            .unwrap()
            .restore_into(&restored)
            .unwrap();

        assert_eq!(restored.items(), original.items());
        assert_eq!(restored.totals(), original.totals());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileCartRepository::new(dir.path().join("cart.json"));
        repo.save(&StoredCart::from_store(&cart())).await.unwrap();

        repo.delete().await.unwrap();
        repo.delete().await.unwrap();
        assert!(repo.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cart.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let repo = JsonFileCartRepository::new(path);
        assert!(matches!(
            repo.load().await,
            Err(PersistenceError::Serialization(_))
        ));
    }

    #[test]
    fn test_restore_rejects_other_currency() {
        let stored = StoredCart {
            version: STORED_CART_VERSION,
            currency: CurrencyCode::EUR,
            items: vec![],
        };
        assert!(matches!(
            stored.restore_into(&cart()),
            Err(PersistenceError::CurrencyMismatch {
                stored: CurrencyCode::EUR,
                expected: CurrencyCode::USD,
            })
        ));
    }

    #[test]
    fn test_restore_rejects_unknown_version() {
        let stored = StoredCart {
            version: 99,
            currency: CurrencyCode::USD,
            items: vec![],
        };
        assert!(matches!(
            stored.restore_into(&cart()),
            Err(PersistenceError::UnsupportedVersion(99))
        ));
    }

    #[test]
    fn test_restore_rejects_invalid_items() {
        let json = r#"{
            "version": 1,
            "currency": "USD",
            "items": [{"product_id":"A","name":"x","unit_price":{"amount":"-1","currency_code":"USD"},"quantity":1}]
        }"#;
        let stored: StoredCart = serde_json::from_str(json).unwrap();
        let target = cart();
        assert!(matches!(
            stored.restore_into(&target),
            Err(PersistenceError::InvalidCart(CartError::InvalidArgument(_)))
        ));
        assert!(target.is_empty());
    }
}
