//! Durable storage for sealed shop credentials.
//!
//! One SQLite row per shop. Reinstalls overwrite the previous row
//! atomically through an upsert, so the table never holds more than one
//! credential per shop and a half-written install can never be observed.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::info;

use crate::config::ShopDomain;

/// Errors from the credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database operation failed.
    #[error("credential store query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// A previous holder of the connection lock panicked.
    #[error("credential store lock is poisoned")]
    Poisoned,
}

/// A stored credential row as read back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// The shop domain the credential belongs to.
    pub shop: String,
    /// The sealed access token (hex IV prefix + hex ciphertext).
    pub sealed_token: String,
    /// When the credential was last written.
    pub installed_at: DateTime<Utc>,
}

/// The per-shop credential store.
///
/// A single serialized connection behind a `Mutex`; every operation is
/// one short statement, so contention is negligible at this service's
/// scale.
///
/// # Example
///
/// ```rust
/// use session_gate::store::CredentialStore;
/// use session_gate::ShopDomain;
///
/// let store = CredentialStore::open_in_memory().unwrap();
/// let shop = ShopDomain::new("example").unwrap();
///
/// store.upsert(&shop, "sealed-bytes").unwrap();
/// let row = store.fetch(&shop).unwrap().unwrap();
/// assert_eq!(row.sealed_token, "sealed-bytes");
/// ```
#[derive(Debug)]
pub struct CredentialStore {
    conn: Mutex<Connection>,
}

// Verify CredentialStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CredentialStore>();
};

impl CredentialStore {
    /// Opens (and if necessary creates) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the file cannot be opened or
    /// the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store, used by tests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the schema cannot be applied.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS stores (
                shop         TEXT PRIMARY KEY,
                sealed_token TEXT NOT NULL,
                installed_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Writes the sealed credential for `shop`, replacing any previous
    /// row in a single atomic statement. Last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the statement fails or the lock is
    /// poisoned.
    pub fn upsert(&self, shop: &ShopDomain, sealed_token: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        conn.execute(
            "INSERT INTO stores (shop, sealed_token, installed_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(shop) DO UPDATE SET
                 sealed_token = excluded.sealed_token,
                 installed_at = excluded.installed_at",
            rusqlite::params![shop.as_ref(), sealed_token, Utc::now().to_rfc3339()],
        )?;
        info!(shop = %shop, "stored sealed credential");
        Ok(())
    }

    /// Fetches the credential row for `shop`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the query fails or the lock is
    /// poisoned.
    pub fn fetch(&self, shop: &ShopDomain) -> Result<Option<StoredCredential>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let row = conn
            .query_row(
                "SELECT shop, sealed_token, installed_at FROM stores WHERE shop = ?1",
                [shop.as_ref()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(shop, sealed_token, installed_at)| StoredCredential {
            shop,
            sealed_token,
            installed_at: DateTime::parse_from_rfc3339(&installed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_default(),
        }))
    }
}
