#[cfg(any(feature = "tokio", test))]
use std::sync::Arc;

use chrono::{DateTime, Utc};
use local_passkey_types::{CredentialId, CredentialRecord};
use serde::{Deserialize, Serialize};

use crate::Error;

mod file;
mod items;
mod memory;

pub use self::{file::FileStore, memory::MemoryStore};

/// When a stored item may be read, mirroring the data protection classes of platform keychains.
///
/// Stores record the class with every item. Enforcing it is up to the storage the item ends up
/// in, a keychain applies it natively while [`FileStore`] restricts the file to its owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accessibility {
    /// Only while the device is unlocked, never migrated to another device.
    #[default]
    WhenUnlockedThisDeviceOnly,
    /// After the first unlock following a restart, never migrated to another device.
    AfterFirstUnlockThisDeviceOnly,
}

/// A record together with the identifier it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    /// The credential the record belongs to.
    pub credential_id: CredentialId,
    /// The persisted metadata.
    pub record: CredentialRecord,
    /// When the record was first inserted.
    pub created_at: DateTime<Utc>,
}

impl StoredCredential {
    /// Whether the Relying Party or the user name contains `search`, ignoring case.
    ///
    /// An empty search matches everything.
    pub fn matches(&self, search: &str) -> bool {
        if search.is_empty() {
            return true;
        }
        let search = search.to_lowercase();
        self.record
            .relying_party_identifier
            .to_lowercase()
            .contains(&search)
            || self.record.user_name.to_lowercase().contains(&search)
    }
}

/// Durable storage of [`CredentialRecord`]s, keyed by [`CredentialId`].
///
/// Implementations must make [`compare_and_update`](Self::compare_and_update) atomic with respect
/// to every other writer of the same record, that is what keeps signature counters monotonic.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait CredentialStore {
    /// Persist the record of a new credential.
    ///
    /// Fails with [`Error::DuplicateIdentifier`] if a record already exists for `credential_id`.
    async fn insert(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error>;

    /// Replace the record of an existing credential.
    ///
    /// Fails with [`Error::RecordNotFound`] if there is no record to replace.
    async fn update(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error>;

    /// Replace the record only if its stored signature counter still equals `expected_counter`.
    ///
    /// Fails with [`Error::CounterMismatch`] when another writer got there first.
    async fn compare_and_update(
        &mut self,
        credential_id: &CredentialId,
        expected_counter: u32,
        record: &CredentialRecord,
    ) -> Result<(), Error>;

    /// Read the record of a credential.
    ///
    /// Fails with [`Error::RecordNotFound`] if there is none.
    async fn get(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error>;

    /// Remove the record of a credential. Removing a missing record succeeds.
    async fn delete(&mut self, credential_id: &CredentialId) -> Result<(), Error>;

    /// Every stored record, in no particular order.
    async fn list_all(&self) -> Result<Vec<StoredCredential>, Error>;
}

#[cfg(any(feature = "tokio", test))]
#[async_trait::async_trait]
impl<S: CredentialStore + Send + Sync> CredentialStore for Arc<tokio::sync::Mutex<S>> {
    async fn insert(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.lock().await.insert(credential_id, record).await
    }

    async fn update(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.lock().await.update(credential_id, record).await
    }

    async fn compare_and_update(
        &mut self,
        credential_id: &CredentialId,
        expected_counter: u32,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.lock()
            .await
            .compare_and_update(credential_id, expected_counter, record)
            .await
    }

    async fn get(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error> {
        self.lock().await.get(credential_id).await
    }

    async fn delete(&mut self, credential_id: &CredentialId) -> Result<(), Error> {
        self.lock().await.delete(credential_id).await
    }

    async fn list_all(&self) -> Result<Vec<StoredCredential>, Error> {
        self.lock().await.list_all().await
    }
}

#[cfg(test)]
mod tests;
