use local_passkey_types::{CredentialId, CredentialRecord};

use super::{items::Items, Accessibility, CredentialStore, StoredCredential};
use crate::Error;

/// In-memory store for credential records.
///
/// Records are kept in their encoded form, exactly as a persistent store would hold them. Wrap it
/// in an `Arc<tokio::sync::Mutex<_>>` to share it between an authenticator and a management
/// surface.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Items,
    accessibility: Accessibility,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the accessibility class recorded with new items.
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    pub(crate) fn accessibility(&self, credential_id: &CredentialId) -> Option<Accessibility> {
        self.items.accessibility(credential_id)
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&mut self, key: &str, data: Vec<u8>) {
        self.items.insert_raw(key, data);
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn insert(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.items.insert(credential_id, record, self.accessibility)
    }

    async fn update(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.items.update(credential_id, record)
    }

    async fn compare_and_update(
        &mut self,
        credential_id: &CredentialId,
        expected_counter: u32,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.items
            .compare_and_update(credential_id, expected_counter, record)
    }

    async fn get(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error> {
        self.items.get(credential_id)
    }

    async fn delete(&mut self, credential_id: &CredentialId) -> Result<(), Error> {
        self.items.delete(credential_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredCredential>, Error> {
        self.items.list()
    }
}
