use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use local_passkey_types::{Bytes, CredentialId, CredentialRecord};
use serde::{Deserialize, Serialize};

use super::{Accessibility, StoredCredential};
use crate::Error;

/// One stored entry: the CBOR encoded record plus the attributes the store keeps beside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct StoredItem {
    data: Bytes,
    created_at: DateTime<Utc>,
    accessibility: Accessibility,
}

impl StoredItem {
    fn new(record: &CredentialRecord, accessibility: Accessibility) -> Result<Self, Error> {
        Ok(Self {
            data: record.to_cbor()?.into(),
            created_at: Utc::now(),
            accessibility,
        })
    }

    fn replace_record(&mut self, record: &CredentialRecord) -> Result<(), Error> {
        self.data = record.to_cbor()?.into();
        Ok(())
    }

    fn record(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error> {
        CredentialRecord::from_cbor(&self.data).map_err(|err| Error::UndecodableRecord {
            credential_id: *credential_id,
            reason: err.to_string(),
        })
    }
}

/// The contents of one access group, keyed by the base64 form of each credential identifier.
///
/// Both stores keep their data in this shape, in memory or serialized to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub(super) struct Items(BTreeMap<String, StoredItem>);

impl Items {
    pub(super) fn insert(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
        accessibility: Accessibility,
    ) -> Result<(), Error> {
        let key = credential_id.to_base64();
        if self.0.contains_key(&key) {
            return Err(Error::DuplicateIdentifier(*credential_id));
        }
        self.0.insert(key, StoredItem::new(record, accessibility)?);
        Ok(())
    }

    pub(super) fn update(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        self.item_mut(credential_id)?.replace_record(record)
    }

    pub(super) fn compare_and_update(
        &mut self,
        credential_id: &CredentialId,
        expected_counter: u32,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        let item = self.item_mut(credential_id)?;
        let actual = item.record(credential_id)?.signature_counter;
        if actual != expected_counter {
            return Err(Error::CounterMismatch {
                credential_id: *credential_id,
                expected: expected_counter,
                actual,
            });
        }
        item.replace_record(record)
    }

    pub(super) fn get(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error> {
        self.0
            .get(&credential_id.to_base64())
            .ok_or(Error::RecordNotFound(*credential_id))?
            .record(credential_id)
    }

    /// Returns whether there was a record to remove.
    pub(super) fn delete(&mut self, credential_id: &CredentialId) -> bool {
        self.0.remove(&credential_id.to_base64()).is_some()
    }

    pub(super) fn list(&self) -> Result<Vec<StoredCredential>, Error> {
        self.0
            .iter()
            .map(|(key, item)| {
                let credential_id = CredentialId::from_base64(key)
                    .map_err(|err| Error::UnexpectedItem(format!("key {key:?}: {err}")))?;
                // Only the canonical key can be read or deleted again.
                if credential_id.to_base64() != *key {
                    return Err(Error::UnexpectedItem(format!(
                        "key {key:?} is not the canonical form {credential_id}"
                    )));
                }
                Ok(StoredCredential {
                    credential_id,
                    record: item.record(&credential_id)?,
                    created_at: item.created_at,
                })
            })
            .collect()
    }

    pub(super) fn len(&self) -> usize {
        self.0.len()
    }

    fn item_mut(&mut self, credential_id: &CredentialId) -> Result<&mut StoredItem, Error> {
        self.0
            .get_mut(&credential_id.to_base64())
            .ok_or(Error::RecordNotFound(*credential_id))
    }

    #[cfg(test)]
    pub(super) fn accessibility(&self, credential_id: &CredentialId) -> Option<Accessibility> {
        self.0
            .get(&credential_id.to_base64())
            .map(|item| item.accessibility)
    }

    #[cfg(test)]
    pub(super) fn insert_raw(&mut self, key: &str, data: Vec<u8>) {
        self.0.insert(
            key.to_owned(),
            StoredItem {
                data: data.into(),
                created_at: Utc::now(),
                accessibility: Accessibility::default(),
            },
        );
    }
}
