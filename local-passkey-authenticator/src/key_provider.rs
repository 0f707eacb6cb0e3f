use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

use local_passkey_types::CredentialId;
use p256::ecdsa::{signature::Signer, Signature, SigningKey};

use crate::Error;

#[cfg(doc)]
use crate::Authenticator;

/// Pluggable access to the non-exportable signing keys of the [`Authenticator`].
///
/// Keys are ECDSA P-256 and addressed by the [`CredentialId`] of their credential. A platform
/// implementation would keep them in a secure element and gate [`generate_key`] and [`sign`]
/// behind biometric or passcode authentication, which is why those calls may suspend for as long
/// as a prompt is shown. A dismissed prompt must be reported as [`Error::UserCancelled`], a
/// failed one as [`Error::AuthenticationFailed`].
///
/// [`generate_key`]: SecureKeyProvider::generate_key
/// [`sign`]: SecureKeyProvider::sign
#[cfg_attr(any(test, feature = "testable"), mockall::automock(type KeyHandle = CredentialId;))]
#[async_trait::async_trait]
pub trait SecureKeyProvider {
    /// A reference to a key held by the provider. The private key itself never leaves it.
    type KeyHandle: Send + Sync;

    /// Create a new key for `credential_id`.
    ///
    /// Fails with [`Error::DuplicateIdentifier`] if a key already exists for it.
    async fn generate_key(&self, credential_id: &CredentialId) -> Result<Self::KeyHandle, Error>;

    /// Look up the key of `credential_id`, returning `None` if there is none.
    async fn load_key(&self, credential_id: &CredentialId)
        -> Result<Option<Self::KeyHandle>, Error>;

    /// The public half of the key as an uncompressed SEC1 point, `0x04 || X || Y`.
    fn public_key(&self, handle: &Self::KeyHandle) -> Result<Vec<u8>, Error>;

    /// Sign `message` with ECDSA over SHA-256, returning the DER encoded signature.
    async fn sign(&self, handle: &Self::KeyHandle, message: &[u8]) -> Result<Vec<u8>, Error>;

    /// Destroy the key of `credential_id`. Deleting a missing key succeeds.
    async fn delete_key(&self, credential_id: &CredentialId) -> Result<(), Error>;
}

#[async_trait::async_trait]
impl<K: SecureKeyProvider + Send + Sync> SecureKeyProvider for Arc<K> {
    type KeyHandle = K::KeyHandle;

    async fn generate_key(&self, credential_id: &CredentialId) -> Result<Self::KeyHandle, Error> {
        K::generate_key(self, credential_id).await
    }

    async fn load_key(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<Self::KeyHandle>, Error> {
        K::load_key(self, credential_id).await
    }

    fn public_key(&self, handle: &Self::KeyHandle) -> Result<Vec<u8>, Error> {
        K::public_key(self, handle)
    }

    async fn sign(&self, handle: &Self::KeyHandle, message: &[u8]) -> Result<Vec<u8>, Error> {
        K::sign(self, handle, message).await
    }

    async fn delete_key(&self, credential_id: &CredentialId) -> Result<(), Error> {
        K::delete_key(self, credential_id).await
    }
}

/// Handle to a key held by a [`SoftwareKeyProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareKeyHandle {
    credential_id: CredentialId,
}

impl SoftwareKeyHandle {
    /// The credential the key belongs to.
    pub fn credential_id(&self) -> &CredentialId {
        &self.credential_id
    }
}

/// A [`SecureKeyProvider`] keeping P-256 keys in process memory.
///
/// It never prompts. Useful for tests and for hosts without a secure element, where keys are
/// only as safe as the process holding them.
#[derive(Debug, Default)]
pub struct SoftwareKeyProvider {
    keys: Mutex<HashMap<CredentialId, SigningKey>>,
}

impl SoftwareKeyProvider {
    /// Create a provider holding no keys.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.keys().map(|keys| keys.len()).unwrap_or_default()
    }

    /// Whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a key exists for `credential_id`.
    pub fn contains(&self, credential_id: &CredentialId) -> bool {
        self.keys()
            .map(|keys| keys.contains_key(credential_id))
            .unwrap_or_default()
    }

    fn keys(&self) -> Result<MutexGuard<'_, HashMap<CredentialId, SigningKey>>, Error> {
        self.keys
            .lock()
            .map_err(|_| Error::KeyProvider("software key table is poisoned".into()))
    }

    fn signing_key(&self, handle: &SoftwareKeyHandle) -> Result<SigningKey, Error> {
        self.keys()?
            .get(&handle.credential_id)
            .cloned()
            .ok_or(Error::KeyNotFound(handle.credential_id))
    }
}

#[async_trait::async_trait]
impl SecureKeyProvider for SoftwareKeyProvider {
    type KeyHandle = SoftwareKeyHandle;

    async fn generate_key(&self, credential_id: &CredentialId) -> Result<Self::KeyHandle, Error> {
        match self.keys()?.entry(*credential_id) {
            Entry::Occupied(_) => Err(Error::DuplicateIdentifier(*credential_id)),
            Entry::Vacant(slot) => {
                slot.insert(SigningKey::random(&mut rand::thread_rng()));
                Ok(SoftwareKeyHandle {
                    credential_id: *credential_id,
                })
            }
        }
    }

    async fn load_key(
        &self,
        credential_id: &CredentialId,
    ) -> Result<Option<Self::KeyHandle>, Error> {
        Ok(self
            .keys()?
            .contains_key(credential_id)
            .then_some(SoftwareKeyHandle {
                credential_id: *credential_id,
            }))
    }

    fn public_key(&self, handle: &Self::KeyHandle) -> Result<Vec<u8>, Error> {
        let key = self.signing_key(handle)?;
        Ok(key.verifying_key().to_encoded_point(false).as_bytes().to_vec())
    }

    async fn sign(&self, handle: &Self::KeyHandle, message: &[u8]) -> Result<Vec<u8>, Error> {
        let signature: Signature = self.signing_key(handle)?.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    async fn delete_key(&self, credential_id: &CredentialId) -> Result<(), Error> {
        self.keys()?.remove(credential_id);
        Ok(())
    }
}

#[cfg(any(test, feature = "testable"))]
impl MockSecureKeyProvider {
    /// A provider whose every prompt is dismissed by the user.
    pub fn cancelling() -> Self {
        let mut provider = MockSecureKeyProvider::new();
        provider
            .expect_generate_key()
            .returning(|_| Err(Error::UserCancelled));
        provider.expect_load_key().returning(|id| Ok(Some(*id)));
        provider
            .expect_sign()
            .returning(|_, _| Err(Error::UserCancelled));
        provider.expect_delete_key().returning(|_| Ok(()));
        provider
    }
}
