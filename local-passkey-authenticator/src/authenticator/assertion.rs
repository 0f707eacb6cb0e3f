//! Signing with existing credentials.

use local_passkey_types::{
    ctap2::{AuthenticatorData, CodecError},
    response::AssertionResponse,
    Bytes, CredentialId, CredentialRecord,
};

use super::{registration::CLIENT_DATA_HASH_LEN, Ceremony};
use crate::{Authenticator, CredentialStore, Error, PlatformIdentityIndex, SecureKeyProvider};

/// A request to sign with an existing credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The credential chosen by the user.
    pub credential_id: CredentialId,
    /// The Relying Party asking for the assertion.
    pub relying_party_identifier: String,
    /// SHA-256 hash of the client data, computed by the host.
    pub client_data_hash: Bytes,
}

impl<S, K, I> Authenticator<S, K, I>
where
    S: CredentialStore + Send + Sync,
    K: SecureKeyProvider + Send + Sync,
    I: PlatformIdentityIndex + Send + Sync,
{
    /// Sign `authenticatorData || clientDataHash` with the requested credential.
    ///
    /// The incremented signature counter is persisted last, and only if nothing else updated it
    /// since it was read. When any step fails, no assertion is returned and the stored counter is
    /// left as it was.
    pub async fn assert(&mut self, request: Request) -> Result<AssertionResponse, Error> {
        if request.client_data_hash.len() != CLIENT_DATA_HASH_LEN {
            return Err(CodecError::ClientDataHashLength(request.client_data_hash.len()).into());
        }
        let credential_id = request.credential_id;

        let record = self.store.get(&credential_id).await?;
        if record.relying_party_identifier != request.relying_party_identifier {
            return Err(Error::RelyingPartyMismatch {
                stored: record.relying_party_identifier,
                requested: request.relying_party_identifier,
            });
        }

        let Some(handle) = self.key_provider.load_key(&credential_id).await? else {
            log::error!("credential {credential_id} has a record but no signing key");
            return Err(Error::KeyNotFound(credential_id));
        };

        let expected_counter = record.signature_counter;
        let counter = expected_counter
            .checked_add(1)
            .ok_or(Error::CounterExhausted(credential_id))?;

        let auth_data = AuthenticatorData::new(&record.relying_party_identifier, counter)
            .set_flags(self.flags(Ceremony::Assertion))
            .to_vec()?;
        let mut signature_target = auth_data.clone();
        signature_target.extend_from_slice(&request.client_data_hash);
        let signature = self.key_provider.sign(&handle, &signature_target).await?;

        let updated = CredentialRecord {
            signature_counter: counter,
            ..record
        };
        self.store
            .compare_and_update(&credential_id, expected_counter, &updated)
            .await?;
        log::debug!("credential {credential_id} signed with counter {counter}");

        Ok(AssertionResponse {
            user_handle: updated.user_handle,
            relying_party: updated.relying_party_identifier,
            signature: signature.into(),
            client_data_hash: request.client_data_hash,
            authenticator_data: auth_data.into(),
            credential_id: credential_id.into(),
        })
    }
}
