//! Creation of new credentials.

use local_passkey_types::{
    ctap2::{AttestationObject, AttestedCredentialData, AuthenticatorData, CodecError, Ec2PublicKey},
    response::RegistrationResponse,
    Bytes, CredentialId, CredentialRecord, PlatformIdentity,
};

use super::Ceremony;
use crate::{Authenticator, CredentialStore, Error, PlatformIdentityIndex, SecureKeyProvider};

/// Length of the SHA-256 hash of the client data.
pub(super) const CLIENT_DATA_HASH_LEN: usize = 32;

/// A request to create a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The Relying Party the credential will be scoped to.
    pub relying_party_identifier: String,
    /// The account name shown to the user. May be empty.
    pub user_name: String,
    /// The Relying Party's opaque identifier of the user account, at most 64 bytes.
    pub user_handle: Bytes,
    /// SHA-256 hash of the client data, computed by the host.
    pub client_data_hash: Bytes,
}

/// How far a registration got before failing, which decides what has to be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    KeyGeneration,
    Encoding,
    Insertion,
}

impl<S, K, I> Authenticator<S, K, I>
where
    S: CredentialStore + Send + Sync,
    K: SecureKeyProvider + Send + Sync,
    I: PlatformIdentityIndex + Send + Sync,
{
    /// Create a new credential and return its `none` attestation.
    ///
    /// A key and a record are created as a pair: when any step after key generation fails, what
    /// was created so far is removed again before the error is returned. Failing to add the new
    /// credential to the platform's identity index is only logged.
    pub async fn register(&mut self, request: Request) -> Result<RegistrationResponse, Error> {
        if request.client_data_hash.len() != CLIENT_DATA_HASH_LEN {
            return Err(CodecError::ClientDataHashLength(request.client_data_hash.len()).into());
        }
        let record = CredentialRecord::new(
            request.relying_party_identifier,
            request.user_name,
            request.user_handle,
        )?;

        let credential_id = CredentialId::random();
        log::debug!(
            "registering credential {credential_id} for {}",
            record.relying_party_identifier
        );

        let mut stage = Stage::KeyGeneration;
        let attestation_object = match self.create(&credential_id, &record, &mut stage).await {
            Ok(attestation_object) => attestation_object,
            Err(err) => {
                self.roll_back(&credential_id, stage, &err).await;
                return Err(err);
            }
        };

        if let Err(err) = self
            .identity_index
            .add(PlatformIdentity::new(&credential_id, &record))
            .await
        {
            log::warn!("could not add credential {credential_id} to the identity index: {err}");
        }

        Ok(RegistrationResponse {
            relying_party: record.relying_party_identifier,
            client_data_hash: request.client_data_hash,
            credential_id: credential_id.into(),
            attestation_object: attestation_object.into(),
        })
    }

    async fn create(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
        stage: &mut Stage,
    ) -> Result<Vec<u8>, Error> {
        let handle = self.key_provider.generate_key(credential_id).await?;

        *stage = Stage::Encoding;
        let public_key = Ec2PublicKey::from_uncompressed(&self.key_provider.public_key(&handle)?)?;
        let acd = AttestedCredentialData::new(self.aaguid, credential_id.as_bytes(), &public_key)?;
        let auth_data = AuthenticatorData::new(&record.relying_party_identifier, 0)
            .set_attested_credential_data(acd)
            .set_flags(self.flags(Ceremony::Registration));
        let attestation_object = AttestationObject::none(auth_data).to_vec()?;

        *stage = Stage::Insertion;
        self.store.insert(credential_id, record).await?;

        Ok(attestation_object)
    }

    async fn roll_back(&mut self, credential_id: &CredentialId, stage: Stage, cause: &Error) {
        // Whatever already existed under this identifier belongs to another credential.
        let duplicate = matches!(cause, Error::DuplicateIdentifier(_));

        if stage == Stage::Insertion && !duplicate {
            if let Err(err) = self.store.delete(credential_id).await {
                log::error!("could not roll back record of {credential_id}: {err}");
            }
        }
        if stage == Stage::KeyGeneration && duplicate {
            return;
        }
        if let Err(err) = self.key_provider.delete_key(credential_id).await {
            log::error!("could not roll back key of {credential_id}: {err}");
        }
    }
}

#[cfg(test)]
mod tests;
