use local_passkey_types::{CredentialId, PlatformIdentity};

use crate::{
    Authenticator, CredentialStore, Error, PlatformIdentityIndex, SecureKeyProvider,
    StoredCredential,
};

/// The order in which [`Authenticator::list_credentials`] returns credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// By Relying Party, then by user name.
    #[default]
    RelyingParty,
    /// By user name, then by Relying Party.
    UserName,
    /// Oldest first.
    CreationTime,
}

impl SortKey {
    fn sort(self, credentials: &mut [StoredCredential]) {
        match self {
            SortKey::RelyingParty => credentials.sort_by(|a, b| {
                (&a.record.relying_party_identifier, &a.record.user_name)
                    .cmp(&(&b.record.relying_party_identifier, &b.record.user_name))
            }),
            SortKey::UserName => credentials.sort_by(|a, b| {
                (&a.record.user_name, &a.record.relying_party_identifier)
                    .cmp(&(&b.record.user_name, &b.record.relying_party_identifier))
            }),
            SortKey::CreationTime => credentials.sort_by_key(|credential| credential.created_at),
        }
    }
}

fn identities(credentials: &[StoredCredential]) -> Vec<PlatformIdentity> {
    credentials
        .iter()
        .map(|credential| PlatformIdentity::new(&credential.credential_id, &credential.record))
        .collect()
}

impl<S, K, I> Authenticator<S, K, I>
where
    S: CredentialStore + Send + Sync,
    K: SecureKeyProvider + Send + Sync,
    I: PlatformIdentityIndex + Send + Sync,
{
    /// Every stored credential, sorted by `sort`.
    ///
    /// A listing is the full set of credentials, so it is also used to bring the platform's
    /// identity index up to date. Failing to do so is only logged.
    pub async fn list_credentials(&self, sort: SortKey) -> Result<Vec<StoredCredential>, Error> {
        let mut credentials = self.store.list_all().await?;
        if let Err(err) = self
            .identity_index
            .replace_all(identities(&credentials))
            .await
        {
            log::warn!("could not refresh the identity index: {err}");
        }
        sort.sort(&mut credentials);
        Ok(credentials)
    }

    /// Remove a credential: its signing key, its record and its identity index entry.
    ///
    /// The key goes first. Should removing the record then fail, the credential stays listed
    /// and deleting it again finishes the job.
    pub async fn delete_credential(&mut self, credential_id: &CredentialId) -> Result<(), Error> {
        self.key_provider.delete_key(credential_id).await?;
        self.store.delete(credential_id).await?;
        log::debug!("deleted credential {credential_id}");

        if let Err(err) = self.sync_identity_index().await {
            log::warn!("could not refresh the identity index after deleting {credential_id}: {err}");
        }
        Ok(())
    }

    /// Replace the platform's identity index with the stored credentials, reporting failures.
    pub async fn sync_identity_index(&self) -> Result<(), Error> {
        let credentials = self.store.list_all().await?;
        self.identity_index
            .replace_all(identities(&credentials))
            .await
    }
}
