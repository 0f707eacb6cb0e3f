//! Entries of the platform's credential identity index.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{Bytes, CredentialId, CredentialRecord};

/// What the platform needs to offer a credential to the user before the authenticator is asked
/// to sign with it.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformIdentity {
    /// The Relying Party the credential is scoped to.
    pub relying_party_identifier: String,

    /// The account name shown to the user.
    pub user_name: String,

    /// The credential the entry stands for.
    #[serde(rename = "credentialID")]
    pub credential_id: Bytes,

    /// The Relying Party's opaque identifier of the user account.
    pub user_handle: Bytes,
}

impl PlatformIdentity {
    /// Build the index entry of a stored credential.
    pub fn new(credential_id: &CredentialId, record: &CredentialRecord) -> Self {
        Self {
            relying_party_identifier: record.relying_party_identifier.clone(),
            user_name: record.user_name.clone(),
            credential_id: (*credential_id).into(),
            user_handle: record.user_handle.clone(),
        }
    }
}
