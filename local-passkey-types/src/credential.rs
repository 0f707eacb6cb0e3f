//! What the authenticator remembers about each credential it created.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ctap2::CodecError, encoding, rand::random_array, Bytes};

/// The opaque identifier of a credential, 16 random bytes chosen at registration.
///
/// It is the primary key of every lookup: the stored record, the signing key and the platform
/// index entry are all addressed by it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialId([u8; Self::LEN]);

impl CredentialId {
    /// Length of every identifier issued by this authenticator.
    pub const LEN: usize = 16;

    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        Self(random_array())
    }

    /// Byte view of the identifier.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// The textual key this identifier is stored under, padded standard base64.
    pub fn to_base64(&self) -> String {
        encoding::base64(&self.0)
    }

    /// Parse a storage key produced by [`Self::to_base64`].
    pub fn from_base64(key: &str) -> Result<Self, CodecError> {
        let bytes = encoding::try_from_base64(key).ok_or(CodecError::NotBase64)?;
        Self::try_from(bytes.as_slice())
    }
}

impl From<[u8; 16]> for CredentialId {
    fn from(inner: [u8; 16]) -> Self {
        Self(inner)
    }
}

impl TryFrom<&[u8]> for CredentialId {
    type Error = CodecError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        value
            .try_into()
            .map(Self)
            .map_err(|_| CodecError::CredentialIdLength(value.len()))
    }
}

impl From<CredentialId> for Bytes {
    fn from(id: CredentialId) -> Self {
        id.0.into()
    }
}

impl fmt::Debug for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialId").field(&self.to_base64()).finish()
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for CredentialId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for CredentialId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bytes = Bytes::deserialize(deserializer)?;
        Self::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
    }
}

/// The metadata persisted for one credential.
///
/// Encoded with CBOR at rest. The field names are part of the stored format, existing records
/// keep the counter under `signCount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// The Relying Party the credential is scoped to, for example `example.com`.
    pub relying_party_identifier: String,

    /// The account name shown to the user. May be empty.
    pub user_name: String,

    /// The Relying Party's opaque identifier of the user account.
    pub user_handle: Bytes,

    /// Number of successful assertions made with this credential.
    #[serde(rename = "signCount")]
    pub signature_counter: u32,
}

impl CredentialRecord {
    /// The largest user handle WebAuthn allows.
    pub const MAX_USER_HANDLE_LEN: usize = 64;

    /// Create the record of a new credential, its counter starts at 0.
    pub fn new(
        relying_party_identifier: impl Into<String>,
        user_name: impl Into<String>,
        user_handle: Bytes,
    ) -> Result<Self, CodecError> {
        if user_handle.len() > Self::MAX_USER_HANDLE_LEN {
            return Err(CodecError::UserHandleTooLong(user_handle.len()));
        }
        Ok(Self {
            relying_party_identifier: relying_party_identifier.into(),
            user_name: user_name.into(),
            user_handle,
            signature_counter: 0,
        })
    }

    /// Encode the record to its stored form.
    pub fn to_cbor(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out)?;
        Ok(out)
    }

    /// Decode a record from its stored form.
    pub fn from_cbor(data: &[u8]) -> Result<Self, CodecError> {
        Ok(ciborium::de::from_reader(data)?)
    }
}
