use serde::{Deserialize, Serialize};

use super::{AuthenticatorData, CodecError};

/// The attestation statement formats this authenticator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttestationFormat {
    /// No attestation, the Relying Party only learns the credential's public key.
    #[serde(rename = "none")]
    None,
}

/// The empty attestation statement of the `none` format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoneAttestationStatement {}

/// The registration result handed to the Relying Party.
///
/// Encoded as a CBOR map whose text keys appear in CTAP2 canonical order: `fmt`, `attStmt` then
/// `authData`.
///
/// <https://w3c.github.io/webauthn/#sctn-attestation>
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationObject {
    /// The attestation statement format.
    pub fmt: AttestationFormat,

    /// The attestation statement, always empty.
    #[serde(rename = "attStmt")]
    pub att_stmt: NoneAttestationStatement,

    /// The authenticator data of the registration, with attested credential data.
    #[serde(rename = "authData")]
    pub auth_data: AuthenticatorData,
}

impl AttestationObject {
    /// Wrap authenticator data in a `none` attestation.
    pub fn none(auth_data: AuthenticatorData) -> Self {
        Self {
            fmt: AttestationFormat::None,
            att_stmt: NoneAttestationStatement {},
            auth_data,
        }
    }

    /// Encode the attestation object to CBOR.
    pub fn to_vec(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        ciborium::ser::into_writer(self, &mut out)?;
        Ok(out)
    }

    /// Decode an attestation object from CBOR.
    pub fn from_slice(data: &[u8]) -> Result<Self, CodecError> {
        Ok(ciborium::de::from_reader(data)?)
    }
}
