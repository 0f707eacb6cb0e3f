//! Results handed back to the host once a ceremony completes.
//!
//! Byte fields serialize as byte strings, hosts reading JSON may also send them as `base64url`.

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::Bytes;

/// The outcome of a successful registration.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    /// The Relying Party the credential was created for.
    pub relying_party: String,

    /// The hash of the client data the registration was requested with.
    pub client_data_hash: Bytes,

    /// The identifier of the new credential.
    #[serde(rename = "credentialID")]
    pub credential_id: Bytes,

    /// The CBOR encoded `none` attestation object.
    pub attestation_object: Bytes,
}

/// The outcome of a successful assertion.
#[typeshare]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResponse {
    /// The Relying Party's identifier of the user account that owns the credential.
    pub user_handle: Bytes,

    /// The Relying Party the assertion is for.
    pub relying_party: String,

    /// DER encoded ECDSA P-256 signature over `authenticator_data || client_data_hash`.
    pub signature: Bytes,

    /// The hash of the client data that was signed.
    pub client_data_hash: Bytes,

    /// The authenticator data that was signed, without attested credential data.
    pub authenticator_data: Bytes,

    /// The credential that signed.
    #[serde(rename = "credentialID")]
    pub credential_id: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_json_uses_base64url_strings() {
        let json = r#"{
            "relyingParty": "example.com",
            "clientDataHash": "AAECAw",
            "credentialID": "qqqqqqqqqqqqqqqqqqqqqg",
            "attestationObject": [163, 99, 102, 109, 116]
        }"#;

        let response: RegistrationResponse =
            serde_json::from_str(json).expect("could not deserialize response");

        assert_eq!(response.relying_party, "example.com");
        assert_eq!(response.client_data_hash.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(response.credential_id.as_slice(), &[0xaa; 16]);
        assert_eq!(response.attestation_object.as_slice(), &[0xa3, 0x63, b'f', b'm', b't']);
    }
}
