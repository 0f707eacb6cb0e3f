use coset::{AsCborValue, CoseKey};
use serde::{Deserialize, Serialize};

use super::{Aaguid, CodecError, Ec2PublicKey, Flags};
use crate::{big_endian, crypto::rp_id_hash};

/// rpIdHash (32 bytes) + flags (1 byte) + signCount (4 bytes)
const MIN_LEN: usize = 37;

/// The authenticator data structure encodes contextual bindings made by the authenticator: which
/// Relying Party the credential is scoped to, what the authenticator checked about the user and
/// how many times the credential has signed. Registration additionally appends the freshly created
/// credential's identifier and public key.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-data>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    /// SHA-256 hash of the RP ID the credential is scoped to.
    rp_id_hash: [u8; 32],

    /// The flags representing the information of this credential. See [Flags] for more information.
    ///
    /// [`Flags::AT`] is derived from [`Self::credential_data`] when encoding, whatever its value
    /// here.
    pub flags: Flags,

    /// Signature counter, 32-bit unsigned big-endian integer.
    pub counter: u32,

    /// Whether a newly created credential is attested by this block.
    pub credential_data: CredentialData,
}

/// The optional tail of [`AuthenticatorData`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialData {
    /// Registration output, the new credential follows the fixed header.
    WithAttestedCredential(AttestedCredentialData),
    /// Assertion output, the fixed header only.
    WithoutAttestedCredential,
}

impl AuthenticatorData {
    /// Create a new AuthenticatorData object for an RP ID and a counter.
    ///
    /// The flags will be set to their default values.
    pub fn new(rp_id: &str, counter: u32) -> Self {
        Self {
            rp_id_hash: rp_id_hash(rp_id),
            flags: Flags::default(),
            counter,
            credential_data: CredentialData::WithoutAttestedCredential,
        }
    }

    /// Add an [`AttestedCredentialData`] to the authenticator data.
    ///
    /// This sets the [`Flags::AT`] value as well.
    pub fn set_attested_credential_data(mut self, acd: AttestedCredentialData) -> Self {
        self.credential_data = CredentialData::WithAttestedCredential(acd);
        self.set_flags(Flags::AT)
    }

    /// Set additional [`Flags`] to the authenticator data.
    pub fn set_flags(mut self, flags: Flags) -> Self {
        self.flags |= flags;
        self
    }

    /// Get read access to the RP ID hash
    pub fn rp_id_hash(&self) -> &[u8; 32] {
        &self.rp_id_hash
    }

    /// The attested credential, when this block comes from a registration.
    pub fn attested_credential_data(&self) -> Option<&AttestedCredentialData> {
        match &self.credential_data {
            CredentialData::WithAttestedCredential(acd) => Some(acd),
            CredentialData::WithoutAttestedCredential => None,
        }
    }

    /// The flags byte as it is encoded, with [`Flags::AT`] matching [`Self::credential_data`].
    pub fn encoded_flags(&self) -> Flags {
        match self.credential_data {
            CredentialData::WithAttestedCredential(_) => self.flags | Flags::AT,
            CredentialData::WithoutAttestedCredential => self.flags.difference(Flags::AT),
        }
    }

    /// Encode an authenticator data to its byte representation.
    ///
    /// There is no outer length prefix, consumers read the fixed header and then the attested
    /// credential data when [`Flags::AT`] is set.
    pub fn to_vec(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(MIN_LEN);
        out.extend_from_slice(&self.rp_id_hash);
        out.push(self.encoded_flags().into());
        out.extend_from_slice(&big_endian::u32_to_bytes(self.counter));
        if let CredentialData::WithAttestedCredential(acd) = &self.credential_data {
            acd.write_to(&mut out)?;
        }
        Ok(out)
    }

    /// Decode an Authenticator data from a byte slice
    pub fn from_slice(v: &[u8]) -> Result<Self, CodecError> {
        if v.len() < MIN_LEN {
            return Err(CodecError::Truncated);
        }

        let mut input = v;
        let rp_id_hash = big_endian::take_array(&mut input)?;
        let [flag_byte] = big_endian::take_array::<1>(&mut input)?;
        let flags = Flags::try_from(flag_byte)?;
        let counter = big_endian::read_u32(&mut input)?;

        if flags.contains(Flags::ED) {
            return Err(CodecError::UnsupportedExtensions);
        }
        let credential_data = if flags.contains(Flags::AT) {
            CredentialData::WithAttestedCredential(AttestedCredentialData::read(&mut input)?)
        } else {
            CredentialData::WithoutAttestedCredential
        };
        if !input.is_empty() {
            return Err(CodecError::TrailingBytes(input.len()));
        }

        Ok(AuthenticatorData {
            rp_id_hash,
            flags,
            counter,
            credential_data,
        })
    }
}

impl Serialize for AuthenticatorData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let bytes = self
            .to_vec()
            .map_err(<S::Error as serde::ser::Error>::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for AuthenticatorData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl<'v> serde::de::Visitor<'v> for Visitor {
            type Value = AuthenticatorData;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("Authenticator Data")
            }
            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                AuthenticatorData::from_slice(v).map_err(E::custom)
            }
        }
        deserializer.deserialize_bytes(Visitor)
    }
}

/// Attested credential data is a variable-length byte array added to the authenticator data when
/// generating an attestation object for a credential
///
/// <https://w3c.github.io/webauthn/#attested-credential-data>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    /// The AAGUID of the authenticator.
    pub aaguid: Aaguid,

    /// The credential ID whose length is prepended to the byte array. This is not public as it
    /// should not be modifiable to be longer than a u16.
    credential_id: Vec<u8>,

    /// The credential public key already encoded as a COSE_Key.
    credential_public_key: Vec<u8>,
}

impl AttestedCredentialData {
    /// Create a new [AttestedCredentialData]
    ///
    /// # Error
    /// Returns an error if the length of `credential_id` cannot be represented by a u16.
    pub fn new(
        aaguid: Aaguid,
        credential_id: &[u8],
        key: &Ec2PublicKey,
    ) -> Result<Self, CodecError> {
        if u16::try_from(credential_id.len()).is_err() {
            return Err(CodecError::CredentialIdTooLong(credential_id.len()));
        }

        Ok(Self {
            aaguid,
            credential_id: credential_id.to_vec(),
            credential_public_key: key.to_cose_vec()?,
        })
    }

    /// Get read access to the credential ID,
    pub fn credential_id(&self) -> &[u8] {
        &self.credential_id
    }

    /// The COSE_Key bytes exactly as they appear in the authenticator data.
    pub fn credential_public_key(&self) -> &[u8] {
        &self.credential_public_key
    }

    /// Decode the credential public key.
    pub fn public_key(&self) -> Result<Ec2PublicKey, CodecError> {
        Ec2PublicKey::from_cose_slice(&self.credential_public_key)
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(self.aaguid.as_bytes());
        big_endian::put_length_prefixed(out, &self.credential_id)?;
        out.extend_from_slice(&self.credential_public_key);
        Ok(())
    }

    fn read(input: &mut &[u8]) -> Result<Self, CodecError> {
        let aaguid = Aaguid(big_endian::take_array(input)?);
        let credential_id = big_endian::read_length_prefixed(input)?.to_vec();

        // The COSE_Key is the last item and carries no length, so let the CBOR decoder find its
        // end and keep the exact bytes it consumed.
        let remaining = *input;
        let mut reader = remaining;
        let key: ciborium::value::Value = ciborium::de::from_reader(&mut reader)?;
        let consumed = remaining.len() - reader.len();
        let credential_public_key = big_endian::take(input, consumed)?.to_vec();
        CoseKey::from_cbor_value(key)?;

        Ok(Self {
            aaguid,
            credential_id,
            credential_public_key,
        })
    }
}
