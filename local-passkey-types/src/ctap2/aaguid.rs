use std::fmt;

use serde::{Deserialize, Serialize};

/// An Authenticator Attestation GUID is a 128-bit identifier.
///
/// It tells a Relying Party which kind of authenticator produced a credential. With `none`
/// attestation nothing vouches for it, so it is informational only. A Relying Party that wants to
/// show the user where a passkey lives can look it up in a passkey provider registry.
///
/// <https://w3c.github.io/webauthn/#sctn-authenticator-model>
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Aaguid(pub [u8; Self::LEN]);

impl Aaguid {
    const LEN: usize = 16;

    /// The AAGUID this authenticator reports, `ec78fae8-b2e0-5697-8e94-7c7728c39500`.
    pub const LOCAL_PASSKEY: Aaguid = Aaguid([
        0xec, 0x78, 0xfa, 0xe8, 0xb2, 0xe0, 0x56, 0x97, 0x8e, 0x94, 0x7c, 0x77, 0x28, 0xc3, 0x95,
        0x00,
    ]);

    /// Generate empty AAGUID
    pub const fn new_empty() -> Self {
        Self([0; 16])
    }

    /// Byte view of the identifier.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Default for Aaguid {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl From<[u8; 16]> for Aaguid {
    fn from(inner: [u8; 16]) -> Self {
        Aaguid(inner)
    }
}

/// Formats the identifier in the hyphenated UUID form.
impl fmt::Display for Aaguid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if matches!(i, 4 | 6 | 8 | 10) {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl Serialize for Aaguid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for Aaguid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AaguidVisitor;
        impl<'de> serde::de::Visitor<'de> for AaguidVisitor {
            type Value = Aaguid;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "A byte string of {} bytes long", Aaguid::LEN)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.try_into()
                    .map(Aaguid)
                    .map_err(|_| E::invalid_length(v.len(), &self))
            }
        }
        deserializer.deserialize_bytes(AaguidVisitor)
    }
}
