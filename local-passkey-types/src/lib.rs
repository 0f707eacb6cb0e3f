//! # Local Passkey Types
//!
//! Wire types and byte-exact codecs for a device-bound passkey authenticator.
//!
//! The [`ctap2`] module holds the structures that travel to a Relying Party: the
//! [`AuthenticatorData`](ctap2::AuthenticatorData) block, the `none` format
//! [`AttestationObject`](ctap2::AttestationObject) and the COSE encoding of a P-256 public key.
//! The [`credential`] module holds what the authenticator persists about every credential it
//! created, and [`response`] holds what it hands back to the host once a ceremony completes.

mod utils;

pub mod credential;
pub mod ctap2;
pub mod identity;
pub mod response;

// Re-exports
pub use self::{
    credential::{CredentialId, CredentialRecord},
    identity::PlatformIdentity,
    utils::{
        big_endian,
        bytes::{Bytes, NotBase64Encoded},
        crypto, encoding, rand,
    },
};
