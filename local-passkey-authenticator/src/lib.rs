//! # Local Passkey Authenticator
//!
//! This crate defines an [`Authenticator`] type for device-bound passkeys: credentials whose
//! private key never leaves the device and whose metadata lives in a local store. Storage,
//! key custody and the platform's identity index are defined through traits, so only the parts
//! that vary between platforms need to be provided while the encodings, the signature counter
//! handling and the rollback on partial failure stay the same everywhere.
//!
//! * [`CredentialStore`] persists one [`CredentialRecord`] per [`CredentialId`].
//!   [`MemoryStore`] and [`FileStore`] are provided.
//! * [`SecureKeyProvider`] generates and uses the non-exportable P-256 keys.
//!   [`SoftwareKeyProvider`] keeps them in memory.
//! * [`PlatformIdentityIndex`] mirrors the stored credentials for the platform's credential
//!   picker. [`MemoryIdentityIndex`] is provided.
//!
//! ## Features
//!
//! * `tokio`: implements [`CredentialStore`] for `Arc<tokio::sync::Mutex<S>>` so one store can
//!   be shared between an authenticator and a management surface.
//! * `testable`: exports the `mockall` mocks of the three traits.
//!
//! [`CredentialRecord`]: local_passkey_types::CredentialRecord
//! [`CredentialId`]: local_passkey_types::CredentialId

mod authenticator;
mod credential_store;
mod error;
mod identity_index;
mod key_provider;

pub use self::{
    authenticator::{assertion, registration, Authenticator, BackupFlags, SortKey},
    credential_store::{Accessibility, CredentialStore, FileStore, MemoryStore, StoredCredential},
    error::{Error, ErrorKind, StoreOperation},
    identity_index::{MemoryIdentityIndex, PlatformIdentityIndex},
    key_provider::{SecureKeyProvider, SoftwareKeyHandle, SoftwareKeyProvider},
};

#[cfg(any(test, feature = "testable"))]
pub use self::{
    credential_store::MockCredentialStore, identity_index::MockPlatformIdentityIndex,
    key_provider::MockSecureKeyProvider,
};
