//! # Local Passkey
//!
//! The `local-passkey` library is the core of a device-bound passkey authenticator: it creates
//! credentials whose private key never leaves the device, answers registration and
//! authentication requests with byte-exact [WebAuthn][webauthn-3] structures, and keeps the
//! metadata of every credential in a local store. It is comprised of two sub-libraries:
//!
//! - `local-passkey-authenticator` - a library, usable as [`authenticator`], which implements
//!   the registration and assertion flows along with credential management.
//! - `local-passkey-types` - type definitions and codecs, usable as [`types`]: authenticator
//!   data, COSE keys, `none` attestation objects and the persisted credential record.
//!
//! Delivering requests from the operating system and running the full WebAuthn ceremony
//! (challenges, origins, client data JSON) are left to the host. The host hands the
//! authenticator the SHA-256 hash of the client data and forwards what comes back.
//!
//! ## Basic Concepts
//!
//! The [`Authenticator`](authenticator::Authenticator) is generic over three collaborators:
//!
//! - a [`CredentialStore`](authenticator::CredentialStore) holding one
//!   [`CredentialRecord`](types::CredentialRecord) per credential, such as the
//!   [`FileStore`](authenticator::FileStore) shared by every process of an access group;
//! - a [`SecureKeyProvider`](authenticator::SecureKeyProvider) that generates and uses the
//!   non-exportable P-256 keys, possibly behind a biometric prompt;
//! - a [`PlatformIdentityIndex`](authenticator::PlatformIdentityIndex), the platform's mirror of
//!   the stored credentials that it uses to offer them to the user.
//!
//! Registration creates a key and a record as a pair and removes whatever it created if a later
//! step fails. Assertion persists the incremented signature counter only after the signature was
//! produced, and only if no one else moved the counter in the meantime.
//!
//! A runnable demonstration binary is provided in `local-passkey/examples/usage.rs`.
//!
//! [webauthn-3]: https://www.w3.org/TR/webauthn-3/
//!
//! ### Example: Registering and using a credential
//!
//! ```
//! use local_passkey::{
//!     authenticator::{
//!         assertion, registration, Authenticator, MemoryIdentityIndex, MemoryStore,
//!         SoftwareKeyProvider,
//!     },
//!     types::{
//!         crypto::sha256,
//!         ctap2::{Aaguid, AttestationObject, AuthenticatorData},
//!         CredentialId,
//!     },
//! };
//!
//! # tokio_test::block_on(async {
//! let mut my_authenticator = Authenticator::new(
//!     Aaguid::LOCAL_PASSKEY,
//!     MemoryStore::new(),
//!     SoftwareKeyProvider::new(),
//!     MemoryIdentityIndex::new(),
//! );
//!
//! // Note: this isn't really how you generate `client_data_hash` but it simplifies the example.
//! let client_data_hash = sha256(b"client data from the host").to_vec();
//!
//! let created = my_authenticator
//!     .register(registration::Request {
//!         relying_party_identifier: "example.com".into(),
//!         user_name: "jpasskey@example.org".into(),
//!         user_handle: b"user-1234".to_vec().into(),
//!         client_data_hash: client_data_hash.clone().into(),
//!     })
//!     .await
//!     .unwrap();
//!
//! let attestation = AttestationObject::from_slice(&created.attestation_object).unwrap();
//! assert_eq!(attestation.auth_data.counter, 0);
//!
//! let credential_id = CredentialId::try_from(created.credential_id.as_slice()).unwrap();
//! let asserted = my_authenticator
//!     .assert(assertion::Request {
//!         credential_id,
//!         relying_party_identifier: "example.com".into(),
//!         client_data_hash: client_data_hash.into(),
//!     })
//!     .await
//!     .unwrap();
//!
//! let auth_data = AuthenticatorData::from_slice(&asserted.authenticator_data).unwrap();
//! assert_eq!(auth_data.counter, 1);
//! # })
//! ```

pub use local_passkey_authenticator as authenticator;
pub use local_passkey_types as types;
