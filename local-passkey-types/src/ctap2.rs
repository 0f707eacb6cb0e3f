//! Authenticator side structures of the [WebAuthn Level 3] and [CTAP 2.0] specifications, limited
//! to what a platform authenticator with `none` attestation emits.
//!
//! [CTAP 2.0]: https://fidoalliance.org/specs/fido-v2.0-ps-20190130/fido-client-to-authenticator-protocol-v2.0-ps-20190130.html
//! [WebAuthn Level 3]: https://w3c.github.io/webauthn

mod aaguid;
mod attestation_object;
mod authenticator_data;
mod cose;
mod error;
mod flags;

pub use self::{
    aaguid::*, attestation_object::*, authenticator_data::*, cose::*, error::*, flags::*,
};
