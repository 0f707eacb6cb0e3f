/// Errors raised while encoding or decoding the binary structures of this crate.
///
/// Every variant describes a malformed input. None of them are recoverable by retrying the same
/// operation with the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A public key point did not start with the uncompressed SEC1 tag `0x04`.
    ///
    /// Carries the prefix byte that was found, or `0` for an empty input.
    #[error("unexpected public key format, prefix {0:#04x}")]
    MalformedPublicKey(u8),

    /// An uncompressed public key point had the right tag but the wrong length.
    #[error("public key point must be {expected} bytes, got {actual}")]
    PublicKeyLength {
        /// Length of an uncompressed P-256 point.
        expected: usize,
        /// Length that was given.
        actual: usize,
    },

    /// A COSE key was structurally valid CBOR but not an ES256 P-256 public key.
    #[error("unsupported COSE key: {0}")]
    UnsupportedCoseKey(&'static str),

    /// A credential identifier did not have the 16 bytes this authenticator issues.
    #[error("credential identifier must be 16 bytes, got {0}")]
    CredentialIdLength(usize),

    /// A credential identifier is too long for its `u16` length prefix.
    #[error("credential identifier of {0} bytes does not fit a u16 length prefix")]
    CredentialIdTooLong(usize),

    /// The user handle exceeds the 64 bytes allowed by WebAuthn.
    #[error("user handle must be at most 64 bytes, got {0}")]
    UserHandleTooLong(usize),

    /// The client data hash is not a SHA-256 digest.
    #[error("client data hash must be 32 bytes, got {0}")]
    ClientDataHashLength(usize),

    /// The input ended before the structure was complete.
    #[error("input truncated")]
    Truncated,

    /// The flags byte has reserved bits set.
    #[error("reserved authenticator data flag bits are set: {0:#010b}")]
    UnknownFlags(u8),

    /// Authenticator extension outputs are present, which this authenticator never produces.
    #[error("authenticator extension data is not supported")]
    UnsupportedExtensions,

    /// Bytes remained after a complete structure was decoded.
    #[error("{0} unexpected trailing bytes")]
    TrailingBytes(usize),

    /// A value was not valid base64.
    #[error("value is not base64 encoded")]
    NotBase64,

    /// CBOR serialization or deserialization failed.
    #[error("CBOR: {0}")]
    Cbor(String),
}

impl From<coset::CoseError> for CodecError {
    fn from(err: coset::CoseError) -> Self {
        CodecError::Cbor(err.to_string())
    }
}

impl<T: std::fmt::Debug> From<ciborium::de::Error<T>> for CodecError {
    fn from(err: ciborium::de::Error<T>) -> Self {
        CodecError::Cbor(err.to_string())
    }
}

impl<T: std::fmt::Debug> From<ciborium::ser::Error<T>> for CodecError {
    fn from(err: ciborium::ser::Error<T>) -> Self {
        CodecError::Cbor(err.to_string())
    }
}
