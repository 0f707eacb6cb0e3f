use std::fmt;

use local_passkey_types::{ctap2::CodecError, CredentialId};

/// The store primitive that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Adding a new record.
    Insert,
    /// Replacing an existing record.
    Update,
    /// Reading one record.
    Get,
    /// Removing a record.
    Delete,
    /// Enumerating every record.
    List,
    /// Opening the backing storage.
    Open,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOperation::Insert => "insert",
            StoreOperation::Update => "update",
            StoreOperation::Get => "get",
            StoreOperation::Delete => "delete",
            StoreOperation::List => "list",
            StoreOperation::Open => "open",
        })
    }
}

/// Broad classes of [`Error`], for hosts that map failures to their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bytes that could not be encoded or decoded.
    Format,
    /// The credential store or platform index failed, or the record is missing.
    Storage,
    /// The user declined or failed the platform's authentication prompt.
    Authorization,
    /// The stored state contradicts itself, for example a record without its key.
    Consistency,
    /// The key provider failed for a reason other than authorization.
    KeyProvider,
}

/// Errors returned by the authenticator, its stores and its key providers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A stored item does not look like a credential record entry.
    #[error("unexpected item in credential store: {0}")]
    UnexpectedItem(String),

    /// A stored record could not be decoded.
    #[error("credential record {credential_id} could not be decoded: {reason}")]
    UndecodableRecord {
        /// The credential whose record is damaged.
        credential_id: CredentialId,
        /// What the decoder reported.
        reason: String,
    },

    /// The access group does not name a valid storage namespace.
    #[error("invalid access group {0:?}")]
    InvalidAccessGroup(String),

    /// The backing storage failed.
    #[error("credential store {operation} failed: {reason}")]
    Storage {
        /// The primitive that failed.
        operation: StoreOperation,
        /// The platform status code, when one was reported.
        status: Option<i32>,
        /// A description of the failure.
        reason: String,
    },

    /// No record exists for the credential.
    #[error("no credential record for {0}")]
    RecordNotFound(CredentialId),

    /// A record or key already exists for the credential.
    #[error("credential {0} already exists")]
    DuplicateIdentifier(CredentialId),

    /// The platform identity index rejected an update.
    #[error("platform identity index update failed: {0}")]
    IdentityIndex(String),

    /// The user dismissed the platform's authentication prompt.
    #[error("the user cancelled the operation")]
    UserCancelled,

    /// The platform could not authenticate the user.
    #[error("user authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A record exists but its signing key does not.
    #[error("no signing key for credential {0}")]
    KeyNotFound(CredentialId),

    /// The stored counter moved between reading the record and writing it back.
    #[error("signature counter of {credential_id} is {actual}, expected {expected}")]
    CounterMismatch {
        /// The credential being updated.
        credential_id: CredentialId,
        /// The counter the update was based on.
        expected: u32,
        /// The counter found in the store.
        actual: u32,
    },

    /// The signature counter cannot be incremented any further.
    #[error("signature counter of {0} is exhausted")]
    CounterExhausted(CredentialId),

    /// The credential belongs to another Relying Party than the one asking.
    #[error("credential is scoped to {stored}, not {requested}")]
    RelyingPartyMismatch {
        /// The Relying Party in the stored record.
        stored: String,
        /// The Relying Party in the request.
        requested: String,
    },

    /// The key provider failed.
    #[error("key provider failure: {0}")]
    KeyProvider(String),
}

impl Error {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Codec(_)
            | Error::UnexpectedItem(_)
            | Error::UndecodableRecord { .. }
            | Error::InvalidAccessGroup(_) => ErrorKind::Format,
            Error::Storage { .. }
            | Error::RecordNotFound(_)
            | Error::DuplicateIdentifier(_)
            | Error::IdentityIndex(_) => ErrorKind::Storage,
            Error::UserCancelled | Error::AuthenticationFailed(_) => ErrorKind::Authorization,
            Error::KeyNotFound(_)
            | Error::CounterMismatch { .. }
            | Error::CounterExhausted(_)
            | Error::RelyingPartyMismatch { .. } => ErrorKind::Consistency,
            Error::KeyProvider(_) => ErrorKind::KeyProvider,
        }
    }

    /// Whether the user dismissed a prompt, which hosts report as a cancellation rather than a
    /// failure.
    pub fn is_user_cancelled(&self) -> bool {
        matches!(self, Error::UserCancelled)
    }

    pub(crate) fn storage(operation: StoreOperation, err: &std::io::Error) -> Self {
        Error::Storage {
            operation,
            status: err.raw_os_error(),
            reason: err.to_string(),
        }
    }
}
