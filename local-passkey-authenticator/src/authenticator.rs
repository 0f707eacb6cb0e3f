use local_passkey_types::ctap2::{Aaguid, Flags};

use crate::{CredentialStore, PlatformIdentityIndex, SecureKeyProvider};

pub mod assertion;
mod management;
pub mod registration;

pub use self::management::SortKey;

/// When the authenticator reports its credentials as backed up.
///
/// The credentials of this authenticator are device bound, so the canonical answer is
/// [`BackupFlags::Never`]. Some hosts refuse to surface credentials that do not claim backup
/// eligibility, which is what the other settings accommodate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackupFlags {
    /// Leave [`Flags::BE`] and [`Flags::BS`] cleared.
    Never,
    /// Set both on registration output only.
    RegistrationOnly,
    /// Set both on registration and assertion output.
    #[default]
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ceremony {
    Registration,
    Assertion,
}

impl BackupFlags {
    fn applies_to(self, ceremony: Ceremony) -> bool {
        match self {
            BackupFlags::Never => false,
            BackupFlags::RegistrationOnly => ceremony == Ceremony::Registration,
            BackupFlags::Always => true,
        }
    }
}

/// A device-bound passkey authenticator with all the necessary state and information.
///
/// Storage of the credential metadata, custody of the signing keys and the platform's identity
/// index are pluggable, everything between them (encodings, counters and rollback) is handled
/// here.
pub struct Authenticator<S, K, I> {
    /// The authenticator's AAGUID
    aaguid: Aaguid,
    /// Provides credential storage capabilities
    store: S,
    /// Holds the signing keys
    key_provider: K,
    /// Mirror of the stored credentials kept by the platform
    identity_index: I,
    /// Value to control the backup bits of the authenticator data.
    backup_flags: BackupFlags,
}

impl<S, K, I> Authenticator<S, K, I>
where
    S: CredentialStore,
    K: SecureKeyProvider,
    I: PlatformIdentityIndex,
{
    /// Create an authenticator with a known aaguid, a backing storage, a key provider and the
    /// platform's identity index.
    pub fn new(aaguid: Aaguid, store: S, key_provider: K, identity_index: I) -> Self {
        Self {
            aaguid,
            store,
            key_provider,
            identity_index,
            backup_flags: BackupFlags::default(),
        }
    }

    /// Set when the authenticator reports its credentials as backed up.
    pub fn set_backup_flags(&mut self, backup_flags: BackupFlags) {
        self.backup_flags = backup_flags;
    }

    /// Get when the authenticator reports its credentials as backed up.
    pub fn backup_flags(&self) -> BackupFlags {
        self.backup_flags
    }

    /// Access the [`CredentialStore`] to look into what is stored.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Exclusively access the [`CredentialStore`] to look into what is stored and modify it if needed.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Access the [`SecureKeyProvider`].
    pub fn key_provider(&self) -> &K {
        &self.key_provider
    }

    /// Access the [`PlatformIdentityIndex`].
    pub fn identity_index(&self) -> &I {
        &self.identity_index
    }

    /// Access the authenticator's [`Aaguid`]
    pub fn aaguid(&self) -> &Aaguid {
        &self.aaguid
    }

    fn flags(&self, ceremony: Ceremony) -> Flags {
        if self.backup_flags.applies_to(ceremony) {
            Flags::default() | Flags::backup()
        } else {
            Flags::default()
        }
    }
}
