use std::sync::{Arc, Mutex, MutexGuard};

use local_passkey_types::PlatformIdentity;

use crate::Error;

/// The platform's index of credential identities, used to offer credentials to the user before
/// the authenticator itself is involved.
///
/// The index only mirrors the credential store. It may lag behind and is brought back in line
/// whenever the full set of credentials is known. There is deliberately no way to remove a single
/// entry, removals go through [`replace_all`](Self::replace_all).
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait PlatformIdentityIndex {
    /// Replace the whole index with `identities`.
    async fn replace_all(&self, identities: Vec<PlatformIdentity>) -> Result<(), Error>;

    /// Add one identity to the index.
    async fn add(&self, identity: PlatformIdentity) -> Result<(), Error>;
}

#[async_trait::async_trait]
impl<I: PlatformIdentityIndex + Send + Sync> PlatformIdentityIndex for Arc<I> {
    async fn replace_all(&self, identities: Vec<PlatformIdentity>) -> Result<(), Error> {
        I::replace_all(self, identities).await
    }

    async fn add(&self, identity: PlatformIdentity) -> Result<(), Error> {
        I::add(self, identity).await
    }
}

/// A [`PlatformIdentityIndex`] held in memory, for hosts without a platform index and for tests.
#[derive(Debug, Default)]
pub struct MemoryIdentityIndex {
    identities: Mutex<Vec<PlatformIdentity>>,
}

impl MemoryIdentityIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the current entries, in insertion order.
    pub fn identities(&self) -> Result<Vec<PlatformIdentity>, Error> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<PlatformIdentity>>, Error> {
        self.identities
            .lock()
            .map_err(|_| Error::IdentityIndex("identity list is poisoned".into()))
    }
}

#[async_trait::async_trait]
impl PlatformIdentityIndex for MemoryIdentityIndex {
    async fn replace_all(&self, identities: Vec<PlatformIdentity>) -> Result<(), Error> {
        *self.lock()? = identities;
        Ok(())
    }

    async fn add(&self, identity: PlatformIdentity) -> Result<(), Error> {
        let mut identities = self.lock()?;
        // Re-adding a credential refreshes its entry.
        identities.retain(|existing| existing.credential_id != identity.credential_id);
        identities.push(identity);
        Ok(())
    }
}
