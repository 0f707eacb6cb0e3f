use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use local_passkey_types::{ctap2::CodecError, CredentialId, CredentialRecord};

use super::{items::Items, Accessibility, CredentialStore, StoredCredential};
use crate::{Error, StoreOperation};

/// A credential store persisted to disk, one CBOR file per access group.
///
/// Every process that opens the same directory and access group sees the same records, so an
/// authenticator and a management tool can run side by side. Each operation takes an advisory
/// file lock for its whole read-modify-write cycle and replaces the data file atomically, which
/// keeps [`compare_and_update`](CredentialStore::compare_and_update) atomic across processes.
///
/// Waiting for the lock and the file I/O block. With the `tokio` feature they run on the blocking
/// thread pool through `tokio::task::spawn_blocking`, so the calling task yields while another
/// process holds the access group. Without it they run on the calling thread.
#[derive(Debug)]
pub struct FileStore {
    files: Arc<Files>,
    accessibility: Accessibility,
}

impl FileStore {
    /// Open the store of `access_group` under `directory`, creating the directory if needed.
    ///
    /// The data file itself is only created by the first write.
    pub fn open(directory: impl AsRef<Path>, access_group: &str) -> Result<Self, Error> {
        if !is_valid_access_group(access_group) {
            return Err(Error::InvalidAccessGroup(access_group.to_owned()));
        }
        let directory = directory.as_ref();
        fs::create_dir_all(directory).map_err(|err| Error::storage(StoreOperation::Open, &err))?;

        Ok(Self {
            files: Arc::new(Files {
                path: directory.join(format!("{access_group}.cbor")),
                lock_path: directory.join(format!("{access_group}.lock")),
            }),
            accessibility: Accessibility::default(),
        })
    }

    /// Set the accessibility class recorded with new items.
    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    /// The data file backing this store.
    pub fn path(&self) -> &Path {
        &self.files.path
    }

    /// Run `f` against the files where blocking is allowed.
    #[cfg(any(feature = "tokio", test))]
    async fn blocking<T, F>(&self, operation: StoreOperation, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Files) -> Result<T, Error> + Send + 'static,
    {
        let files = Arc::clone(&self.files);
        tokio::task::spawn_blocking(move || f(&files))
            .await
            .map_err(|err| Error::Storage {
                operation,
                status: None,
                reason: err.to_string(),
            })?
    }

    #[cfg(not(any(feature = "tokio", test)))]
    #[allow(clippy::unused_async)]
    async fn blocking<T, F>(&self, _operation: StoreOperation, f: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Files) -> Result<T, Error> + Send + 'static,
    {
        f(&self.files)
    }
}

/// Paths of one access group.
#[derive(Debug)]
struct Files {
    path: PathBuf,
    lock_path: PathBuf,
}

impl Files {
    fn lock(&self, operation: StoreOperation) -> Result<fd_lock::RwLock<File>, Error> {
        let file = owner_only()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|err| Error::storage(operation, &err))?;
        Ok(fd_lock::RwLock::new(file))
    }

    fn read<T>(
        &self,
        operation: StoreOperation,
        f: impl FnOnce(&Items) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let lock = self.lock(operation)?;
        let _guard = lock.read().map_err(|err| Error::storage(operation, &err))?;
        f(&self.load(operation)?)
    }

    fn modify<T>(
        &self,
        operation: StoreOperation,
        f: impl FnOnce(&mut Items) -> Result<T, Error>,
    ) -> Result<T, Error> {
        let mut lock = self.lock(operation)?;
        let _guard = lock.write().map_err(|err| Error::storage(operation, &err))?;
        let mut items = self.load(operation)?;
        let output = f(&mut items)?;
        self.save(operation, &items)?;
        Ok(output)
    }

    fn load(&self, operation: StoreOperation) -> Result<Items, Error> {
        match fs::read(&self.path) {
            Ok(bytes) => ciborium::de::from_reader(bytes.as_slice()).map_err(|err| {
                Error::UnexpectedItem(format!("{}: {err}", self.path.display()))
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Items::default()),
            Err(err) => Err(Error::storage(operation, &err)),
        }
    }

    fn save(&self, operation: StoreOperation, items: &Items) -> Result<(), Error> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(items, &mut bytes).map_err(CodecError::from)?;

        let io_error = |err: io::Error| Error::storage(operation, &err);
        let staging = self.path.with_extension("cbor.tmp");
        let mut file = owner_only()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staging)
            .map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        fs::rename(&staging, &self.path).map_err(io_error)
    }
}

fn is_valid_access_group(access_group: &str) -> bool {
    !access_group.is_empty()
        && access_group != "."
        && access_group != ".."
        && !access_group.contains(['/', '\\', '\0'])
}

/// Files holding credential data are readable by their owner only.
fn owner_only() -> OpenOptions {
    #[allow(unused_mut)]
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

#[async_trait::async_trait]
impl CredentialStore for FileStore {
    async fn insert(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        let (credential_id, record) = (*credential_id, record.clone());
        let accessibility = self.accessibility;
        self.blocking(StoreOperation::Insert, move |files| {
            files.modify(StoreOperation::Insert, |items| {
                items.insert(&credential_id, &record, accessibility)
            })
        })
        .await
    }

    async fn update(
        &mut self,
        credential_id: &CredentialId,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        let (credential_id, record) = (*credential_id, record.clone());
        self.blocking(StoreOperation::Update, move |files| {
            files.modify(StoreOperation::Update, |items| {
                items.update(&credential_id, &record)
            })
        })
        .await
    }

    async fn compare_and_update(
        &mut self,
        credential_id: &CredentialId,
        expected_counter: u32,
        record: &CredentialRecord,
    ) -> Result<(), Error> {
        let (credential_id, record) = (*credential_id, record.clone());
        self.blocking(StoreOperation::Update, move |files| {
            files.modify(StoreOperation::Update, |items| {
                items.compare_and_update(&credential_id, expected_counter, &record)
            })
        })
        .await
    }

    async fn get(&self, credential_id: &CredentialId) -> Result<CredentialRecord, Error> {
        let credential_id = *credential_id;
        self.blocking(StoreOperation::Get, move |files| {
            files.read(StoreOperation::Get, |items| items.get(&credential_id))
        })
        .await
    }

    async fn delete(&mut self, credential_id: &CredentialId) -> Result<(), Error> {
        let credential_id = *credential_id;
        self.blocking(StoreOperation::Delete, move |files| {
            files.modify(StoreOperation::Delete, |items| {
                if !items.delete(&credential_id) {
                    log::debug!("no record to delete for {credential_id}");
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<StoredCredential>, Error> {
        self.blocking(StoreOperation::List, |files| {
            files.read(StoreOperation::List, Items::list)
        })
        .await
    }
}
