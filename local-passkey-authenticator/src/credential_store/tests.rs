use std::{
    fs::OpenOptions,
    sync::{mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use local_passkey_types::{CredentialId, CredentialRecord};

use super::{items::Items, Accessibility, FileStore, MemoryStore, StoredCredential};
use crate::{CredentialStore, Error, ErrorKind};

fn record(rp_id: &str, user_name: &str) -> CredentialRecord {
    CredentialRecord::new(rp_id, user_name, vec![1, 2, 3].into()).unwrap()
}

fn id(byte: u8) -> CredentialId {
    CredentialId::from([byte; 16])
}

async fn exercise_store<S: CredentialStore + Send + Sync>(store: &mut S) {
    let first = record("example.com", "alice");
    store.insert(&id(1), &first).await.unwrap();

    assert_eq!(store.get(&id(1)).await.unwrap(), first);

    let err = store.insert(&id(1), &first).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateIdentifier(dup) if dup == id(1)));

    let bumped = CredentialRecord {
        signature_counter: 1,
        ..first.clone()
    };
    store.update(&id(1), &bumped).await.unwrap();
    assert_eq!(store.get(&id(1)).await.unwrap().signature_counter, 1);

    let err = store.get(&id(2)).await.unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(missing) if missing == id(2)));
    let err = store.update(&id(2), &first).await.unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(_)));

    store.delete(&id(1)).await.unwrap();
    store.delete(&id(1)).await.unwrap();
    assert!(matches!(
        store.get(&id(1)).await.unwrap_err(),
        Error::RecordNotFound(_)
    ));
    assert!(store.list_all().await.unwrap().is_empty());
}

async fn exercise_compare_and_update<S: CredentialStore + Send + Sync>(store: &mut S) {
    let stored = CredentialRecord {
        signature_counter: 5,
        ..record("example.com", "alice")
    };
    store.insert(&id(3), &stored).await.unwrap();

    let next = CredentialRecord {
        signature_counter: 6,
        ..stored.clone()
    };
    let err = store
        .compare_and_update(&id(3), 4, &next)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CounterMismatch {
            expected: 4,
            actual: 5,
            ..
        }
    ));
    assert_eq!(store.get(&id(3)).await.unwrap().signature_counter, 5);

    store.compare_and_update(&id(3), 5, &next).await.unwrap();
    assert_eq!(store.get(&id(3)).await.unwrap().signature_counter, 6);

    let err = store
        .compare_and_update(&id(4), 0, &next)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(_)));
}

#[tokio::test]
async fn memory_store_primitives() {
    let mut store = MemoryStore::new();
    exercise_store(&mut store).await;
    assert!(store.is_empty());
}

#[tokio::test]
async fn memory_store_compare_and_update() {
    exercise_compare_and_update(&mut MemoryStore::new()).await;
}

#[tokio::test]
async fn file_store_primitives() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path(), "com.example.passkeys").unwrap();
    exercise_store(&mut store).await;
}

#[tokio::test]
async fn file_store_compare_and_update() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path(), "com.example.passkeys").unwrap();
    exercise_compare_and_update(&mut store).await;
}

#[tokio::test]
async fn shared_store_behaves_like_the_inner_one() {
    let mut store = Arc::new(tokio::sync::Mutex::new(MemoryStore::new()));
    let other_handle = store.clone();

    exercise_compare_and_update(&mut store).await;
    assert_eq!(other_handle.lock().await.len(), 1);
}

#[tokio::test]
async fn list_returns_every_record_with_its_creation_time() {
    let before = chrono::Utc::now();
    let mut store = MemoryStore::new();
    store
        .insert(&id(1), &record("example.com", "alice"))
        .await
        .unwrap();
    store
        .insert(&id(2), &record("example.org", "bob"))
        .await
        .unwrap();

    let mut listed = store.list_all().await.unwrap();
    listed.sort_by_key(|stored| stored.credential_id);

    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].credential_id, id(1));
    assert_eq!(listed[0].record.user_name, "alice");
    assert_eq!(listed[1].credential_id, id(2));
    assert_eq!(listed[1].record.relying_party_identifier, "example.org");
    assert!(listed.iter().all(|stored| stored.created_at >= before));
}

#[tokio::test]
async fn updates_keep_the_creation_time() {
    let mut store = MemoryStore::new();
    let original = record("example.com", "alice");
    store.insert(&id(1), &original).await.unwrap();
    let created_at = store.list_all().await.unwrap()[0].created_at;

    let renamed = CredentialRecord {
        user_name: "alice@example.com".into(),
        ..original
    };
    store.update(&id(1), &renamed).await.unwrap();

    let listed = store.list_all().await.unwrap();
    assert_eq!(listed[0].created_at, created_at);
    assert_eq!(listed[0].record, renamed);
}

#[tokio::test]
async fn undecodable_record_fails_the_read_and_the_listing() {
    let mut store = MemoryStore::new();
    store
        .insert(&id(1), &record("example.com", "alice"))
        .await
        .unwrap();
    store.insert_raw(&id(2).to_base64(), vec![0xff, 0x00]);

    let err = store.get(&id(2)).await.unwrap_err();
    assert!(matches!(err, Error::UndecodableRecord { credential_id, .. } if credential_id == id(2)));
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, Error::UndecodableRecord { .. }));

    // The healthy record is still readable on its own.
    assert_eq!(store.get(&id(1)).await.unwrap().user_name, "alice");
}

#[tokio::test]
async fn foreign_key_fails_the_listing() {
    let mut store = MemoryStore::new();
    let data = record("example.com", "alice").to_cbor().unwrap();
    store.insert_raw("not a credential", data);

    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedItem(_)));
}

#[tokio::test]
async fn non_canonical_key_fails_the_listing() {
    let mut store = MemoryStore::new();
    let data = record("example.com", "alice").to_cbor().unwrap();
    // Decodes to id(0xaa) but lacks the padding of its canonical form.
    store.insert_raw("qqqqqqqqqqqqqqqqqqqqqg", data);

    let err = store.list_all().await.unwrap_err();
    assert!(matches!(err, Error::UnexpectedItem(_)));
    assert!(matches!(
        store.get(&id(0xaa)).await.unwrap_err(),
        Error::RecordNotFound(_)
    ));
}

#[tokio::test]
async fn file_store_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let stored = record("example.com", "alice");
    {
        let mut store = FileStore::open(dir.path(), "group").unwrap();
        store.insert(&id(9), &stored).await.unwrap();
    }

    let reopened = FileStore::open(dir.path(), "group").unwrap();
    assert_eq!(reopened.get(&id(9)).await.unwrap(), stored);
    let listed: Vec<StoredCredential> = reopened.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].credential_id, id(9));
}

#[tokio::test]
async fn access_groups_are_separate_namespaces() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = FileStore::open(dir.path(), "first").unwrap();
    let second = FileStore::open(dir.path(), "second").unwrap();

    first
        .insert(&id(1), &record("example.com", "alice"))
        .await
        .unwrap();

    assert!(matches!(
        second.get(&id(1)).await.unwrap_err(),
        Error::RecordNotFound(_)
    ));
    assert!(second.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_file_reads_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("nested"), "group").unwrap();

    assert!(!store.path().exists());
    assert!(store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn corrupt_file_is_an_unexpected_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), "group").unwrap();
    std::fs::write(store.path(), b"definitely not cbor").unwrap();

    assert!(matches!(
        store.list_all().await.unwrap_err(),
        Error::UnexpectedItem(_)
    ));
}

#[tokio::test]
async fn file_store_reports_damaged_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), "group").unwrap();

    let mut items = Items::default();
    items.insert_raw(&id(5).to_base64(), vec![0x18]);
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&items, &mut bytes).unwrap();
    std::fs::write(store.path(), bytes).unwrap();

    assert!(matches!(
        store.get(&id(5)).await.unwrap_err(),
        Error::UndecodableRecord { .. }
    ));
}

#[cfg(unix)]
#[tokio::test]
async fn file_store_data_is_private_to_its_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path(), "group").unwrap();
    store
        .insert(&id(1), &record("example.com", "alice"))
        .await
        .unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn accessibility_is_recorded_with_each_item() {
    let mut store = MemoryStore::new();
    store.insert(&id(1), &record("example.com", "alice")).await.unwrap();
    assert_eq!(
        store.accessibility(&id(1)),
        Some(Accessibility::WhenUnlockedThisDeviceOnly)
    );

    let mut store =
        MemoryStore::new().with_accessibility(Accessibility::AfterFirstUnlockThisDeviceOnly);
    store.insert(&id(2), &record("example.com", "bob")).await.unwrap();
    assert_eq!(
        store.accessibility(&id(2)),
        Some(Accessibility::AfterFirstUnlockThisDeviceOnly)
    );
}

#[tokio::test]
async fn file_store_persists_the_accessibility_class() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FileStore::open(dir.path(), "group")
        .unwrap()
        .with_accessibility(Accessibility::AfterFirstUnlockThisDeviceOnly);
    let stored = record("example.com", "alice");
    store.insert(&id(1), &stored).await.unwrap();
    let bumped = CredentialRecord {
        signature_counter: 1,
        ..stored
    };
    store.update(&id(1), &bumped).await.unwrap();

    let bytes = std::fs::read(store.path()).unwrap();
    let items: Items = ciborium::de::from_reader(bytes.as_slice()).unwrap();
    assert_eq!(
        items.accessibility(&id(1)),
        Some(Accessibility::AfterFirstUnlockThisDeviceOnly)
    );
}

#[tokio::test]
async fn file_store_waits_for_the_lock_without_stalling_other_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path(), "group").unwrap();

    // Another holder of the access group, as a second process would be.
    let lock_path = dir.path().join("group.lock");
    let (locked_tx, locked_rx) = mpsc::channel();
    let holder = thread::spawn(move || {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .unwrap();
        let mut lock = fd_lock::RwLock::new(file);
        let _guard = lock.write().unwrap();
        locked_tx.send(()).unwrap();
        thread::sleep(Duration::from_millis(500));
    });
    locked_rx.recv().unwrap();

    let started = Instant::now();
    let timer = async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        started.elapsed()
    };
    let (listed, timer_fired_after) = tokio::join!(store.list_all(), timer);

    assert!(listed.unwrap().is_empty());
    assert!(timer_fired_after < Duration::from_millis(400));
    assert!(started.elapsed() >= Duration::from_millis(400));
    holder.join().unwrap();
}

#[test]
fn invalid_access_groups_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for group in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
        let err = FileStore::open(dir.path(), group).unwrap_err();
        assert!(matches!(err, Error::InvalidAccessGroup(_)), "{group:?}");
    }
}

#[test]
fn search_matches_relying_party_or_user_name() {
    let stored = StoredCredential {
        credential_id: id(1),
        record: record("Login.Example.com", "Alice"),
        created_at: chrono::Utc::now(),
    };

    assert!(stored.matches(""));
    assert!(stored.matches("example"));
    assert!(stored.matches("ALICE"));
    assert!(!stored.matches("bob"));
}
