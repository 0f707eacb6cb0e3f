use local_passkey_types::{
    crypto::rp_id_hash,
    ctap2::{Aaguid, AttestationFormat, AttestationObject, CodecError},
    CredentialId, CredentialRecord,
};

use crate::{
    authenticator::tests::{authenticator, registration_request},
    registration, Authenticator, CredentialStore, Error, MemoryIdentityIndex, MemoryStore,
    MockCredentialStore, MockPlatformIdentityIndex, MockSecureKeyProvider, SecureKeyProvider,
    SoftwareKeyProvider, StoreOperation,
};

fn storage_failure(operation: StoreOperation) -> Error {
    Error::Storage {
        operation,
        status: Some(-34018),
        reason: "item could not be written".into(),
    }
}

#[tokio::test]
async fn register_returns_none_attestation_with_attested_credential() {
    // Arrange
    let mut authenticator = authenticator();

    // Act
    let response = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap();

    // Assert
    assert_eq!(response.relying_party, "example.com");
    assert_eq!(response.client_data_hash.as_slice(), &[0x11; 32]);
    assert_eq!(response.credential_id.len(), CredentialId::LEN);

    let attestation = AttestationObject::from_slice(&response.attestation_object).unwrap();
    assert_eq!(attestation.fmt, AttestationFormat::None);
    let auth_data = attestation.auth_data;
    assert_eq!(auth_data.rp_id_hash(), &rp_id_hash("example.com"));
    assert_eq!(auth_data.counter, 0);
    assert_eq!(u8::from(auth_data.flags), 0x5d);

    let acd = auth_data.attested_credential_data().unwrap();
    assert_eq!(acd.aaguid, Aaguid::new_empty());
    assert_eq!(acd.credential_id(), response.credential_id.as_slice());

    let id = CredentialId::try_from(response.credential_id.as_slice()).unwrap();
    let provider = authenticator.key_provider();
    let handle = provider.load_key(&id).await.unwrap().unwrap();
    assert_eq!(
        acd.public_key().unwrap().to_uncompressed().to_vec(),
        provider.public_key(&handle).unwrap()
    );
}

#[tokio::test]
async fn register_persists_record_and_index_entry() {
    let mut authenticator = authenticator();

    let response = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap();
    let id = CredentialId::try_from(response.credential_id.as_slice()).unwrap();

    let record = authenticator.store().get(&id).await.unwrap();
    assert_eq!(
        record,
        CredentialRecord::new("example.com", "alice", vec![0x75; 8].into()).unwrap()
    );

    let identities = authenticator.identity_index().identities().unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].credential_id, response.credential_id);
    assert_eq!(identities[0].user_name, "alice");
}

#[tokio::test]
async fn register_accepts_empty_user_name_and_largest_user_handle() {
    let mut authenticator = authenticator();
    let request = registration::Request {
        user_name: String::new(),
        user_handle: vec![0xff; 64].into(),
        ..registration_request("")
    };

    let response = authenticator.register(request).await.unwrap();

    let id = CredentialId::try_from(response.credential_id.as_slice()).unwrap();
    let record = authenticator.store().get(&id).await.unwrap();
    assert_eq!(record.user_name, "");
    assert_eq!(record.user_handle.len(), 64);
}

#[tokio::test]
async fn register_rejects_bad_requests_before_creating_anything() {
    let mut authenticator = authenticator();

    let short_hash = registration::Request {
        client_data_hash: vec![0; 31].into(),
        ..registration_request("alice")
    };
    let err = authenticator.register(short_hash).await.unwrap_err();
    assert!(matches!(err, Error::Codec(CodecError::ClientDataHashLength(31))));

    let long_handle = registration::Request {
        user_handle: vec![0; 65].into(),
        ..registration_request("alice")
    };
    let err = authenticator.register(long_handle).await.unwrap_err();
    assert!(matches!(err, Error::Codec(CodecError::UserHandleTooLong(65))));

    assert!(authenticator.store().is_empty());
    assert!(authenticator.key_provider().is_empty());
}

#[tokio::test]
async fn cancelled_key_generation_is_reported_as_cancellation() {
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        MemoryStore::new(),
        MockSecureKeyProvider::cancelling(),
        MemoryIdentityIndex::new(),
    );

    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    assert!(err.is_user_cancelled());
    assert!(authenticator.store().is_empty());
}

#[tokio::test]
async fn failed_insert_removes_key_and_record() {
    // Arrange
    let mut store = MockCredentialStore::new();
    store
        .expect_insert()
        .returning(|_, _| Err(storage_failure(StoreOperation::Insert)))
        .once();
    store.expect_delete().returning(|_| Ok(())).once();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        store,
        SoftwareKeyProvider::new(),
        MemoryIdentityIndex::new(),
    );

    // Act
    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        Error::Storage {
            operation: StoreOperation::Insert,
            status: Some(-34018),
            ..
        }
    ));
    assert!(authenticator.key_provider().is_empty());
    assert!(authenticator.identity_index().identities().unwrap().is_empty());
}

#[tokio::test]
async fn failed_rollback_keeps_the_original_error() {
    let mut store = MockCredentialStore::new();
    store
        .expect_insert()
        .returning(|_, _| Err(storage_failure(StoreOperation::Insert)));
    store
        .expect_delete()
        .returning(|_| Err(storage_failure(StoreOperation::Delete)))
        .once();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        store,
        SoftwareKeyProvider::new(),
        MemoryIdentityIndex::new(),
    );

    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Storage {
            operation: StoreOperation::Insert,
            ..
        }
    ));
    assert!(authenticator.key_provider().is_empty());
}

#[tokio::test]
async fn duplicate_record_is_left_alone() {
    let mut store = MockCredentialStore::new();
    store
        .expect_insert()
        .returning(|id, _| Err(Error::DuplicateIdentifier(*id)));
    store.expect_delete().never();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        store,
        SoftwareKeyProvider::new(),
        MemoryIdentityIndex::new(),
    );

    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateIdentifier(_)));
    // The key was created by this registration, so it still goes.
    assert!(authenticator.key_provider().is_empty());
}

#[tokio::test]
async fn duplicate_key_is_left_alone() {
    let mut provider = MockSecureKeyProvider::new();
    provider
        .expect_generate_key()
        .returning(|id| Err(Error::DuplicateIdentifier(*id)));
    provider.expect_delete_key().never();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        MemoryStore::new(),
        provider,
        MemoryIdentityIndex::new(),
    );

    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DuplicateIdentifier(_)));
    assert!(authenticator.store().is_empty());
}

#[tokio::test]
async fn malformed_public_key_rolls_back_the_key() {
    let mut provider = MockSecureKeyProvider::new();
    provider.expect_generate_key().returning(|id| Ok(*id));
    provider
        .expect_public_key()
        .returning(|_| Ok(vec![0x02; 33]));
    provider.expect_delete_key().returning(|_| Ok(())).once();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        MemoryStore::new(),
        provider,
        MemoryIdentityIndex::new(),
    );

    let err = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Codec(CodecError::MalformedPublicKey(0x02))
    ));
    assert!(authenticator.store().is_empty());
}

#[tokio::test]
async fn identity_index_failure_does_not_undo_registration() {
    let mut index = MockPlatformIdentityIndex::new();
    index
        .expect_add()
        .returning(|_| Err(Error::IdentityIndex("index unavailable".into())))
        .once();
    let mut authenticator = Authenticator::new(
        Aaguid::new_empty(),
        MemoryStore::new(),
        SoftwareKeyProvider::new(),
        index,
    );

    let response = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap();

    let id = CredentialId::try_from(response.credential_id.as_slice()).unwrap();
    assert!(authenticator.store().get(&id).await.is_ok());
    assert!(authenticator.key_provider().contains(&id));
}

#[tokio::test]
async fn every_registration_gets_a_fresh_identifier() {
    let mut authenticator = authenticator();

    let first = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap();
    let second = authenticator
        .register(registration_request("alice"))
        .await
        .unwrap();

    assert_ne!(first.credential_id, second.credential_id);
    assert_eq!(authenticator.store().len(), 2);
    assert_eq!(authenticator.key_provider().len(), 2);
}
