//! Sample App for device-bound passkeys
use std::sync::Arc;

use local_passkey::{
    authenticator::{
        assertion, registration, Authenticator, Error, FileStore, MemoryIdentityIndex,
        SoftwareKeyProvider, SortKey, StoreOperation,
    },
    types::{
        crypto::sha256,
        ctap2::{Aaguid, AttestationObject},
        encoding, CredentialId,
        response::{AssertionResponse, RegistrationResponse},
    },
};

type DemoAuthenticator =
    Authenticator<FileStore, Arc<SoftwareKeyProvider>, Arc<MemoryIdentityIndex>>;

// Example of how to register a credential and then sign with it.
async fn authenticator_setup(
    authenticator: &mut DemoAuthenticator,
    rp_id: &str,
    client_data_json: &str,
) -> Result<(RegistrationResponse, AssertionResponse), Error> {
    // The host hashes the client data, the authenticator only ever sees the hash.
    let client_data_hash = sha256(client_data_json.as_bytes()).to_vec();

    let reg_request = registration::Request {
        relying_party_identifier: rp_id.into(),
        user_name: "jpasskey@example.org".into(),
        user_handle: b"johnny-passkey".to_vec().into(),
        client_data_hash: client_data_hash.clone().into(),
    };
    let created = authenticator.register(reg_request).await?;
    creation_success(&created)?;

    let credential_id = CredentialId::try_from(created.credential_id.as_slice())?;
    let auth_request = assertion::Request {
        credential_id,
        relying_party_identifier: rp_id.into(),
        client_data_hash: client_data_hash.into(),
    };
    let asserted = authenticator.assert(auth_request).await?;

    Ok((created, asserted))
}

fn creation_success(credential: &RegistrationResponse) -> Result<(), Error> {
    let attestation = AttestationObject::from_slice(&credential.attestation_object)?;
    println!(
        "Credential {} created for {}:\n\n{:?}\n\n",
        encoding::base64url(&credential.credential_id),
        credential.relying_party,
        attestation
    );
    Ok(())
}

fn auth_success(credential: &AssertionResponse) {
    println!(
        "Credential {} signed:\n\nauthenticator data {}\nsignature {}\n\n",
        encoding::base64url(&credential.credential_id),
        encoding::base64url(&credential.authenticator_data),
        encoding::base64url(&credential.signature),
    );
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let directory = tempfile::tempdir().map_err(|err| Error::Storage {
        operation: StoreOperation::Open,
        status: err.raw_os_error(),
        reason: err.to_string(),
    })?;
    let store = FileStore::open(directory.path(), "com.example.passkeys")?;
    let index = Arc::new(MemoryIdentityIndex::new());
    let mut authenticator = Authenticator::new(
        Aaguid::LOCAL_PASSKEY,
        store,
        Arc::new(SoftwareKeyProvider::new()),
        index.clone(),
    );

    match authenticator_setup(
        &mut authenticator,
        "example.com",
        r#"{"type":"webauthn.create","challenge":"c2FtcGxl","origin":"https://example.com"}"#,
    )
    .await
    {
        Ok((_, asserted)) => auth_success(&asserted),
        Err(err) if err.is_user_cancelled() => println!("The user cancelled."),
        Err(err) => println!("Error ({:?}): {err}", err.kind()),
    }

    for credential in authenticator.list_credentials(SortKey::CreationTime).await? {
        println!(
            "{} {} counter {} created {}",
            credential.record.relying_party_identifier,
            credential.record.user_name,
            credential.record.signature_counter,
            credential.created_at
        );
        authenticator
            .delete_credential(&credential.credential_id)
            .await?;
    }
    println!("Identity index entries left: {}", index.identities()?.len());

    Ok(())
}
