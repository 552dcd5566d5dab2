//! Integration tests for the signing key and secret store sharing one password

mod common;

use ::common::secrets::{SecretId, SecretStoreError};
use ::common::signer;
use ::common::vault::VaultError;
use crate::common::{setup_signed_workspace, PASSWORD};

#[test]
fn test_wrong_passwords_never_unlock() {
    let (ctx, _dir) = setup_signed_workspace();
    let vault = ctx.vault();
    for wrong in ["wrongpw", "", "c", "correctpw ", "CORRECTPW"] {
        assert!(
            matches!(vault.unlock(wrong), Err(VaultError::Auth)),
            "unlocked with {:?}",
            wrong
        );
    }
    assert!(vault.unlock(PASSWORD).is_ok());
}

#[test]
fn test_sign_with_unlocked_key_verifies_with_stored_public() {
    let (ctx, _dir) = setup_signed_workspace();
    let vault = ctx.vault();
    let key = vault.unlock(PASSWORD).unwrap();
    let public = vault.load_public_key().unwrap().unwrap();

    let signature = signer::sign(b"Hello", &key);
    assert!(signer::verify(b"Hello", &signature, &public));
    assert!(!signer::verify(b"Hello!", &signature, &public));
}

#[test]
fn test_rotated_password_keeps_signatures_valid() {
    let (ctx, _dir) = setup_signed_workspace();
    let vault = ctx.vault();
    let signature = signer::sign(b"post", &vault.unlock(PASSWORD).unwrap());

    vault.rotate_password(PASSWORD, "newpw").unwrap();
    assert!(matches!(vault.unlock(PASSWORD), Err(VaultError::Auth)));
    let key = vault.unlock("newpw").unwrap();
    assert!(signer::verify(b"post", &signature, &key.public()));
}

#[test]
fn test_secret_store_in_workspace() {
    let (ctx, dir) = setup_signed_workspace();
    let store = ctx.secret_store();
    assert!(store.dir().starts_with(dir.path()));

    let id = SecretId::credentials("reddit").unwrap();
    let creds = serde_json::json!({ "username": "bot", "password": "hunter2" });
    store.put_json(&id, &creds, Some(PASSWORD)).unwrap();

    assert_eq!(store.get_json(&id, Some(PASSWORD)).unwrap(), creds);
    assert!(matches!(
        store.get_json(&id, Some("wrongpw")),
        Err(SecretStoreError::Auth)
    ));
}
