//! End-to-end tests for vault credential flows: issue, reset, view,
//! and the audit trail each of them leaves behind.

use sea_orm::{DbErr, SqlErr};

use callvault::build_vault_service;
use callvault::config::Config;
use callvault::crypto::{MasterKey, SecretCodec};
use callvault::db::Store;
use callvault::services::{
    AuditRecorder, CredentialRequest, SeaOrmVaultService, VaultError, VaultService,
};

fn test_config() -> Config {
    let db_path = std::env::temp_dir().join(format!("callvault-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.vault.master_key = MasterKey::generate().to_hex();
    // Keep hashing cheap so tests stay fast.
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_vault(config: &Config) -> (Store, SeaOrmVaultService) {
    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");
    let service = build_vault_service(config, store.clone()).expect("failed to build vault service");
    (store, service)
}

fn request(user_id: i32, password: Option<&str>, issued_by: i32) -> CredentialRequest {
    CredentialRequest {
        user_id,
        password: password.map(str::to_string),
        issued_by,
        origin: "10.0.0.1".to_string(),
    }
}

#[tokio::test]
async fn create_generates_password_when_none_supplied() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    let issued = service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    assert_eq!(issued.user_id, agent.id);
    assert_eq!(issued.password.chars().count(), 12);

    // The stored record decrypts back to the password the caller received.
    let codec = SecretCodec::new(&config.master_key().unwrap());
    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    assert_eq!(codec.decrypt(&entry.encrypted_password).unwrap(), issued.password);

    // Exactly one audit row, describing the create.
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "create");
    assert_eq!(history[0].accessed_by, admin.id);
    assert_eq!(history[0].origin, "10.0.0.1");
}

#[tokio::test]
async fn create_uses_supplied_password() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    let issued = service
        .create_credential(request(agent.id, Some("CustomPass1!"), admin.id))
        .await
        .unwrap();

    assert_eq!(issued.password, "CustomPass1!");

    // Supplied plaintext becomes the agent's login password.
    let stored = store.get_user(agent.id).await.unwrap().unwrap();
    let digest = stored.password_hash.expect("login hash should be set");
    assert!(digest.starts_with("$argon2id$"));

    // Debug output never carries the plaintext.
    let debugged = format!("{issued:?}");
    assert!(!debugged.contains("CustomPass1!"));
    assert!(debugged.contains("<redacted>"));
}

#[tokio::test]
async fn create_rejects_second_credential_for_same_user() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    let err = service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::CredentialExists));

    // The refused attempt added no audit row.
    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn concurrent_creates_for_one_user_yield_a_single_credential() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    // Both calls pass the existence check before either inserts; the unique
    // index decides the race and the loser sees a conflict, not a storage
    // error.
    let (first, second) = tokio::join!(
        service.create_credential(request(agent.id, None, admin.id)),
        service.create_credential(request(agent.id, None, admin.id)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);

    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert!(matches!(
        loser.as_ref().unwrap_err(),
        VaultError::CredentialExists
    ));

    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn duplicate_entry_insert_reports_unique_violation() {
    let config = test_config();
    let (store, _service) = spawn_vault(&config).await;

    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    store
        .insert_vault_entry(agent.id, "aa:bb", agent.id)
        .await
        .unwrap();
    let err = store
        .insert_vault_entry(agent.id, "cc:dd", agent.id)
        .await
        .unwrap_err();

    let db_err = err.downcast_ref::<DbErr>().unwrap();
    assert!(matches!(
        db_err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn create_rejects_unknown_user() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();

    let err = service
        .create_credential(request(9999, None, admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::UserNotFound));
}

#[tokio::test]
async fn create_rejects_empty_password() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    let err = service
        .create_credential(request(agent.id, Some(""), admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::Validation(_)));
}

#[tokio::test]
async fn reset_replaces_stored_record() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    let first = service
        .create_credential(request(agent.id, Some("first-password"), admin.id))
        .await
        .unwrap();
    let before = store.get_vault_entry(agent.id).await.unwrap().unwrap();

    let second = service
        .reset_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();
    let after = store.get_vault_entry(agent.id).await.unwrap().unwrap();

    assert_ne!(first.password, second.password);
    assert_eq!(before.id, after.id, "reset should reuse the same entry row");
    assert_ne!(before.encrypted_password, after.encrypted_password);

    let codec = SecretCodec::new(&config.master_key().unwrap());
    assert_eq!(codec.decrypt(&after.encrypted_password).unwrap(), second.password);

    // Audit trail now shows the reset on top of the create.
    let history = store.vault_access_history(after.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "reset");
    assert_eq!(history[1].action, "create");

    // The login password follows the reset.
    service.unlock(agent.id, &second.password).await.unwrap();
    let err = service.unlock(agent.id, "first-password").await.unwrap_err();
    assert!(matches!(err, VaultError::InvalidCredentials));
}

#[tokio::test]
async fn reset_creates_entry_when_absent() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .reset_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "reset");
}

#[tokio::test]
async fn view_requires_active_session_and_logs_nothing_when_locked() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    let err = service
        .view_credential(admin.id, agent.id, "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::VaultLocked));

    // The refused view left the audit trail untouched.
    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "create");
}

#[tokio::test]
async fn view_reveals_credential_during_unlock_window() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .create_credential(request(admin.id, Some("admin-pass-9"), admin.id))
        .await
        .unwrap();
    let issued = service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    service.unlock(admin.id, "admin-pass-9").await.unwrap();

    let revealed = service
        .view_credential(admin.id, agent.id, "172.16.0.9")
        .await
        .unwrap();
    assert_eq!(revealed.password, issued.password);

    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "view");
    assert_eq!(history[0].accessed_by, admin.id);
    assert_eq!(history[0].origin, "172.16.0.9");
}

#[tokio::test]
async fn view_after_explicit_lock_is_refused_and_logs_nothing() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .create_credential(request(admin.id, Some("admin-pass-9"), admin.id))
        .await
        .unwrap();
    service
        .create_credential(request(agent.id, None, admin.id))
        .await
        .unwrap();

    service.unlock(admin.id, "admin-pass-9").await.unwrap();
    service
        .view_credential(admin.id, agent.id, "10.0.0.1")
        .await
        .unwrap();

    // Locking mid-window shuts the gate for the very next view.
    service.lock(admin.id).await.unwrap();

    let err = service
        .view_credential(admin.id, agent.id, "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::VaultLocked));

    // Only the create and the successful view made it into the trail.
    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    let history = store.vault_access_history(entry.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "view");
    assert_eq!(history[1].action, "create");
}

#[tokio::test]
async fn view_unknown_entry_reports_not_found() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    service
        .create_credential(request(admin.id, Some("admin-pass-9"), admin.id))
        .await
        .unwrap();
    service.unlock(admin.id, "admin-pass-9").await.unwrap();

    let err = service
        .view_credential(admin.id, agent.id, "10.0.0.1")
        .await
        .unwrap_err();
    assert!(matches!(err, VaultError::EntryNotFound));
}

#[tokio::test]
async fn stored_forms_never_contain_plaintext() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();
    let agent = store.create_user(1, "agent@example.com").await.unwrap();

    let issued = service
        .create_credential(request(agent.id, Some("Plain-Text-7!"), admin.id))
        .await
        .unwrap();

    let entry = store.get_vault_entry(agent.id).await.unwrap().unwrap();
    assert!(!entry.encrypted_password.contains(&issued.password));

    let user = store.get_user(agent.id).await.unwrap().unwrap();
    assert!(!user.password_hash.unwrap().contains(&issued.password));
}

#[tokio::test]
async fn recent_access_paginates_newest_first() {
    let config = test_config();
    let (store, service) = spawn_vault(&config).await;

    let admin = store.create_user(1, "admin@example.com").await.unwrap();

    let mut last_agent_id = 0;
    for i in 0..3 {
        let agent = store
            .create_user(1, &format!("agent{i}@example.com"))
            .await
            .unwrap();
        service
            .create_credential(request(agent.id, None, admin.id))
            .await
            .unwrap();
        last_agent_id = agent.id;
    }

    let audit = AuditRecorder::new(store.clone());

    let (page, total_pages) = audit.recent(1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(total_pages, 2);
    assert!(page[0].id > page[1].id);

    // Per-entry history sees only that entry's rows.
    let entry = store.get_vault_entry(last_agent_id).await.unwrap().unwrap();
    let history = audit.history(entry.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].vault_entry_id, entry.id);
}
