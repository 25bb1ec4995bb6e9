//! Integration tests for accounts and lock passwords.

mod helpers;

use filevault_core::error::ErrorKind;

use helpers::{LOCK_PASSWORD, PASSWORD, TestApp};

#[tokio::test]
async fn test_register_normalizes_email_and_hashes_password() {
    let app = TestApp::new().await;
    let users = &app.services.users;

    let user = users
        .register("Alice", "  Alice@Example.COM ", PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.email, "alice@example.com");
    assert_ne!(user.password_hash, PASSWORD);
    assert!(user.password_hash.starts_with("$argon2"));
    assert!(user.is_active);
    assert!(!user.has_lock_password());

    let found = users.get_user_by_email("ALICE@example.com").await.unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(users.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_weak_passwords() {
    let app = TestApp::new().await;
    let users = &app.services.users;
    users.register("Alice", "alice@example.com", PASSWORD).await.unwrap();

    let err = users
        .register("Other", "ALICE@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let err = users.register("Bob", "bob@example.com", "short").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = users.register("Bob", "not-an-email", PASSWORD).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = users.register(" ", "bob@example.com", PASSWORD).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_authenticate_records_login() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("alice").await;
    assert!(user.last_login.is_none());

    let logged_in = app
        .services
        .users
        .authenticate("Alice@Example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);
    assert!(logged_in.last_login.is_some());

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", PASSWORD),
    ] {
        let err = app
            .services
            .users
            .authenticate(email, password)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.message, "Invalid email or password");
    }
}

#[tokio::test]
async fn test_deactivated_account_cannot_log_in() {
    let app = TestApp::new().await;
    let (user, _) = app.create_user("alice").await;

    let deactivated = app.services.users.deactivate(user.id).await.unwrap();
    assert!(!deactivated.is_active);

    let err = app
        .services
        .users
        .authenticate("alice@example.com", PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.message, "Invalid email or password");
}

#[tokio::test]
async fn test_lock_password_lifecycle() {
    let app = TestApp::new().await;
    let (_, ctx) = app.create_user("alice").await;
    let users = &app.services.users;

    let err = users
        .set_lock_password(&ctx, "not-my-password", LOCK_PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    let err = users
        .set_lock_password(&ctx, PASSWORD, "tiny")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let user = users.get_user(ctx.user_id).await.unwrap();
    let err = users.verify_lock_password(&user, Some(LOCK_PASSWORD)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);

    users.set_lock_password(&ctx, PASSWORD, LOCK_PASSWORD).await.unwrap();
    let user = users.get_user(ctx.user_id).await.unwrap();
    assert!(user.has_lock_password());
    users.verify_lock_password(&user, Some(LOCK_PASSWORD)).unwrap();

    for attempt in [None, Some(""), Some("lock-secreT")] {
        let err = users.verify_lock_password(&user, attempt).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
    }
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let app = TestApp::new().await;
    let err = app.services.users.get_user(99).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let err = app.services.users.deactivate(99).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}
