use crate::db::*;
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_register_and_check_user() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert!(!db.is_user_registered(42).await.unwrap());

    let inserted = db.register_user(42, Some("neo")).await.unwrap();
    assert!(inserted);
    assert!(db.is_user_registered(42).await.unwrap());
    assert!(!db.is_user_registered(43).await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn test_register_is_idempotent_and_keeps_first_username() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    assert!(db.register_user(7, Some("first")).await.unwrap());
    assert!(!db.register_user(7, Some("second")).await.unwrap());

    let user = db.get_user(7).await.unwrap().unwrap();
    assert_eq!(user.user_id, 7);
    assert_eq!(user.username.as_deref(), Some("first"));
    assert!(user.registered_at > 0);

    db.close().await;
}

#[tokio::test]
async fn test_register_without_username() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.register_user(9, None).await.unwrap();
    let user = db.get_user(9).await.unwrap().unwrap();
    assert!(user.username.is_none());
    assert!(db.get_user(10).await.unwrap().is_none());

    db.close().await;
}
