use crate::db::*;
use crate::types::TextPair;
use tempfile::NamedTempFile;

fn pair(original: &str, result: Option<&str>) -> TextPair {
    TextPair {
        original: original.to_string(),
        result: result.map(str::to_string),
    }
}

#[tokio::test]
async fn test_save_and_get_texts_in_insertion_order() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let first_batch = vec![pair("b", Some("B")), pair("a", Some("A"))];
    let second_batch = vec![pair("c", Some("C"))];
    db.save_texts(1, &first_batch).await.unwrap();
    db.save_texts(1, &second_batch).await.unwrap();

    let texts = db.get_texts(1).await.unwrap();
    assert_eq!(
        texts,
        vec![pair("b", Some("B")), pair("a", Some("A")), pair("c", Some("C"))]
    );

    db.close().await;
}

#[tokio::test]
async fn test_failed_items_are_stored_with_null_result() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.save_texts(5, &[pair("ok", Some("OK")), pair("broken", None)])
        .await
        .unwrap();

    let rows = db.get_stored_texts(5).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].result.as_deref(), Some("OK"));
    assert!(rows[1].result.is_none());
    assert!(rows[0].id < rows[1].id);

    let nulls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM texts WHERE result IS NULL")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(nulls, 1);

    db.close().await;
}

#[tokio::test]
async fn test_texts_are_scoped_per_user() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.save_texts(1, &[pair("mine", Some("MINE"))]).await.unwrap();
    db.save_texts(2, &[pair("yours", Some("YOURS"))]).await.unwrap();

    assert_eq!(db.get_texts(1).await.unwrap(), vec![pair("mine", Some("MINE"))]);
    assert_eq!(db.get_texts(2).await.unwrap(), vec![pair("yours", Some("YOURS"))]);
    assert!(db.get_texts(3).await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_empty_batch_is_a_noop() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    db.save_texts(1, &[]).await.unwrap();
    assert!(db.get_texts(1).await.unwrap().is_empty());

    db.close().await;
}

#[tokio::test]
async fn test_query_after_close_returns_error() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    db.pool().close().await;

    assert!(db.get_texts(1).await.is_err());
    assert!(db.save_texts(1, &[pair("x", None)]).await.is_err());
}
