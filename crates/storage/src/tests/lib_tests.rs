use super::*;
use chrono::Utc;
use shared::domain::{Attachment, OrganizationType};

fn record(reference_id: &str) -> SubmittedRecord {
    SubmittedRecord {
        organization: OrganizationType::Ngo,
        organization_name: "Helping Hands".into(),
        issue_description: "Unsafe working conditions".into(),
        files: vec![Attachment::new("site.jpg", "image/jpeg", 204_800)],
        reference_id: ReferenceId::parse(reference_id).expect("reference id"),
        submitted_at: "2026-10-18T09:30:00.123Z".parse().expect("timestamp"),
    }
}

#[tokio::test]
async fn stores_and_reads_back_records() {
    let storage = Storage::new(MEMORY_DATABASE_URL).await.expect("db");
    let stored = record("AB12CD34");
    storage.put(&stored).await.expect("put");

    let loaded = storage
        .get(&stored.reference_id)
        .await
        .expect("get")
        .expect("record present");
    assert_eq!(loaded, stored);
    assert_eq!(storage.count_records().await.expect("count"), 1);
}

#[tokio::test]
async fn missing_reference_returns_none() {
    let storage = Storage::new(MEMORY_DATABASE_URL).await.expect("db");
    let missing = ReferenceId::parse("00000000").expect("reference id");
    assert!(storage.get(&missing).await.expect("get").is_none());
}

#[tokio::test]
async fn refuses_to_overwrite_existing_reference() {
    let storage = Storage::new(MEMORY_DATABASE_URL).await.expect("db");
    storage.put(&record("DEADBEEF")).await.expect("first put");

    let mut second = record("DEADBEEF");
    second.organization_name = "Someone Else".into();
    let err = storage.put(&second).await.expect_err("duplicate must fail");
    assert!(err.to_string().contains("already exists"));

    let kept = storage
        .get(&second.reference_id)
        .await
        .expect("get")
        .expect("record present");
    assert_eq!(kept.organization_name, "Helping Hands");
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new(MEMORY_DATABASE_URL).await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("grievances.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage.put(&record("CAFE0001")).await.expect("put");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[tokio::test]
async fn memory_store_uses_prefixed_keys_and_rejects_duplicates() {
    let store = MemoryRecordStore::new();
    let stored = record("1234ABCD");
    store.put(&stored).await.expect("put");

    let raw = store.raw("grievance_1234ABCD").await.expect("raw entry");
    assert!(raw.contains("\"referenceId\":\"1234ABCD\""));
    assert!(store.put(&stored).await.is_err());
    assert_eq!(store.len().await, 1);

    let loaded = store
        .get(&stored.reference_id)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(loaded.submitted_at, stored.submitted_at);
    assert!(loaded.submitted_at <= Utc::now());
}

#[test]
fn sqlite_path_ignores_memory_and_non_sqlite_urls() {
    assert!(sqlite_path(MEMORY_DATABASE_URL).is_none());
    assert!(sqlite_path("postgres://localhost/db").is_none());
    assert_eq!(
        sqlite_path("sqlite://./data/grievances.db?mode=rwc"),
        Some(PathBuf::from("./data/grievances.db"))
    );
}

#[test]
fn memory_pool_pins_its_single_connection() {
    let options = pool_options(MEMORY_DATABASE_URL);
    assert_eq!(options.get_max_connections(), 1);
    assert_eq!(options.get_min_connections(), 1);
    assert!(options.get_idle_timeout().is_none());
    assert!(options.get_max_lifetime().is_none());

    let file_options = pool_options("sqlite://./data/grievances.db");
    assert_eq!(file_options.get_max_connections(), 5);
}

#[tokio::test]
async fn memory_database_keeps_records_across_queries() {
    let storage = Storage::new(MEMORY_DATABASE_URL).await.expect("db");
    storage.put(&record("0A0B0C0D")).await.expect("put");
    storage.health_check().await.expect("health check");
    assert_eq!(storage.count_records().await.expect("count"), 1);
    assert!(storage
        .get(&ReferenceId::parse("0A0B0C0D").expect("reference id"))
        .await
        .expect("get")
        .is_some());
}
