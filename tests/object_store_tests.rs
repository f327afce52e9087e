use bytes::Bytes;
use file_vault::object_store::{checksum_sha256, LocalStore, ObjectStore};

#[tokio::test]
async fn test_local_store_put_get() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let data = Bytes::from("hello world");
    store.put("owner-1", "test-key", data.clone()).await.unwrap();

    let retrieved = store.get("owner-1", "test-key").await.unwrap();
    assert_eq!(retrieved, data);
}

#[tokio::test]
async fn test_local_store_owner_partitioning() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store
        .put("alice@example.com", "shared-key", Bytes::from("alice data"))
        .await
        .unwrap();

    // Same key under a different owner is a different object
    assert!(!store.exists("bob@example.com", "shared-key").await.unwrap());

    store
        .put("bob@example.com", "shared-key", Bytes::from("bob data"))
        .await
        .unwrap();

    assert_eq!(
        store.get("alice@example.com", "shared-key").await.unwrap(),
        Bytes::from("alice data")
    );
    assert_eq!(
        store.get("bob@example.com", "shared-key").await.unwrap(),
        Bytes::from("bob data")
    );
}

#[tokio::test]
async fn test_local_store_exists() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    assert!(!store.exists("owner-1", "missing").await.unwrap());

    store.put("owner-1", "present", Bytes::from("data")).await.unwrap();
    assert!(store.exists("owner-1", "present").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.put("owner-1", "to-delete", Bytes::from("data")).await.unwrap();
    assert!(store.exists("owner-1", "to-delete").await.unwrap());

    store.delete("owner-1", "to-delete").await.unwrap();
    assert!(!store.exists("owner-1", "to-delete").await.unwrap());
}

#[tokio::test]
async fn test_local_store_delete_nonexistent() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    // Deleting a nonexistent key should not error
    store.delete("owner-1", "nonexistent").await.unwrap();
}

#[tokio::test]
async fn test_local_store_get_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let result = store.get("owner-1", "missing").await;
    assert!(result.is_err());
    assert!(matches!(
        result.unwrap_err(),
        file_vault::object_store::ObjectStoreError::NotFound(_)
    ));
}

#[tokio::test]
async fn test_local_store_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    store.put("owner-1", "key", Bytes::from("first")).await.unwrap();
    store.put("owner-1", "key", Bytes::from("second")).await.unwrap();

    let data = store.get("owner-1", "key").await.unwrap();
    assert_eq!(data, Bytes::from("second"));
}

#[tokio::test]
async fn test_round_trip_preserves_bytes_and_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path()).unwrap();

    let payload: Vec<u8> = (0u16..512).map(|i| (i % 251) as u8).collect();
    let data = Bytes::from(payload.clone());
    let checksum = checksum_sha256(&data);

    store.put("owner-1", "blob", data).await.unwrap();
    let retrieved = store.get("owner-1", "blob").await.unwrap();

    assert_eq!(retrieved.as_ref(), payload.as_slice());
    assert_eq!(checksum_sha256(&retrieved), checksum);
}

#[test]
fn test_checksum_sha256_known_value() {
    // Well-known SHA-256 test vectors
    assert_eq!(
        checksum_sha256(b""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        checksum_sha256(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
    assert_eq!(checksum_sha256(b"abc").len(), 64);
}
