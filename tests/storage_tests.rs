use chrono::Utc;
use file_vault::storage::models::FileRecord;
use file_vault::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_file(file_id: &str, owner: &str, name: &str) -> FileRecord {
    let now = Utc::now();
    FileRecord {
        file_id: file_id.to_string(),
        owner_user_id: owner.to_string(),
        original_name: name.to_string(),
        size_bytes: 1024,
        mime_type: "text/plain".to_string(),
        checksum_sha256: "a".repeat(64),
        storage_key: format!("key-{file_id}"),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

#[test]
fn test_create_and_get_file() {
    let (_dir, db) = test_db();
    let file = sample_file("file-1", "user@example.com", "notes.txt");

    assert!(db.create_file(&file).unwrap());

    let retrieved = db
        .get_file("user@example.com", "file-1")
        .unwrap()
        .expect("file should exist");
    assert_eq!(retrieved.file_id, "file-1");
    assert_eq!(retrieved.original_name, "notes.txt");
    assert_eq!(retrieved.size_bytes, 1024);
    assert_eq!(retrieved.mime_type, "text/plain");
    assert_eq!(retrieved.storage_key, "key-file-1");
    assert!(retrieved.deleted_at.is_none());
}

#[test]
fn test_get_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_file("user@example.com", "nonexistent").unwrap().is_none());
}

#[test]
fn test_duplicate_name_rejected() {
    let (_dir, db) = test_db();
    assert!(db
        .create_file(&sample_file("file-1", "owner@example.com", "a.txt"))
        .unwrap());

    // Same owner, same name, different id: exactly one winner
    assert!(!db
        .create_file(&sample_file("file-2", "owner@example.com", "a.txt"))
        .unwrap());

    // The loser wrote nothing
    assert!(db.get_file("owner@example.com", "file-2").unwrap().is_none());
}

#[test]
fn test_same_name_different_owners() {
    let (_dir, db) = test_db();
    assert!(db
        .create_file(&sample_file("file-1", "alice@example.com", "a.txt"))
        .unwrap());
    assert!(db
        .create_file(&sample_file("file-2", "bob@example.com", "a.txt"))
        .unwrap());
}

#[test]
fn test_file_name_exists() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("f", "owner@example.com", "taken.txt"))
        .unwrap();

    assert!(db.file_name_exists("owner@example.com", "taken.txt").unwrap());
    assert!(!db.file_name_exists("owner@example.com", "free.txt").unwrap());
    assert!(!db.file_name_exists("other@example.com", "taken.txt").unwrap());
}

#[test]
fn test_ownership_isolation() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "alice@example.com", "secret.txt"))
        .unwrap();

    // A correct file id under the wrong owner is indistinguishable from a
    // missing file
    assert!(db.get_file("bob@example.com", "file-1").unwrap().is_none());
    assert!(db
        .get_file("alice@example.com", "file-1")
        .unwrap()
        .is_some());
}

#[test]
fn test_delete_file_soft() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "owner@example.com", "gone.txt"))
        .unwrap();

    let key = db
        .delete_file("owner@example.com", "file-1")
        .unwrap()
        .expect("delete should return the storage key");
    assert_eq!(key, "key-file-1");

    // Invisible to every lookup
    assert!(db.get_file("owner@example.com", "file-1").unwrap().is_none());
    assert!(db.list_files("owner@example.com", 10, 0).unwrap().is_empty());

    // Name is free for reuse immediately
    assert!(!db.file_name_exists("owner@example.com", "gone.txt").unwrap());
    assert!(db
        .create_file(&sample_file("file-2", "owner@example.com", "gone.txt"))
        .unwrap());
}

#[test]
fn test_delete_file_not_found() {
    let (_dir, db) = test_db();
    assert!(db.delete_file("owner@example.com", "nonexistent").unwrap().is_none());
}

#[test]
fn test_delete_file_twice() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "owner@example.com", "once.txt"))
        .unwrap();

    assert!(db.delete_file("owner@example.com", "file-1").unwrap().is_some());
    assert!(db.delete_file("owner@example.com", "file-1").unwrap().is_none());
}

#[test]
fn test_delete_wrong_owner() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "alice@example.com", "hers.txt"))
        .unwrap();

    assert!(db.delete_file("bob@example.com", "file-1").unwrap().is_none());
    assert!(db
        .get_file("alice@example.com", "file-1")
        .unwrap()
        .is_some());
}

#[test]
fn test_list_files_recent_first() {
    let (_dir, db) = test_db();

    let mut first = sample_file("file-1", "owner@example.com", "first.txt");
    first.updated_at = Utc::now() - chrono::Duration::seconds(60);
    first.created_at = first.updated_at;
    db.create_file(&first).unwrap();

    db.create_file(&sample_file("file-2", "owner@example.com", "second.txt"))
        .unwrap();

    let files = db.list_files("owner@example.com", 10, 0).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].file_id, "file-2");
    assert_eq!(files[1].file_id, "file-1");
}

#[test]
fn test_list_files_pagination() {
    let (_dir, db) = test_db();
    for i in 0..5i64 {
        let mut file = sample_file(&format!("file-{i}"), "owner@example.com", &format!("{i}.txt"));
        file.updated_at = Utc::now() - chrono::Duration::seconds(100 - i);
        db.create_file(&file).unwrap();
    }

    let page1 = db.list_files("owner@example.com", 2, 0).unwrap();
    let page2 = db.list_files("owner@example.com", 2, 2).unwrap();
    let page3 = db.list_files("owner@example.com", 2, 4).unwrap();

    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    assert_eq!(page3.len(), 1);

    // No overlap between pages
    assert_eq!(page1[0].file_id, "file-4");
    assert_eq!(page3[0].file_id, "file-0");
}

#[test]
fn test_list_files_empty_owner() {
    let (_dir, db) = test_db();
    assert!(db.list_files("nobody@example.com", 10, 0).unwrap().is_empty());
}

#[test]
fn test_list_files_scoped_to_owner() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-a", "alice@example.com", "a.txt"))
        .unwrap();
    db.create_file(&sample_file("file-b", "bob@example.com", "b.txt"))
        .unwrap();

    let alice = db.list_files("alice@example.com", 10, 0).unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].file_id, "file-a");
}

#[test]
fn test_update_file_content() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "owner@example.com", "doc.txt"))
        .unwrap();

    let previous = db
        .update_file_content(
            "owner@example.com",
            "file-1",
            2048,
            "application/pdf",
            &"b".repeat(64),
            "key-new",
        )
        .unwrap()
        .expect("update should succeed");
    assert_eq!(previous, "key-file-1");

    let file = db.get_file("owner@example.com", "file-1").unwrap().unwrap();
    assert_eq!(file.size_bytes, 2048);
    assert_eq!(file.mime_type, "application/pdf");
    assert_eq!(file.checksum_sha256, "b".repeat(64));
    assert_eq!(file.storage_key, "key-new");
    assert!(file.updated_at >= file.created_at);
    // Identity fields are stable across replacement
    assert_eq!(file.file_id, "file-1");
    assert_eq!(file.original_name, "doc.txt");
}

#[test]
fn test_update_file_content_not_found() {
    let (_dir, db) = test_db();
    assert!(db
        .update_file_content(
            "owner@example.com",
            "nonexistent",
            1,
            "text/plain",
            &"c".repeat(64),
            "key"
        )
        .unwrap()
        .is_none());
}

#[test]
fn test_update_file_content_wrong_owner() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "alice@example.com", "hers.txt"))
        .unwrap();

    assert!(db
        .update_file_content(
            "bob@example.com",
            "file-1",
            1,
            "text/plain",
            &"c".repeat(64),
            "key"
        )
        .unwrap()
        .is_none());
}

#[test]
fn test_update_deleted_file_rejected() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("file-1", "owner@example.com", "dead.txt"))
        .unwrap();
    db.delete_file("owner@example.com", "file-1").unwrap();

    assert!(db
        .update_file_content(
            "owner@example.com",
            "file-1",
            1,
            "text/plain",
            &"c".repeat(64),
            "key"
        )
        .unwrap()
        .is_none());
}

#[test]
fn test_upload_list_delete_flow() {
    let (_dir, db) = test_db();
    let owner = "+12025550123";

    let mut file = sample_file("file-1", owner, "a.txt");
    file.size_bytes = 10;
    assert!(db.create_file(&file).unwrap());

    // Second upload of the same name is rejected
    assert!(!db.create_file(&sample_file("file-2", owner, "a.txt")).unwrap());

    let listed = db.list_files(owner, 10, 0).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].size_bytes, 10);

    db.delete_file(owner, "file-1").unwrap().unwrap();
    assert!(db.list_files(owner, 10, 0).unwrap().is_empty());
}

#[test]
fn test_purge_all() {
    let (_dir, db) = test_db();
    db.create_file(&sample_file("p1", "owner@example.com", "p1.txt"))
        .unwrap();
    db.create_file(&sample_file("p2", "owner@example.com", "p2.txt"))
        .unwrap();

    let stats = db.purge_all().unwrap();
    assert_eq!(stats.files, 2);

    assert!(db.list_files("owner@example.com", 10, 0).unwrap().is_empty());
    assert!(!db.file_name_exists("owner@example.com", "p1.txt").unwrap());
}
