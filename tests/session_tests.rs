use chrono::Utc;
use file_vault::storage::models::{RotateOutcome, SessionRecord, UserRecord};
use file_vault::storage::Database;

fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("data")).unwrap();
    (dir, db)
}

fn sample_user(id: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        password_hash: "f".repeat(64),
        salt: "0".repeat(32),
        created_at: Utc::now(),
    }
}

fn sample_session(session_id: &str, owner: &str, token_hash: &str) -> SessionRecord {
    let now = Utc::now();
    SessionRecord {
        session_id: session_id.to_string(),
        owner_id: owner.to_string(),
        refresh_token_hash: token_hash.to_string(),
        user_agent: Some("test-agent/1.0".to_string()),
        device_name: None,
        created_at: now,
        last_used_at: now,
        revoked_at: None,
    }
}

// ============================================================================
// User tests
// ============================================================================

#[test]
fn test_create_and_get_user() {
    let (_dir, db) = test_db();
    assert!(db.create_user(&sample_user("user@example.com")).unwrap());

    let user = db
        .get_user("user@example.com")
        .unwrap()
        .expect("user should exist");
    assert_eq!(user.id, "user@example.com");
    assert_eq!(user.password_hash, "f".repeat(64));
}

#[test]
fn test_create_user_duplicate() {
    let (_dir, db) = test_db();
    assert!(db.create_user(&sample_user("user@example.com")).unwrap());
    assert!(!db.create_user(&sample_user("user@example.com")).unwrap());
}

#[test]
fn test_get_user_not_found() {
    let (_dir, db) = test_db();
    assert!(db.get_user("nobody@example.com").unwrap().is_none());
}

// ============================================================================
// Session tests
// ============================================================================

#[test]
fn test_put_and_get_session() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-1"))
        .unwrap();

    let session = db
        .get_session("sess-1")
        .unwrap()
        .expect("session should exist");
    assert_eq!(session.owner_id, "user@example.com");
    assert_eq!(session.refresh_token_hash, "hash-1");
    assert!(!session.is_revoked());
}

#[test]
fn test_rotate_session() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-old"))
        .unwrap();

    let outcome = db.rotate_session("sess-1", "hash-old", "hash-new").unwrap();
    assert_eq!(outcome, RotateOutcome::Rotated);

    let session = db.get_session("sess-1").unwrap().unwrap();
    assert_eq!(session.refresh_token_hash, "hash-new");
    assert!(session.last_used_at >= session.created_at);
}

#[test]
fn test_rotate_session_single_shot() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-old"))
        .unwrap();

    assert_eq!(
        db.rotate_session("sess-1", "hash-old", "hash-new").unwrap(),
        RotateOutcome::Rotated
    );

    // Presenting the superseded digest again is exactly the two-concurrent-
    // refreshes race: the loser must observe a mismatch
    assert_eq!(
        db.rotate_session("sess-1", "hash-old", "hash-other").unwrap(),
        RotateOutcome::Mismatch
    );

    // The winner's digest is untouched by the failed attempt
    let session = db.get_session("sess-1").unwrap().unwrap();
    assert_eq!(session.refresh_token_hash, "hash-new");
}

#[test]
fn test_rotate_session_mismatch() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-real"))
        .unwrap();

    assert_eq!(
        db.rotate_session("sess-1", "hash-forged", "hash-new").unwrap(),
        RotateOutcome::Mismatch
    );
}

#[test]
fn test_rotate_session_not_found() {
    let (_dir, db) = test_db();
    assert_eq!(
        db.rotate_session("nonexistent", "hash", "hash-new").unwrap(),
        RotateOutcome::NotFound
    );
}

#[test]
fn test_rotate_revoked_session_rejected() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-1"))
        .unwrap();
    db.revoke_session("user@example.com", "sess-1").unwrap();

    // Even the correct digest cannot rotate a revoked session
    assert_eq!(
        db.rotate_session("sess-1", "hash-1", "hash-new").unwrap(),
        RotateOutcome::NotFound
    );
}

#[test]
fn test_revoke_session() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-1"))
        .unwrap();

    db.revoke_session("user@example.com", "sess-1").unwrap();

    let session = db.get_session("sess-1").unwrap().unwrap();
    assert!(session.is_revoked());
}

#[test]
fn test_revoke_session_idempotent() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "user@example.com", "hash-1"))
        .unwrap();

    db.revoke_session("user@example.com", "sess-1").unwrap();
    let first = db.get_session("sess-1").unwrap().unwrap().revoked_at;

    db.revoke_session("user@example.com", "sess-1").unwrap();
    let second = db.get_session("sess-1").unwrap().unwrap().revoked_at;

    // Second revoke neither errors nor moves the timestamp
    assert_eq!(first, second);
}

#[test]
fn test_revoke_session_missing_is_ok() {
    let (_dir, db) = test_db();
    db.revoke_session("user@example.com", "nonexistent").unwrap();
}

#[test]
fn test_revoke_session_foreign_owner_ignored() {
    let (_dir, db) = test_db();
    db.put_session(&sample_session("sess-1", "alice@example.com", "hash-1"))
        .unwrap();

    db.revoke_session("bob@example.com", "sess-1").unwrap();

    let session = db.get_session("sess-1").unwrap().unwrap();
    assert!(!session.is_revoked());
}
