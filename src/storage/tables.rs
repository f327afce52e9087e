use redb::TableDefinition;

/// Registered identities: user id -> UserRecord (msgpack)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Device sessions: session uuid -> SessionRecord (msgpack)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// File records: file uuid -> FileRecord (msgpack)
pub const FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("files");

/// Live-name index: "<owner>\0<name>" -> file uuid.
/// Only live records have an entry, so key presence is the uniqueness
/// constraint on (owner, original_name).
pub const FILE_NAMES: TableDefinition<&str, &str> = TableDefinition::new("file_names");

/// Owner index: owner id -> msgpack Vec of live file UUIDs
pub const OWNER_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("owner_files");

/// Compose a FILE_NAMES key. Owner ids never contain NUL, so the separator
/// cannot collide with user input.
pub fn file_name_key(owner_id: &str, name: &str) -> String {
    format!("{owner_id}\0{name}")
}
