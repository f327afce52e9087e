use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::UserRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Store a new user. Returns false without writing if the id is taken;
    /// the check and the insert share one write transaction.
    pub fn create_user(&self, user: &UserRecord) -> Result<bool, DatabaseError> {
        debug_assert!(!user.id.is_empty(), "user id must not be empty");

        let write_txn = self.begin_write()?;
        let created = {
            let mut table = write_txn.open_table(USERS)?;
            if table.get(user.id.as_str())?.is_some() {
                false
            } else {
                let data = rmp_serde::to_vec_named(user)?;
                table.insert(user.id.as_str(), data.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(created)
    }

    /// Get a user by id
    pub fn get_user(&self, id: &str) -> Result<Option<UserRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(USERS)?;

        match table.get(id)? {
            Some(data) => {
                let user: UserRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}
