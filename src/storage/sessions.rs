use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::{RotateOutcome, SessionRecord};
use super::tables::*;

impl Database {
    // ========================================================================
    // Session operations
    // ========================================================================

    /// Store a session record (sign-in)
    pub fn put_session(&self, session: &SessionRecord) -> Result<(), DatabaseError> {
        debug_assert!(
            !session.session_id.is_empty(),
            "session id must not be empty"
        );

        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let data = rmp_serde::to_vec_named(session)?;
            table.insert(session.session_id.as_str(), data.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get a session by id, revoked or not. Callers decide what a revoked
    /// row means for them.
    pub fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SESSIONS)?;

        match table.get(session_id)? {
            Some(data) => {
                let session: SessionRecord = rmp_serde::from_slice(data.value())?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// Rotate the refresh-token digest for a session: compare-and-swap
    /// inside one write transaction. Rotation succeeds only when the stored
    /// digest still equals `presented_hash`, so of two concurrent refreshes
    /// exactly one wins and the loser observes `Mismatch`.
    pub fn rotate_session(
        &self,
        session_id: &str,
        presented_hash: &str,
        new_hash: &str,
    ) -> Result<RotateOutcome, DatabaseError> {
        let write_txn = self.begin_write()?;

        let outcome = {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing: Option<SessionRecord> = match table.get(session_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                Some(mut session) if !session.is_revoked() => {
                    if session.refresh_token_hash != presented_hash {
                        RotateOutcome::Mismatch
                    } else {
                        session.refresh_token_hash = new_hash.to_string();
                        session.last_used_at = Utc::now();
                        let data = rmp_serde::to_vec_named(&session)?;
                        table.insert(session_id, data.as_slice())?;
                        RotateOutcome::Rotated
                    }
                }
                // Revoked sessions never accept a rotation
                _ => RotateOutcome::NotFound,
            }
        };

        write_txn.commit()?;
        Ok(outcome)
    }

    /// Revoke a session owned by `owner_id`. Idempotent: a missing session,
    /// a foreign owner, or an already-revoked row all commit nothing and
    /// return Ok.
    pub fn revoke_session(&self, owner_id: &str, session_id: &str) -> Result<(), DatabaseError> {
        let write_txn = self.begin_write()?;
        {
            let mut table = write_txn.open_table(SESSIONS)?;
            let existing: Option<SessionRecord> = match table.get(session_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            if let Some(mut session) = existing {
                if session.owner_id == owner_id && !session.is_revoked() {
                    session.revoked_at = Some(Utc::now());
                    let data = rmp_serde::to_vec_named(&session)?;
                    table.insert(session_id, data.as_slice())?;
                }
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}
