use chrono::Utc;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::models::FileRecord;
use super::tables::*;

impl Database {
    // ========================================================================
    // File operations
    // ========================================================================

    /// Check whether a live record with this (owner, name) exists. Callers
    /// use this as a cheap rejection before writing the blob; the
    /// authoritative check runs again inside `create_file`'s transaction.
    pub fn file_name_exists(&self, owner_id: &str, name: &str) -> Result<bool, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILE_NAMES)?;
        Ok(table.get(file_name_key(owner_id, name).as_str())?.is_some())
    }

    /// Insert a file record and update the name and owner indexes. Returns
    /// false without writing anything if a live record already claims the
    /// same (owner, original_name). The check and the insert share one
    /// write transaction, so concurrent uploads of the same name admit
    /// exactly one winner.
    pub fn create_file(&self, file: &FileRecord) -> Result<bool, DatabaseError> {
        debug_assert!(!file.file_id.is_empty(), "file id must not be empty");
        debug_assert!(
            !file.original_name.is_empty(),
            "file name must not be empty"
        );

        let write_txn = self.begin_write()?;
        let name_key = file_name_key(&file.owner_user_id, &file.original_name);

        let created = {
            let mut name_table = write_txn.open_table(FILE_NAMES)?;
            if name_table.get(name_key.as_str())?.is_some() {
                false
            } else {
                name_table.insert(name_key.as_str(), file.file_id.as_str())?;

                let mut table = write_txn.open_table(FILES)?;
                let data = rmp_serde::to_vec_named(file)?;
                table.insert(file.file_id.as_str(), data.as_slice())?;

                let mut owner_table = write_txn.open_table(OWNER_FILES)?;
                let mut file_ids: Vec<String> = owner_table
                    .get(file.owner_user_id.as_str())?
                    .map(|v| rmp_serde::from_slice(v.value()).unwrap_or_default())
                    .unwrap_or_default();

                if !file_ids.contains(&file.file_id) {
                    file_ids.push(file.file_id.clone());
                    let index_data = rmp_serde::to_vec_named(&file_ids)?;
                    owner_table.insert(file.owner_user_id.as_str(), index_data.as_slice())?;
                }
                true
            }
        };

        write_txn.commit()?;
        Ok(created)
    }

    /// Get a live file scoped to its owner. A wrong owner and a missing id
    /// are indistinguishable; ownership is enforced by the lookup itself.
    pub fn get_file(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(FILES)?;

        match table.get(file_id)? {
            Some(data) => {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                if file.owner_user_id == owner_id && file.is_live() {
                    Ok(Some(file))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// List an owner's live files, most recently updated first.
    pub fn list_files(
        &self,
        owner_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FileRecord>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let owner_table = read_txn.open_table(OWNER_FILES)?;
        let files_table = read_txn.open_table(FILES)?;

        let file_ids: Vec<String> = match owner_table.get(owner_id)? {
            Some(data) => rmp_serde::from_slice(data.value())?,
            None => return Ok(Vec::new()),
        };

        let mut files = Vec::new();
        for file_id in file_ids {
            if let Some(data) = files_table.get(file_id.as_str())? {
                let file: FileRecord = rmp_serde::from_slice(data.value())?;
                if file.is_live() {
                    files.push(file);
                }
            }
        }

        files.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(files.into_iter().skip(offset).take(limit).collect())
    }

    /// Swap in replacement content for a live file: new size, mime type,
    /// checksum and storage key in one transaction. Returns the previous
    /// storage key so the caller can reclaim the old blob, or None if no
    /// live record matches the owner and id.
    pub fn update_file_content(
        &self,
        owner_id: &str,
        file_id: &str,
        size_bytes: u64,
        mime_type: &str,
        checksum_sha256: &str,
        storage_key: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let previous_key = {
            let mut table = write_txn.open_table(FILES)?;
            let existing: Option<FileRecord> = match table.get(file_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                Some(mut file) if file.owner_user_id == owner_id && file.is_live() => {
                    let previous = file.storage_key.clone();
                    file.size_bytes = size_bytes;
                    file.mime_type = mime_type.to_string();
                    file.checksum_sha256 = checksum_sha256.to_string();
                    file.storage_key = storage_key.to_string();
                    file.updated_at = Utc::now();

                    let data = rmp_serde::to_vec_named(&file)?;
                    table.insert(file_id, data.as_slice())?;
                    Some(previous)
                }
                _ => None,
            }
        };

        write_txn.commit()?;
        Ok(previous_key)
    }

    /// Soft-delete a file: set `deleted_at` and drop the name and owner
    /// index entries, freeing the name for reuse. The row itself is
    /// retained. Returns the storage key for blob cleanup, or None if no
    /// live record matches.
    pub fn delete_file(
        &self,
        owner_id: &str,
        file_id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let write_txn = self.begin_write()?;

        let storage_key = {
            let mut table = write_txn.open_table(FILES)?;
            let existing: Option<FileRecord> = match table.get(file_id)? {
                Some(data) => Some(rmp_serde::from_slice(data.value())?),
                None => None,
            };

            match existing {
                Some(mut file) if file.owner_user_id == owner_id && file.is_live() => {
                    file.deleted_at = Some(Utc::now());
                    let key = file.storage_key.clone();
                    let name_key = file_name_key(&file.owner_user_id, &file.original_name);

                    let data = rmp_serde::to_vec_named(&file)?;
                    table.insert(file_id, data.as_slice())?;

                    {
                        let mut name_table = write_txn.open_table(FILE_NAMES)?;
                        name_table.remove(name_key.as_str())?;
                    }

                    {
                        let owner_table = write_txn.open_table(OWNER_FILES)?;
                        let ids: Option<Vec<String>> = match owner_table.get(owner_id)? {
                            Some(data) => Some(rmp_serde::from_slice(data.value())?),
                            None => None,
                        };
                        drop(owner_table);

                        if let Some(mut ids) = ids {
                            ids.retain(|fid| fid != file_id);
                            let mut owner_table = write_txn.open_table(OWNER_FILES)?;
                            if ids.is_empty() {
                                owner_table.remove(owner_id)?;
                            } else {
                                let new_data = rmp_serde::to_vec_named(&ids)?;
                                owner_table.insert(owner_id, new_data.as_slice())?;
                            }
                        }
                    }

                    Some(key)
                }
                _ => None,
            }
        };

        write_txn.commit()?;
        Ok(storage_key)
    }
}
