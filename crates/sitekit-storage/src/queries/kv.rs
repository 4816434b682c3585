// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value record operations.

use rusqlite::params;
use sitekit_core::SitekitError;

use crate::database::{map_tr_err, Database};

/// Read one value.
pub async fn get(db: &Database, key: &str) -> Result<Option<String>, SitekitError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            });
            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert or replace one value.
pub async fn set(db: &Database, key: &str, value: &str) -> Result<(), SitekitError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![key, value],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Delete one value. Missing keys are not an error.
pub async fn remove(db: &Database, key: &str) -> Result<(), SitekitError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Keys sharing a prefix, compared literally (no LIKE wildcards).
pub async fn keys_with_prefix(db: &Database, prefix: &str) -> Result<Vec<String>, SitekitError> {
    let prefix = prefix.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT key FROM kv WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
            )?;
            let keys = stmt
                .query_map(params![prefix], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            Ok(keys)
        })
        .await
        .map_err(map_tr_err)
}
