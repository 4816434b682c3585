// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache store and cache entry operations.
//!
//! Headers are stored as a JSON array of `[name, value]` pairs.

use rusqlite::{params, OptionalExtension};
use sitekit_core::{FetchResponse, SitekitError};

use crate::database::{map_tr_err, Database};

/// Create a store if it does not exist yet.
pub async fn open_store(db: &Database, store: &str) -> Result<(), SitekitError> {
    let store = store.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO cache_stores (name) VALUES (?1)",
                params![store],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All store names, oldest first.
pub async fn store_names(db: &Database) -> Result<Vec<String>, SitekitError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM cache_stores ORDER BY created_at, name")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Delete a store and its entries in one transaction. Returns whether it existed.
pub async fn delete_store(db: &Database, store: &str) -> Result<bool, SitekitError> {
    let store = store.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM cache_entries WHERE store = ?1", params![store])?;
            let removed = tx.execute("DELETE FROM cache_stores WHERE name = ?1", params![store])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Look up one entry.
pub async fn get_entry(
    db: &Database,
    store: &str,
    key: &str,
) -> Result<Option<FetchResponse>, SitekitError> {
    let store = store.to_string();
    let key = key.to_string();
    let row = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT status, headers, body FROM cache_entries
                 WHERE store = ?1 AND request_key = ?2",
                params![store, key],
                |row| {
                    Ok((
                        row.get::<_, u16>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;

    row.map(|(status, headers, body)| {
        let headers: Vec<(String, String)> =
            serde_json::from_str(&headers).map_err(SitekitError::storage)?;
        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    })
    .transpose()
}

/// Write an entry into an existing store. Returns false when the store is gone.
pub async fn put_entry(
    db: &Database,
    store: &str,
    key: &str,
    response: &FetchResponse,
) -> Result<bool, SitekitError> {
    let store = store.to_string();
    let key = key.to_string();
    let status = response.status;
    let headers = serde_json::to_string(&response.headers).map_err(SitekitError::storage)?;
    let body = response.body.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let exists = tx
                .query_row(
                    "SELECT 1 FROM cache_stores WHERE name = ?1",
                    params![store],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !exists {
                return Ok(false);
            }
            tx.execute(
                "INSERT INTO cache_entries (store, request_key, status, headers, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(store, request_key) DO UPDATE SET
                     status = excluded.status,
                     headers = excluded.headers,
                     body = excluded.body,
                     stored_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![store, key, status, headers, body],
            )?;
            tx.commit()?;
            Ok(true)
        })
        .await
        .map_err(map_tr_err)
}

/// Request keys held by a store, sorted.
pub async fn entry_keys(db: &Database, store: &str) -> Result<Vec<String>, SitekitError> {
    let store = store.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT request_key FROM cache_entries WHERE store = ?1 ORDER BY request_key",
            )?;
            let rows = stmt.query_map(params![store], |row| row.get(0))?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
