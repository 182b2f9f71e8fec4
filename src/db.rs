use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{AppSettings, UserSession};
use crate::utils;

pub const SESSION_KEY: &str = "activat_user_session";
pub const SETTINGS_KEY: &str = "activat_user_settings";

/// Client-local key/value storage; values are JSON blobs.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = utils::local_store_path();
        utils::ensure_parent(&path);
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS local_storage(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at_utc TEXT NOT NULL
            );",
        )?;
        Ok(Self { conn })
    }

    pub fn get_item(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn set_item(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO local_storage (key, value, updated_at_utc)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at_utc = excluded.updated_at_utc",
            params![key, value, now],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> rusqlite::Result<()> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn load_session(&self) -> rusqlite::Result<Option<UserSession>> {
        self.load_json(SESSION_KEY)
    }

    /// `None` clears the stored session.
    pub fn save_session(&self, session: Option<&UserSession>) -> rusqlite::Result<()> {
        match session {
            Some(session) => self.save_json(SESSION_KEY, session),
            None => self.remove_item(SESSION_KEY),
        }
    }

    pub fn load_settings(&self) -> rusqlite::Result<Option<AppSettings>> {
        self.load_json(SETTINGS_KEY)
    }

    pub fn save_settings(&self, settings: &AppSettings) -> rusqlite::Result<()> {
        self.save_json(SETTINGS_KEY, settings)
    }

    fn load_json<T: DeserializeOwned>(&self, key: &str) -> rusqlite::Result<Option<T>> {
        let Some(payload) = self.get_item(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&payload).map(Some).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                payload.len(),
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
    }

    fn save_json<T: Serialize>(&self, key: &str, value: &T) -> rusqlite::Result<()> {
        let payload = serde_json::to_string(value)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        self.set_item(key, &payload)
    }
}
