//! Named slot operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

impl Database {
    /// Read the raw value stored in a slot.
    pub fn read_slot(&self, key: &str) -> DbResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Overwrite a slot with a new value.
    pub fn write_slot(&self, key: &str, value: &str) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a slot entirely.
    pub fn delete_slot(&self, key: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM kv_store WHERE key = ?", [key])?;
        Ok(rows_affected > 0)
    }

    /// Serialize a value into a slot.
    pub fn write_json<T: serde::Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let json = serde_json::to_string(value)?;
        self.write_slot(key, &json)
    }

    /// Deserialize a slot, if present.
    pub fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        self.read_slot(key)?
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(Into::into)
    }
}
