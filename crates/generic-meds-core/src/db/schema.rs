//! SQLite schema definition.

/// Complete database schema.
///
/// Client state lives in named slots, each holding one serialized JSON document
/// that is overwritten wholesale on every write.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Slot holding the saved medicines list.
pub const SAVED_MEDICINES_SLOT: &str = "savedMedicines";
