use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

// ── Options ──

pub fn get_option(conn: &Connection, name: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM options WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_option(conn: &Connection, name: &str, value: &str) -> rusqlite::Result<()> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO options (name, value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(name) DO UPDATE SET
           value = excluded.value,
           updated_at = excluded.updated_at",
        params![name, value, now],
    )?;
    Ok(())
}
