//! Schema and rows shaped like an OpenBSC NITB `hlr.sqlite3`.

use rusqlite::{Connection, params};

/// Same tables the NITB creates, minus the UNIQUE constraint on `extension`,
/// which the tools do not rely on.
pub fn create_nitb_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS Subscriber (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TIMESTAMP NOT NULL,
            updated TIMESTAMP NOT NULL,
            imsi NUMERIC UNIQUE NOT NULL,
            name TEXT,
            extension TEXT,
            authorized INTEGER NOT NULL DEFAULT 0,
            tmsi TEXT UNIQUE,
            lac INTEGER NOT NULL DEFAULT 0,
            expire_lu TIMESTAMP DEFAULT NULL
        );
        CREATE TABLE IF NOT EXISTS Equipment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created TIMESTAMP NOT NULL,
            updated TIMESTAMP NOT NULL,
            name TEXT,
            classmark1 NUMERIC,
            classmark2 BLOB,
            classmark3 BLOB,
            imei NUMERIC UNIQUE NOT NULL
        );",
    )
}

/// Inserts a subscriber with an explicit id
pub fn insert_subscriber(conn: &Connection, id: i64, imsi: &str, extension: Option<&str>) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO Subscriber (id, created, updated, imsi, extension, authorized)
         VALUES (?1, '2024-03-01 10:00:00', '2024-03-01 10:00:00', ?2, ?3, 1)",
        params![id, imsi, extension],
    )?;
    Ok(())
}

pub fn insert_equipment(conn: &Connection, id: i64, imei: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO Equipment (id, created, updated, imei) VALUES (?1, '2024-03-01 10:00:00', '2024-03-01 10:00:00', ?2)",
        params![id, imei],
    )?;
    Ok(())
}
