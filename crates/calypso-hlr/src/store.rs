//! Reads and writes the controller's `Subscriber` table.
//!
//! The database belongs to the controller, which keeps mutating it while the
//! tools run. We never create tables here; the schema is inspected on open
//! and queries are shaped to the columns that are actually present.
//! Values always go through bound parameters. The only identifiers spliced
//! into SQL come from [`NumberColumn`] and the fixed optional-column list.

use std::path::Path;

use calypso_config::NumberColumn;
use calypso_core::{Extension, SubscriberId};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::{HlrError, HlrResult};

/// One row of `Subscriber`, with the IMEI joined from `Equipment` when available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
    pub id: SubscriberId,
    pub imsi: String,
    /// Registered number (extension / MSISDN)
    pub number: Option<String>,
    pub imei: Option<String>,
    pub tmsi: Option<String>,
    pub created: Option<String>,
}

/// Result of a direct number update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Updated,
    NotFound,
}

#[derive(Debug, Clone, Copy)]
struct SchemaInfo {
    number: NumberColumn,
    has_tmsi: bool,
    has_created: bool,
    has_equipment: bool,
}

pub struct HlrStore {
    conn: Connection,
    schema: SchemaInfo,
}

impl HlrStore {
    /// Opens an existing HLR file read-write. A missing file is an error,
    /// never silently created.
    pub fn open(path: &Path, number: NumberColumn) -> HlrResult<Self> {
        if !path.is_file() {
            return Err(HlrError::Missing(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX)
            .map_err(HlrError::Open)?;
        // The controller holds the file open too; wait for its locks briefly instead of failing
        conn.busy_timeout(std::time::Duration::from_secs(2)).map_err(HlrError::Open)?;
        tracing::debug!("HlrStore: opened {}", path.display());
        Self::from_connection(conn, number)
    }

    /// Fresh in-memory database with the NITB schema, for fixtures and dry runs
    pub fn open_in_memory(number: NumberColumn) -> HlrResult<Self> {
        let conn = Connection::open_in_memory().map_err(HlrError::Open)?;
        crate::fixtures::create_nitb_schema(&conn)?;
        Self::from_connection(conn, number)
    }

    /// Wraps an already open connection, e.g. an in-memory fixture database
    pub fn from_connection(conn: Connection, number: NumberColumn) -> HlrResult<Self> {
        let schema = inspect_schema(&conn, number)?;
        tracing::trace!("HlrStore: schema {:?}", schema);
        Ok(Self { conn, schema })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Looks up one subscriber by id
    pub fn subscriber(&self, id: SubscriberId) -> HlrResult<Option<SubscriberRecord>> {
        let sql = format!("{} WHERE s.id = ?1", self.select_sql());
        let record = self.conn.query_row(&sql, params![id.get() as i64], map_record).optional()?;
        Ok(record)
    }

    /// Sets the registered number of subscriber `id`.
    ///
    /// Existence is checked first so a missing subscriber leaves the store
    /// untouched. The update is committed only when it touched a row.
    pub fn update_registered_number(&mut self, id: SubscriberId, number: &Extension) -> HlrResult<MutationOutcome> {
        let column = self.schema.number.column_name();
        let tx = self.conn.transaction()?;

        let exists = tx
            .query_row("SELECT id FROM Subscriber WHERE id = ?1", params![id.get() as i64], |row| row.get::<_, i64>(0))
            .optional()?
            .is_some();
        if !exists {
            tracing::info!("HlrStore: no subscriber with id {}", id);
            return Ok(MutationOutcome::NotFound);
        }

        let sql = format!("UPDATE Subscriber SET {} = ?1 WHERE id = ?2", column);
        let affected = tx.execute(&sql, params![number.as_str(), id.get() as i64])?;
        if affected == 0 {
            return Err(HlrError::NoRowsAffected(id));
        }
        tx.commit()?;
        tracing::info!("HlrStore: subscriber {} {} set to {}", id, column, number);
        Ok(MutationOutcome::Updated)
    }

    /// All subscribers ordered by id, for listing
    pub fn list_subscribers(&self) -> HlrResult<Vec<SubscriberRecord>> {
        let sql = format!("{} ORDER BY s.id", self.select_sql());
        self.collect(&sql)
    }

    /// Subscribers with a non-empty registered number, in store order
    pub fn broadcast_targets(&self) -> HlrResult<Vec<SubscriberRecord>> {
        let column = self.schema.number.column_name();
        let sql = format!("{} WHERE s.{} IS NOT NULL AND TRIM(CAST(s.{} AS TEXT)) != ''", self.select_sql(), column, column);
        self.collect(&sql)
    }

    fn collect(&self, sql: &str) -> HlrResult<Vec<SubscriberRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map_record)?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// SELECT producing the column order expected by `map_record`
    fn select_sql(&self) -> String {
        let s = &self.schema;
        let number = s.number.column_name();
        let tmsi = if s.has_tmsi { "CAST(s.tmsi AS TEXT)" } else { "NULL" };
        let created = if s.has_created { "CAST(s.created AS TEXT)" } else { "NULL" };
        let (imei, join) = if s.has_equipment {
            ("CAST(e.imei AS TEXT)", " LEFT JOIN Equipment AS e ON s.id = e.id")
        } else {
            ("NULL", "")
        };
        format!(
            "SELECT s.id, CAST(s.imsi AS TEXT), CAST(s.{} AS TEXT), {}, {}, {} FROM Subscriber AS s{}",
            number, imei, tmsi, created, join
        )
    }
}

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<SubscriberRecord> {
    let raw_id: i64 = row.get(0)?;
    let id = u64::try_from(raw_id)
        .ok()
        .and_then(|v| SubscriberId::new(v).ok())
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(0, raw_id))?;
    Ok(SubscriberRecord {
        id,
        imsi: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        number: row.get(2)?,
        imei: row.get(3)?,
        tmsi: row.get(4)?,
        created: row.get(5)?,
    })
}

fn inspect_schema(conn: &Connection, number: NumberColumn) -> HlrResult<SchemaInfo> {
    let subscriber_cols = table_columns(conn, "Subscriber")?;
    if subscriber_cols.is_empty() {
        return Err(HlrError::SchemaMismatch("no Subscriber table".to_string()));
    }
    for required in ["id", "imsi", number.column_name()] {
        if !subscriber_cols.iter().any(|c| c == required) {
            return Err(HlrError::SchemaMismatch(format!("Subscriber has no {} column", required)));
        }
    }
    let equipment_cols = table_columns(conn, "Equipment")?;

    Ok(SchemaInfo {
        number,
        has_tmsi: subscriber_cols.iter().any(|c| c == "tmsi"),
        has_created: subscriber_cols.iter().any(|c| c == "created"),
        has_equipment: equipment_cols.iter().any(|c| c == "imei") && equipment_cols.iter().any(|c| c == "id"),
    })
}

/// Lower-cased column names of `table`, empty when the table does not exist
fn table_columns(conn: &Connection, table: &str) -> HlrResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let names = stmt
        .query_map(params![table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names.into_iter().map(|n| n.to_lowercase()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn store() -> HlrStore {
        HlrStore::open_in_memory(NumberColumn::Extension).unwrap()
    }

    #[test]
    fn test_select_sql_shape() {
        let s = store();
        let sql = s.select_sql();
        assert!(sql.contains("CAST(s.extension AS TEXT)"));
        assert!(sql.contains("LEFT JOIN Equipment"));
    }

    #[test]
    fn test_schema_without_number_column_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        fixtures::create_nitb_schema(&conn).unwrap();
        let err = HlrStore::from_connection(conn, NumberColumn::Msisdn).err().unwrap();
        assert!(matches!(err, HlrError::SchemaMismatch(_)), "{err}");
    }

    #[test]
    fn test_empty_database_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = HlrStore::from_connection(conn, NumberColumn::Extension).err().unwrap();
        assert!(matches!(err, HlrError::SchemaMismatch(_)));
    }
}
