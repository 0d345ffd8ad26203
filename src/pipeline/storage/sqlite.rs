use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

use super::Sink;
use crate::config::is_sql_identifier;
use crate::constants::{
    CUSTOMER_ID, PRODUCT_CATEGORY, PRODUCT_ID, SPEND_CATEGORY, TOTAL_PER_CUSTOMER, TRANSACTION_AMOUNT,
    TRANSACTION_CATEGORY, TRANSACTION_DATE, TRANSACTION_TYPE,
};
use crate::domain::{CanonicalBatch, Cell};
use crate::error::{EtlError, Result};

/// Fixed target schema: column name and SQL type.
pub const TARGET_COLUMNS: [(&str, &str); 9] = [
    (CUSTOMER_ID, "VARCHAR(255)"),
    (PRODUCT_ID, "VARCHAR(255)"),
    (TRANSACTION_DATE, "DATETIME"),
    (TRANSACTION_AMOUNT, "FLOAT"),
    (TRANSACTION_TYPE, "VARCHAR(255)"),
    (SPEND_CATEGORY, "VARCHAR(255)"),
    (PRODUCT_CATEGORY, "VARCHAR(255)"),
    (TRANSACTION_CATEGORY, "VARCHAR(50)"),
    (TOTAL_PER_CUSTOMER, "FLOAT"),
];

fn to_sql_value(cell: Option<&Cell>) -> Value {
    match cell {
        None | Some(Cell::Null) => Value::Null,
        Some(Cell::Integer(i)) => Value::Integer(*i),
        Some(Cell::Float(f)) => Value::Real(*f),
        Some(Cell::Text(s)) => Value::Text(s.clone()),
    }
}

/// SQLite load target. Every load replaces the table contents: the table is
/// dropped, recreated with the fixed schema and filled in one transaction.
pub struct SqliteSink {
    conn: Mutex<Connection>,
    table: String,
}

impl SqliteSink {
    pub fn open<P: AsRef<Path>>(path: P, table: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::with_connection(Connection::open(path)?, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        if !is_sql_identifier(table) {
            return Err(EtlError::Config(format!(
                "Table name '{}' is not a plain SQL identifier",
                table
            )));
        }
        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn recreate_table_sql(&self) -> String {
        let columns: Vec<String> = TARGET_COLUMNS
            .iter()
            .map(|(name, ty)| format!("    {} {}", name, ty))
            .collect();
        format!(
            "DROP TABLE IF EXISTS {table};\nCREATE TABLE {table} (\n{columns}\n);",
            table = self.table,
            columns = columns.join(",\n")
        )
    }

    fn insert_sql(&self) -> String {
        let names: Vec<&str> = TARGET_COLUMNS.iter().map(|(name, _)| *name).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            names.join(", "),
            placeholders.join(", ")
        )
    }

    fn write_batch(&self, batch: &CanonicalBatch) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| EtlError::Storage("sqlite connection lock poisoned".to_string()))?;

        let ignored: Vec<&String> = batch
            .columns()
            .iter()
            .filter(|c| !TARGET_COLUMNS.iter().any(|(name, _)| name == c))
            .collect();
        if !ignored.is_empty() {
            debug!(?ignored, "Columns outside the target schema are not loaded");
        }

        let tx = conn.transaction()?;
        tx.execute_batch(&self.recreate_table_sql())?;
        {
            let mut stmt = tx.prepare(&self.insert_sql())?;
            for record in batch.records() {
                let values = TARGET_COLUMNS
                    .iter()
                    .map(|(name, _)| to_sql_value(record.get(name)));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        Ok(batch.len())
    }

    pub fn count_rows(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| EtlError::Storage("sqlite connection lock poisoned".to_string()))?;
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[async_trait]
impl Sink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn load(&self, batch: &CanonicalBatch) -> Result<usize> {
        let rows = self.write_batch(batch)?;
        info!(table = %self.table, rows, "Loaded canonical batch");
        Ok(rows)
    }
}
