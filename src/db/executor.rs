//! Execution of the gateway's single fixed read.
//!
//! The executor builds `SELECT * FROM <table>` once, at construction, and
//! runs it with a timeout. Rows come back in the order the store produced
//! them; nothing here sorts, filters or truncates.

use crate::db::pool::DbPool;
use crate::db::types::RowToJson;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{DatabaseType, Record, TableName};
use futures_util::TryStreamExt;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Runs the fixed SELECT against one table.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    sql: String,
    query_timeout: Duration,
}

impl QueryExecutor {
    pub fn new(table: &TableName, db_type: DatabaseType, query_timeout: Duration) -> Self {
        Self {
            sql: select_all_sql(table, db_type),
            query_timeout,
        }
    }

    /// Fetch every row of the table as records, preserving store order.
    pub async fn fetch_all(&self, pool: &DbPool) -> GatewayResult<Vec<Record>> {
        let start = Instant::now();

        debug!(
            sql = %self.sql,
            timeout_ms = self.query_timeout.as_millis() as u64,
            "Executing query"
        );

        let records = match pool {
            DbPool::MySql(p) => fetch_records(p, &self.sql, self.query_timeout).await?,
            DbPool::Postgres(p) => fetch_records(p, &self.sql, self.query_timeout).await?,
            DbPool::SQLite(p) => fetch_records(p, &self.sql, self.query_timeout).await?,
        };

        debug!(
            rows = records.len(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Query complete"
        );

        Ok(records)
    }
}

/// Build the fixed statement for a table in the given dialect.
pub fn select_all_sql(table: &TableName, db_type: DatabaseType) -> String {
    format!("SELECT * FROM {}", table.quoted(db_type))
}

/// Stream rows from any pool, converting each as it arrives.
///
/// Uses raw SQL (no bind parameters), so drivers fall back to their simple
/// query protocol where they have one.
async fn fetch_records<'p, DB>(
    pool: &'p sqlx::Pool<DB>,
    sql: &'p str,
    query_timeout: Duration,
) -> GatewayResult<Vec<Record>>
where
    DB: sqlx::Database,
    DB::Row: RowToJson,
    &'p sqlx::Pool<DB>: sqlx::Executor<'p, Database = DB>,
{
    use sqlx::Executor;

    let rows_future = pool
        .fetch(sql)
        .map_ok(|row| row.to_record())
        .try_collect::<Vec<_>>();

    match timeout(query_timeout, rows_future).await {
        Ok(result) => result.map_err(GatewayError::from),
        Err(_) => Err(GatewayError::timeout("query execution", query_timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_all_sql_per_dialect() {
        let table = TableName::parse("items").unwrap();
        assert_eq!(
            select_all_sql(&table, DatabaseType::SQLite),
            "SELECT * FROM \"items\""
        );
        assert_eq!(
            select_all_sql(&table, DatabaseType::MySQL),
            "SELECT * FROM `items`"
        );

        let qualified = TableName::parse("public.items").unwrap();
        assert_eq!(
            select_all_sql(&qualified, DatabaseType::PostgreSQL),
            "SELECT * FROM \"public\".\"items\""
        );
    }
}
