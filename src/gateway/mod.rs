//! The query gateway.
//!
//! A `QueryGateway` owns the store connection and answers the one read the
//! service exposes. It is constructed with its connection (either injected
//! through [`QueryGateway::new`] or opened by [`QueryGateway::connect`]) and
//! handed to the HTTP layer as shared state.

pub mod http;

pub use http::{HttpServer, router};

use crate::db::{DbPool, QueryExecutor};
use crate::error::GatewayResult;
use crate::models::{ConnectionConfig, ConnectionInfo, Record, TableName};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, error, info};

/// Lifecycle of the gateway.
///
/// `Uninitialized → Connecting → Ready`, and per request
/// `Ready → Querying → Ready`. `Connecting → Failed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayState {
    Uninitialized,
    Connecting,
    Ready,
    Querying,
    Failed,
}

impl std::fmt::Display for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Querying => "querying",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
pub struct QueryGateway {
    pool: DbPool,
    table: TableName,
    executor: QueryExecutor,
    in_flight: AtomicUsize,
}

impl QueryGateway {
    /// Build a gateway around an already open pool.
    pub fn new(pool: DbPool, table: TableName, query_timeout: Duration) -> Self {
        let executor = QueryExecutor::new(&table, pool.db_type(), query_timeout);
        Self {
            pool,
            table,
            executor,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Open the store connection and return a ready gateway.
    ///
    /// An `Err` here is the terminal `Failed` state: there is no retry.
    pub async fn connect(
        config: &ConnectionConfig,
        query_timeout: Duration,
    ) -> GatewayResult<Self> {
        debug!(
            from = %GatewayState::Uninitialized,
            to = %GatewayState::Connecting,
            database = %config.masked_connection_string(),
            "Gateway state"
        );

        let pool = match DbPool::connect(config).await {
            Ok(pool) => pool,
            Err(e) => {
                error!(
                    state = %GatewayState::Failed,
                    error = %e,
                    suggestion = e.suggestion().unwrap_or_default(),
                    "Could not connect to the store"
                );
                return Err(e);
            }
        };

        let info = ConnectionInfo {
            database_type: pool.db_type(),
            server_version: pool.server_version().await,
            table: config.table.to_string(),
        };
        info!(
            db_type = %info.database_type,
            server_version = ?info.server_version,
            table = %info.table,
            state = %GatewayState::Ready,
            "Connection established"
        );

        Ok(Self::new(pool, config.table.clone(), query_timeout))
    }

    /// Current lifecycle state. A constructed gateway is always past
    /// `Connecting`; it reports `Querying` while any read is in flight.
    pub fn state(&self) -> GatewayState {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            GatewayState::Querying
        } else {
            GatewayState::Ready
        }
    }

    /// Read every row of the configured table, in store order.
    ///
    /// Never mutates the store. A failure leaves the pool usable for the next
    /// call.
    pub async fn get_all(&self) -> GatewayResult<Vec<Record>> {
        let _guard = InFlight::enter(&self.in_flight);
        self.executor.fetch_all(&self.pool).await
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    /// Close the store connection.
    pub async fn close(&self) {
        info!("Closing database connections");
        self.pool.close().await;
    }
}

/// Counts a running read; decrements on drop so cancelled requests are released too.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_guard() {
        let counter = AtomicUsize::new(0);
        {
            let _a = InFlight::enter(&counter);
            let _b = InFlight::enter(&counter);
            assert_eq!(counter.load(Ordering::Acquire), 2);
        }
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(GatewayState::Querying.to_string(), "querying");
        assert_eq!(
            serde_json::to_value(GatewayState::Ready).unwrap(),
            serde_json::json!("ready")
        );
    }
}
