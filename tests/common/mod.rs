//! Shared fixtures: a temporary SQLite store seeded through its own writable
//! pool, and a gateway served on an ephemeral port.

#![allow(dead_code)]

use data_gateway::config::PoolOptions;
use data_gateway::gateway::{QueryGateway, router};
use data_gateway::models::ConnectionConfig;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const ITEMS_DDL: &str = "CREATE TABLE items (
    id INTEGER,
    name TEXT,
    description TEXT,
    created_at DATETIME
)";

/// A SQLite database file plus a writable pool for seeding and mutating it.
pub struct TestStore {
    _dir: TempDir,
    pub url: String,
    pub writer: SqlitePool,
}

impl TestStore {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("store.db").display());
        let options = SqliteConnectOptions::from_str(&url)
            .unwrap()
            .create_if_missing(true);
        let writer = SqlitePool::connect_with(options).await.unwrap();
        Self {
            _dir: dir,
            url,
            writer,
        }
    }

    /// Store with an `items` table holding the given rows, inserted in order.
    pub async fn with_items(rows: &[(i64, &str, &str, &str)]) -> Self {
        let store = Self::new().await;
        store.exec(ITEMS_DDL).await;
        for (id, name, description, created_at) in rows {
            sqlx::query(
                "INSERT INTO items (id, name, description, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(id)
            .bind(name)
            .bind(description)
            .bind(created_at)
            .execute(&store.writer)
            .await
            .unwrap();
        }
        store
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql).execute(&self.writer).await.unwrap();
    }

    pub fn connection_config(&self, table: &str) -> ConnectionConfig {
        ConnectionConfig::new(self.url.clone(), table, PoolOptions::default()).unwrap()
    }

    pub async fn gateway(&self, table: &str) -> Arc<QueryGateway> {
        let gateway =
            QueryGateway::connect(&self.connection_config(table), Duration::from_secs(30))
                .await
                .unwrap();
        Arc::new(gateway)
    }
}

/// Serve the gateway on 127.0.0.1 with an OS-assigned port.
pub async fn serve(gateway: Arc<QueryGateway>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(gateway, "/data");
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub fn alpha_row() -> (i64, &'static str, &'static str, &'static str) {
    (1, "Alpha", "first", "2024-01-01T00:00:00Z")
}
