//! Connection-related data models.
//!
//! This module defines the store connection configuration and the validated
//! table identifier the gateway reads from.

use crate::config::PoolOptions;
use serde::{Deserialize, Serialize};

/// Supported database types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    PostgreSQL,
    /// Includes MariaDB
    MySQL,
    SQLite,
}

impl DatabaseType {
    /// Parse database type from a connection string.
    pub fn from_connection_string(connection_string: &str) -> Option<Self> {
        let lower = connection_string.to_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Self::PostgreSQL)
        } else if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Some(Self::MySQL)
        } else if lower.starts_with("sqlite://") || lower.starts_with("sqlite:") {
            Some(Self::SQLite)
        } else {
            None
        }
    }

    /// Get the display name for this database type.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PostgreSQL => "PostgreSQL",
            Self::MySQL => "MySQL",
            Self::SQLite => "SQLite",
        }
    }

    /// Quote a single identifier segment in this dialect.
    fn quote_ident(&self, ident: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", ident),
            Self::PostgreSQL | Self::SQLite => format!("\"{}\"", ident),
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A validated table identifier, optionally schema-qualified (`schema.table`).
///
/// Only `[A-Za-z_][A-Za-z0-9_]*` segments are accepted, so the name can be
/// spliced into the fixed SELECT after quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn parse(s: &str) -> Result<Self, ConnectionConfigError> {
        let s = s.trim();
        let mut parts = s.split('.');
        let (schema, table) = match (parts.next(), parts.next(), parts.next()) {
            (Some(table), None, None) => (None, table),
            (Some(schema), Some(table), None) => (Some(schema), table),
            _ => return Err(ConnectionConfigError::InvalidTable(s.to_string())),
        };

        for segment in schema.iter().chain(std::iter::once(&table)) {
            if !is_valid_ident(segment) {
                return Err(ConnectionConfigError::InvalidTable(s.to_string()));
            }
        }

        Ok(Self {
            schema: schema.map(String::from),
            table: table.to_string(),
        })
    }

    /// Render the identifier quoted for the given dialect.
    pub fn quoted(&self, db_type: DatabaseType) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                db_type.quote_ident(schema),
                db_type.quote_ident(&self.table)
            ),
            None => db_type.quote_ident(&self.table),
        }
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

fn is_valid_ident(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Configuration for the gateway's store connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub db_type: DatabaseType,
    /// Contains sensitive data - never log
    pub connection_string: String,
    pub table: TableName,
    pub pool_options: PoolOptions,
}

impl ConnectionConfig {
    pub fn new(
        connection_string: impl Into<String>,
        table: &str,
        pool_options: PoolOptions,
    ) -> Result<Self, ConnectionConfigError> {
        let connection_string = connection_string.into();

        let db_type = DatabaseType::from_connection_string(&connection_string)
            .ok_or_else(|| ConnectionConfigError::UnknownDatabaseType(mask(&connection_string)))?;
        let table = TableName::parse(table)?;
        pool_options
            .validate()
            .map_err(ConnectionConfigError::InvalidPoolOptions)?;

        Ok(Self {
            db_type,
            connection_string,
            table,
            pool_options,
        })
    }

    /// Get a display-safe version of the connection string (credentials masked).
    pub fn masked_connection_string(&self) -> String {
        mask(&self.connection_string)
    }
}

fn mask(connection_string: &str) -> String {
    if let Some(at_pos) = connection_string.find('@') {
        if let Some(colon_pos) = connection_string[..at_pos].rfind(':') {
            // "scheme://user" has its colon before "//", which is not a password
            if !connection_string[colon_pos..].starts_with("://") {
                let prefix = &connection_string[..colon_pos + 1];
                let suffix = &connection_string[at_pos..];
                return format!("{}****{}", prefix, suffix);
            }
        }
    }
    connection_string.to_string()
}

/// Errors that can occur when creating a connection configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionConfigError {
    #[error("Unknown database type in connection string: {0}")]
    UnknownDatabaseType(String),

    #[error("Invalid table name '{0}': expected 'table' or 'schema.table' made of letters, digits and underscores")]
    InvalidTable(String),

    #[error("Invalid pool options: {0}")]
    InvalidPoolOptions(String),
}

/// Information about the established connection, logged at startup.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionInfo {
    pub database_type: DatabaseType,
    pub server_version: Option<String>,
    pub table: String,
}
