//! `SQLite` persistence: pooled connections, schema migrations, and the
//! stateless repositories the log is built from.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, PragmaState, new_file, new_in_memory,
    verify_pragmas,
};
pub use migrations::{current_version, latest_version, run_migrations};
