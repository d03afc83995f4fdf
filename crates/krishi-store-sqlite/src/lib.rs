//! SQLite backend for the Krishi portal store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! pool without blocking the async runtime. Failures surface as
//! [`krishi_core::Error`]: domain guards keep their precise variants and
//! database-level faults come back as [`krishi_core::Error::Storage`].

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;
