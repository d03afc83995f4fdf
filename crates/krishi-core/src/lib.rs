//! Core types and trait definitions for the Krishi portal backend.
//!
//! Everything here is plain domain modelling: principals, workflow state
//! machines, and the [`store::PortalStore`] trait the storage and API crates
//! build on. No HTTP, no SQL.

pub mod analytics;
pub mod application;
pub mod error;
pub mod executive;
pub mod farmer;
pub mod field_status;
pub mod principal;
pub mod request;
pub mod role;
pub mod scheme;
pub mod settings;
pub mod store;

pub use error::{Error, Result};
