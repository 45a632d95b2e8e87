//! PostgreSQL integration
//!
//! Read-only access to the `xlsforms` table, which records the XForms the
//! backend knows about.

pub mod catalog;
pub mod client;

pub use catalog::{FormCatalog, PostgresFormCatalog};
pub use client::PostgreSQLClient;
