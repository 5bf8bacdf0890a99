//! Database module: models, schema and storage access for student records.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL and the schema initializer
//! - `sqlite.rs`: connection factory and the record repository

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{Student, StudentFields};
pub use schema::{SQLITE_INIT, ensure_schema};
pub use sqlite::{ConnectionFactory, StudentStorage};
