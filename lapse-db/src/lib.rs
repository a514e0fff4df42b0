#![allow(clippy::bool_comparison)]

pub mod servers;
pub mod store;

pub use store::{MemoryServerStore, PgServerStore, ServerStore, StoreError};

///
/// Embedded migrations of the panel database.
///
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
