//! Infrastructure layer.

pub mod database;
pub mod storage;

#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
pub use self::{database::Database, storage::Storage};
