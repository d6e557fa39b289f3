//! `WarehouseDataSource` adapters.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{Fault, InMemoryDataSource};
pub use postgres::PgDataSource;
