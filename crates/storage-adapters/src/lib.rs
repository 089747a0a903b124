//! Document stores and media storage behind the `domains` ports.
//!
//! * [`memory::MemoryStore`]: DashMap-backed, the default backend and the one
//!   every test runs against.
//! * `sqlite::SqliteStore` (feature `db-sqlite`): one JSON document per row.
//! * [`media_local::LocalMediaStorage`]: validated image uploads on disk.

pub mod media_local;
pub mod memory;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use media_local::LocalMediaStorage;
pub use memory::MemoryStore;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteStore;
