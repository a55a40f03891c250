pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StoreError, StoreRead, StoreResult, StoreWrite};
