// Adapters for the application ports

pub mod http_client;
pub mod memory_store;
pub mod sqlite_store;

pub use http_client::ReqwestHttp;
pub use memory_store::InMemoryTableStore;
pub use sqlite_store::SqliteTableStore;
