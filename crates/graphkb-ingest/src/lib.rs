//! Ingestion side of graphkb
//!
//! Data sources describe their graph inside a transaction, commit it into a
//! bulk of updates and publish it on the event bus. The graph updater
//! applies every bulk to a graph store.

pub mod datasource;
pub mod file_store;
pub mod listener;
pub mod memory;
pub mod store;
pub mod transaction;
pub mod updater;


pub use datasource::{DataSourceError, DataSourceFile, RelationRecord};
pub use file_store::FileStore;
pub use listener::{BusClosed, EventBus, SourceSubGraphUpdates};
pub use memory::MemoryStore;
pub use store::{GraphStore, SchemaPersistor, StoreError};
pub use transaction::Transaction;
pub use updater::{GraphUpdater, UpdateError};
