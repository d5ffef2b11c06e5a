//! Versioned route/stop dataset: file schema, in-memory model, and the
//! atomically-replaceable store.

mod error;
mod file;
mod model;
mod store;

pub use error::LoadError;
pub use file::{RouteRecordFile, RouteStopFile, SnapshotFile, StopRecordFile, StopRouteFile, SummaryFile};
pub use model::{RouteRecord, RouteStopLink, Snapshot, StopRecord, StopRouteLink, Summary};
pub use store::{SnapshotStore, StoreConfig};
