//! Service modules for view synchronization
//!
//! - Upstream capability and its Stash GraphQL implementation
//! - Saved-filter criteria translation
//! - Filter catalog, item store, view synchronizer, projector
//! - Pass driver

pub mod criteria;
pub mod item_store;
pub mod projector;
pub mod stash_client;
pub mod sync_engine;
pub mod upstream;
pub mod view_catalog;
pub mod view_sync;

pub use criteria::CriteriaError;
pub use item_store::ItemStore;
pub use projector::LibraryProjector;
pub use stash_client::{StashAuth, StashClient};
pub use sync_engine::SyncEngine;
pub use upstream::{ItemQuery, Upstream, UpstreamError};
pub use view_catalog::{FilterClass, ViewCatalog};
pub use view_sync::{reconcile, ViewSynchronizer};
