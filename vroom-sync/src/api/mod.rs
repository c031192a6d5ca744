//! HTTP API handlers for vroom-sync

pub mod health;
pub mod library;
pub mod sync;

pub use health::health_routes;
pub use library::library_routes;
pub use sync::sync_routes;
