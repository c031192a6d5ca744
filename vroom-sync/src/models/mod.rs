//! Data models for vroom-sync
//!
//! - Saved filters and the views derived from them
//! - Items (scenes and images)
//! - Sync reports and the projected library

pub mod filter;
pub mod item;
pub mod library;
pub mod report;
pub mod view;

pub use filter::{FilterMode, SavedFilter};
pub use item::Item;
pub use library::{ItemRef, Library, LibrarySection};
pub use report::{FetchPath, LoadReport, MemberChange, PassReport, ViewDiff, ViewOutcome};
pub use view::View;
