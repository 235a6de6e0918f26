pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod item_store;
pub mod models;
pub mod origin;
pub mod refresh_policy;
pub mod registry;
pub mod storage;
pub mod tracker;
pub mod tui;
pub mod watch_list;

pub use error::{FetchError, Result, StorageError, TrackerError};
pub use item_store::ItemRecordStore;
pub use models::{EpisodeRecord, Rating, TrackedItemId, TrackedItemRecord};
pub use refresh_policy::RefreshPolicy;
pub use registry::WatchListRegistry;
pub use tracker::{Intent, Outcome, Tracker};
pub use watch_list::WatchList;
