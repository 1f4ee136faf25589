//! Document storage subsystem.
//!
//! # Data Flow
//! ```text
//! Action executor
//!     → locks.rs (shared or exclusive lock on the route's file)
//!     → fs.rs (exists / load / load-or-create / replace)
//!     → document.rs (decode / encode with the route's codec)
//! ```
//!
//! # Design Decisions
//! - No cache: every operation reads and rewrites the whole file
//! - Reads never create files; only mutating actions may
//! - A rewrite lands through rename so readers never see half a file

pub mod document;
pub mod fs;
pub mod locks;
pub mod watcher;

pub use document::Document;
pub use fs::{DocumentStore, StoreError};
pub use locks::{FileGuard, FileLocks};
pub use watcher::DocumentWatcher;
