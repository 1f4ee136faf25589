//! Action execution subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved route + query + body
//!     → executor.rs (lock file, dispatch on action)
//!     → query.rs (predicate, projection, record building, id conflicts)
//!     → store (load / replace document)
//!     → Reply (encoded with the route's codec)
//! ```

pub mod executor;
pub mod query;

pub use executor::{ActionError, Executor, Reply};
pub use query::Query;
