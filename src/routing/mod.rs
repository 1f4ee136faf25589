//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (path, method, content type, query)
//!     → resolver.rs (exact → template → positional inference → dynamic)
//!     → table.rs (route lookup)
//!     → Return: matched Route + augmented query, or RouteError
//!
//! Route compilation (at startup and on reload):
//!     RouteConfig[]
//!     → route.rs (resolve file, codec, default action)
//!     → table.rs (exact map + per-method template trees)
//!     → Freeze as immutable Resolver
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - Exact literal routes win over every inferred match

pub mod resolver;
pub mod route;
pub mod table;

pub use resolver::{Resolved, Resolver, RouteError};
pub use route::{Action, Method, Route};
pub use table::{RouteTable, RouteTableError};
