//! Configuration-driven mock data server.
//!
//! Requests are mapped onto flat documents under a root directory and served
//! by one of four actions: read, write, append or delete.

pub mod actions;
pub mod codec;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::schema::MockConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
