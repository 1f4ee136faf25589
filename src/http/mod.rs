//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, catch-all handler)
//!     → request.rs (request ID generation and lookup, path decoding)
//!     → [routing resolves the route, actions run it]
//!     → response.rs (status mapping, encoded body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{decoded_path, RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
