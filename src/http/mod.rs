//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, handlers)
//!     → request.rs (request ID, client scheme)
//!     → [gateway pipeline fetches and rewrites]
//!     → response.rs (no-store + CORS headers, landing page)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
