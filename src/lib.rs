//! Path-encoded forward gateway library.
//!
//! A request for `/<percent-encoded absolute URL>` is fetched from that
//! origin and returned with redirects, cookies and HTML links rewritten so
//! the client keeps talking to the gateway.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::{ProxyError, StartupError};
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
