//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing request:
//!     → headers.rs (strip platform-internal and hop-by-hop headers)
//!     → rules.rs (per-hostname keep/delete/set overrides)
//!     → Pass to origin client
//! ```
//!
//! # Design Decisions
//! - Rule table compiled once, shared read-only (no locking)
//! - Exact hostname match, `*` as fallback
//! - Nothing the client sends about the gateway itself reaches the origin

pub mod headers;
pub mod rules;

pub use headers::RequestSanitizer;
pub use rules::{HeaderRuleSet, RuleError};
