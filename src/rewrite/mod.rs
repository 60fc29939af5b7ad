//! Request/response rewriting.
//!
//! # Data Flow
//! ```text
//! request path  → target.rs (decode, default scheme, query)
//! origin reply  → cookies.rs (Domain/Path on every Set-Cookie)
//!               → redirect.rs (Location → gateway path)
//!               → html.rs (href/src/action links)
//! ```
//!
//! Everything here is synchronous and works on owned headers or text.

pub mod cookies;
pub mod encoding;
pub mod html;
pub mod redirect;
pub mod target;

pub use encoding::{decode_component, encode_component, proxy_path};
pub use target::{extract_target, ClientScheme};
