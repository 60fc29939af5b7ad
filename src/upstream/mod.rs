//! Origin communication.

pub mod fetcher;

pub use fetcher::{OriginFetcher, OriginResponse, OutgoingRequest, ReqwestFetcher};
