//! Certificate Revocation List (CRL) refresh
//!
//! # Features
//! - On-demand refresh through [`CrlRefresher::refresh_crl`]
//! - HTTP download of the CRL with validation and atomic write to disk
//! - Optional periodic refresh

mod errors;
mod fetcher;
mod refresh;
pub mod scheduler;
mod types;

// Re-export public types
pub use errors::{CrlError, CrlResult};
pub use fetcher::{CrlFetcher, HttpCrlFetcher};
pub use refresh::{CrlRefresher, UnconfiguredFetcher};
pub use scheduler::CrlScheduler;
pub use types::CrlData;
