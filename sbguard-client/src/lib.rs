//! Safe Browsing API client for SBGUARD.
//!
//! Sends batched `threatMatches:find` lookups authenticated with an API key
//! in the query string.

mod client;

pub use client::{ClientConfig, SafebrowsingClient};
