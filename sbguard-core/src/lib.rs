//! # SBGUARD Core
//!
//! Core types, errors, and traits for checking message URLs against the
//! Safe Browsing threat-matching API.
//!
//! This crate provides the foundational building blocks used by all other SBGUARD crates:
//!
//! - **Types**: Wire models for threat-match requests and responses
//! - **Config**: Typed plugin configuration with explicit defaults
//! - **Action**: Verdict codes handed back to the mail host
//! - **Errors**: Error types with transport classification
//! - **Traits**: Seams for the remote client and URL extraction
//!
//! ## Example
//!
//! ```rust
//! use sbguard_core::{SafebrowsingConfig, ThreatMatch};
//!
//! let config = SafebrowsingConfig::default();
//! assert!(!config.has_api_key());
//!
//! let json = r#"{"threat": {"url": "http://malware.test/"}, "cacheDuration": "300s"}"#;
//! let m: ThreatMatch = serde_json::from_str(json).unwrap();
//! assert_eq!(m.url(), "http://malware.test/");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod action;
pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use action::Action;
pub use config::SafebrowsingConfig;
pub use constants::*;
pub use error::{Result, SbError};
pub use traits::*;
pub use types::*;
