//! URL extraction for SBGUARD.
//!
//! The host splits a message into parts; this crate picks the text-bearing
//! ones and pulls candidate URLs out of them.

mod decode;
mod extractor;

pub use decode::{decoded_text_parts, MessagePart};
pub use extractor::RegexUrlExtractor;
