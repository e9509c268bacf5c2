//! Utility functions shared across the discovery pipeline.
//!
//! - **URL handling**: input-entry parsing and canonical normalization
//! - **Text processing**: control-character stripping for untrusted feed text

mod text;
mod url_norm;

pub use text::strip_control_chars;
pub use url_norm::{normalize, normalize_str, parse_site_url, InputError};
