//! Utility functions for common operations.
//!
//! - **Text helpers**: blank-string fallbacks, set-like list de-duplication, clamping
//! - **URL validation**: normalization of the backend base URL
//!
//! # Examples
//!
//! ```
//! use pulse_account::util::{clamp, string_or, validate_base_url};
//!
//! let name = string_or(Some("  ".to_string()), "Maya Lumen");
//! assert_eq!(name, "Maya Lumen");
//!
//! assert_eq!(clamp(1.3, 0.0, 1.0), Some(1.0));
//!
//! let base = validate_base_url("http://localhost:4000/").unwrap();
//! assert_eq!(base, "http://localhost:4000");
//! ```

mod text;
mod url_validator;

pub use text::{clamp, dedupe_preserving_order, non_blank, string_or};
pub use url_validator::{validate_base_url, UrlValidationError};
