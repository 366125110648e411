//! Mediashelf-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across mediashelf:
//!
//! - **Typed IDs**: Type-safe UUID wrapper for catalog rows
//! - **Core Types**: Enums for media kinds and categories
//! - **Path Utilities**: Extension-to-kind and extension-to-MIME tables
//! - **Error Handling**: Common error type and result alias
//! - **JSON helpers**: Serialize unsigned 64-bit values as strings
//!
//! # Examples
//!
//! ```
//! use mediashelf_common::{MediaId, MediaKind, Error, Result};
//! use mediashelf_common::paths::classify_extension;
//!
//! let id = MediaId::new();
//! assert_eq!(classify_extension("mkv"), Some(MediaKind::Video));
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("media", "abc"))
//! }
//! # let _ = id;
//! ```

pub mod error;
pub mod ids;
pub mod json;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
