//! Mediashelf - media catalog with metadata enrichment and streaming
//!
//! This library crate exposes the core functionality for integration testing.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod metadata;
pub mod scanner;
pub mod server;
pub mod streaming;
