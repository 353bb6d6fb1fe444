//! satchel aggregates RSS/Atom feeds into a single sanitized HTML
//! digest for offline reading on a constrained device.
//!
//! The crate is organized around a small pipeline:
//!
//! - [`config`] - the line-oriented feed list and optional TOML settings
//! - [`feed`] - fetching, autodiscovery, parsing, and normalization
//! - [`render`] - the final digest document
//!
//! The binary in `main.rs` wires these together and renders per-URL
//! status events for the console.

pub mod config;
pub mod feed;
pub mod render;
pub mod util;
