//! CLI command implementations.
//!
//! - [`fetch`] - Plan a region and download its tiles
//! - [`store`] - Inspect and clean the output tree (check, remove, prune)

pub mod fetch;
pub mod store;
