//! Input table schemas
//!
//! This module reads the three input tables (hyperlink activity, stock
//! prices, community embeddings) from delimited text into typed records,
//! rejecting malformed rows at the boundary.

mod activity;
mod embedding;
mod stock;

pub use activity::*;
pub use embedding::*;
pub use stock::*;
