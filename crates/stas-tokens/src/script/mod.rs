//! Token locking script layouts: reading, building and data outputs.

pub mod data;
pub mod dstas_builder;
pub mod reader;
pub mod stas_builder;
pub mod templates;
