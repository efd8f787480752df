//! Command handlers, one module per area.

pub mod saved;
pub mod search;
pub mod tables;
pub mod upload;
