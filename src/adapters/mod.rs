//! Concrete adapter implementations for ports.

pub mod file_config_adapter;
pub mod polars_frame;
pub mod symbol_cache;
