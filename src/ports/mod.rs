//! Port traits between the domain and its adapters.

pub mod config_port;
pub mod symbol_port;
pub mod tabular_port;
