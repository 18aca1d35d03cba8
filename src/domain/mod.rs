//! Records, identities and the conversion into the canonical table.

pub mod compat;
pub mod converter;
pub mod converter_config;
pub mod error;
pub mod field;
pub mod identity;
pub mod label;
pub mod normalize;
pub mod ops;
pub mod record;
pub mod table_builder;
