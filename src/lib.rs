//! tickframe: timestamped market records into one (symbol, time) table that
//! still answers to legacy ticker strings.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], including the polars-backed
//! tabular engine.

pub mod domain;
pub mod ports;
pub mod adapters;

pub use adapters::polars_frame::{
    FrameProxy, PolarsConverter, PolarsFrame, PolarsSeries, SeriesProxy,
};
pub use adapters::symbol_cache::SymbolCache;
pub use domain::compat::Proxy;
pub use domain::converter::FrameConverter;
pub use domain::error::{FrameError, TickframeError};
pub use domain::identity::Identity;
pub use domain::label::Label;
pub use domain::ops::{Arg, Op, Scalar, Value};
pub use domain::record::{Record, Slice};
pub use ports::symbol_port::SymbolResolver;
pub use ports::tabular_port::{TableEngine, Tabular};
