//! Tabular engine backed by polars.
//!
//! Frames and series keep their row index as leading polars columns; see
//! [`index`] for the layout. Everything else about the data (dtypes, nulls,
//! joins, reshaping) is polars.

mod args;
pub mod frame;
mod index;
mod kernels;
pub mod series;

pub use frame::PolarsFrame;
pub use index::{Level, LevelKind};
pub use series::PolarsSeries;

use crate::domain::compat::{unexpected, Proxy};
use crate::domain::converter::FrameConverter;
use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Arg, Op, Scalar, Value};
use crate::ports::tabular_port::Tabular;
use polars::prelude::PolarsError;

pub type EngineValue = Value<PolarsFrame, PolarsSeries>;
pub type FrameProxy = Proxy<PolarsFrame>;
pub type SeriesProxy = Proxy<PolarsSeries>;
pub type PolarsConverter = FrameConverter<PolarsFrame>;

impl From<PolarsError> for FrameError {
    fn from(err: PolarsError) -> Self {
        FrameError::Engine(err.to_string())
    }
}

impl FrameProxy {
    /// Attribute-style column access.
    pub fn column(&self, name: impl Into<Label>) -> Result<SeriesProxy, FrameError> {
        self.get(name)?
            .into_series()
            .ok_or_else(|| unexpected("column", "series"))
    }

    pub fn fillna(&self, value: impl Into<Scalar>) -> Result<FrameProxy, FrameError> {
        self.invoke(Op::FillNa, &[Arg::Scalar(value.into())])?
            .into_frame()
            .ok_or_else(|| unexpected("fillna", "frame"))
    }

    /// Row at `position`, negative counting from the end.
    pub fn iloc(&self, position: i64) -> Result<SeriesProxy, FrameError> {
        self.invoke(Op::Iloc, &[Arg::Int(position)])?
            .into_series()
            .ok_or_else(|| unexpected("iloc", "series"))
    }
}

impl SeriesProxy {
    pub fn fillna(&self, value: impl Into<Scalar>) -> Result<SeriesProxy, FrameError> {
        self.invoke(Op::FillNa, &[Arg::Scalar(value.into())])?
            .into_series()
            .ok_or_else(|| unexpected("fillna", "series"))
    }

    pub fn iloc(&self, position: i64) -> Result<Scalar, FrameError> {
        self.invoke(Op::Iloc, &[Arg::Int(position)])?
            .into_scalar()
            .ok_or_else(|| unexpected("iloc", "scalar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polars_errors_become_engine_errors() {
        let err: FrameError = PolarsError::ColumnNotFound("x".into()).into();
        assert!(matches!(err, FrameError::Engine(ref msg) if msg.contains('x')));
    }
}
