//! Operation surface shared by engine frames and series and by the
//! compatibility wrappers around them.

use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Arg, Axis, Op, Value};
use crate::domain::table_builder::CanonicalTable;
use std::fmt::Display;

pub type Outcome<T> =
    Result<Value<<T as Tabular>::Frame, <T as Tabular>::Series>, FrameError>;

pub trait Tabular: Display + Sized {
    type Frame;
    type Series;

    fn invoke(&self, op: Op, args: &[Arg<Self::Frame>]) -> Outcome<Self>;

    /// Invoke by operation name; unknown names fail with the engine's own error.
    fn invoke_named(&self, name: &str, args: &[Arg<Self::Frame>]) -> Outcome<Self> {
        self.invoke(name.parse()?, args)
    }

    /// Item access: a column of a frame, an entry of a series.
    fn get(&self, key: &Label) -> Outcome<Self> {
        self.invoke(Op::Get, &[Arg::Label(key.clone())])
    }

    /// `key in value`: column membership for frames, index membership for series.
    fn contains(&self, key: &Label) -> bool;

    /// Membership in one level of the row index.
    fn level_contains(&self, level: usize, key: &Label) -> bool;

    /// Whether `key` is already a label on `axis` (optionally one index level),
    /// as opposed to something that still needs resolving.
    fn has_label(&self, axis: Axis, level: Option<usize>, key: &Label) -> bool;

    /// Axis that item access addresses.
    fn key_axis(&self) -> Axis;

    /// Names of the row index levels, outermost first.
    fn level_names(&self) -> Vec<Option<String>>;

    fn nlevels(&self) -> usize {
        self.level_names().len()
    }

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An engine able to hold the canonical (symbol, time) table.
pub trait TableEngine: Tabular {
    fn from_canonical(table: CanonicalTable) -> Result<Self, FrameError>;
}
