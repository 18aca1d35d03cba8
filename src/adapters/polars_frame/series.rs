//! One labelled column over a row index.

use super::args::Args;
use super::frame::PolarsFrame;
use super::index::{dtype_name, label_levels, scalar_at, scalar_column, scalars, Indexed};
use super::kernels;
use super::EngineValue;
use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Aggregate, Arg, Axis, Op, Scalar, Value};
use crate::ports::tabular_port::{Outcome, Tabular};
use polars::prelude::{Column, DataType};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct PolarsSeries {
    data: Indexed,
    name: Option<Label>,
}

impl PolarsSeries {
    pub(crate) fn from_parts(data: Indexed, name: Option<Label>) -> Self {
        debug_assert_eq!(data.width(), 1);
        Self { data, name }
    }

    /// Series indexed by `labels`, holding `values`.
    pub(crate) fn from_labels(
        labels: &[Label],
        values: &[Scalar],
        name: Option<Label>,
    ) -> Result<Self, FrameError> {
        let (levels, mut columns) = label_levels(labels)?;
        columns.push(scalar_column("values".into(), values));
        Ok(Self::from_parts(Indexed::from_columns(levels, columns)?, name))
    }

    fn with_data(&self, data: Indexed) -> Self {
        Self::from_parts(data, self.name.clone())
    }

    pub fn name(&self) -> Option<&Label> {
        self.name.as_ref()
    }

    fn column(&self) -> &Column {
        self.data.value_column(0)
    }

    pub fn dtype(&self) -> &DataType {
        self.column().dtype()
    }

    pub fn values(&self) -> Result<Vec<Scalar>, FrameError> {
        scalars(self.column())
    }

    pub fn index_keys(&self) -> Result<Vec<Label>, FrameError> {
        self.data.keys()
    }

    pub(crate) fn data(&self) -> &Indexed {
        &self.data
    }

    /// Entry for a full key, or the sub-series under a partial one.
    pub fn get(&self, key: &Label) -> Result<EngineValue, FrameError> {
        let found = self.data.locate(key)?;
        if found.depth == self.data.nlevels() {
            if let &[row] = found.positions.as_slice() {
                return Ok(Value::Scalar(scalar_at(self.column(), row)?));
            }
        }
        Ok(Value::Series(self.with_data(self.data.narrow(&found)?)))
    }

    fn select(&self, keys: &[Label]) -> Result<Self, FrameError> {
        let mut positions = Vec::new();
        for key in keys {
            positions.extend(self.data.locate(key)?.positions);
        }
        Ok(self.with_data(self.data.take(&positions)?))
    }

    pub fn iloc(&self, position: usize) -> Result<Scalar, FrameError> {
        scalar_at(self.column(), position)
    }

    pub fn xs(&self, key: &Label, level: usize) -> Result<Self, FrameError> {
        Ok(self.with_data(self.data.cross_section(key, level)?))
    }

    /// Pivot an index level into columns named by its labels.
    pub fn unstack(&self, level: usize) -> Result<PolarsFrame, FrameError> {
        let (data, pairs) = self.data.unstack(level)?;
        let columns = pairs.into_iter().map(|(_, label)| label).collect();
        Ok(PolarsFrame::from_parts(data, columns))
    }

    pub fn fillna(&self, value: &Scalar) -> Result<Self, FrameError> {
        Ok(self.with_data(kernels::fill_null(&self.data, value)?))
    }

    pub fn ffill(&self) -> Result<Self, FrameError> {
        Ok(self.with_data(kernels::forward_fill(&self.data)?))
    }

    pub fn dropna(&self) -> Result<Self, FrameError> {
        Ok(self.with_data(kernels::drop_nulls(&self.data)?))
    }

    pub fn head(&self, n: usize) -> Self {
        self.with_data(self.data.head(n))
    }

    pub fn tail(&self, n: usize) -> Self {
        self.with_data(self.data.tail(n))
    }

    pub fn drop(&self, keys: &[Label]) -> Result<Self, FrameError> {
        Ok(self.with_data(self.data.without_keys(keys)?))
    }

    pub fn aggregate(&self, agg: Aggregate) -> Result<Scalar, FrameError> {
        kernels::aggregate_column(self.column(), agg)
    }

    fn render(&self) -> Result<String, FrameError> {
        let keys = self.data.keys()?;
        let values = self.values()?;
        let mut out = String::new();
        for (key, value) in keys.iter().zip(&values) {
            match key {
                Label::Tuple(parts) => {
                    for part in parts {
                        out.push_str(&format!("{part}\t"));
                    }
                }
                other => out.push_str(&format!("{other}\t")),
            }
            out.push_str(&format!("{value}\n"));
        }
        let dtype = dtype_name(self.dtype());
        match &self.name {
            Some(name) => out.push_str(&format!("Name: {name}, dtype: {dtype}")),
            None => out.push_str(&format!("dtype: {dtype}")),
        }
        Ok(out)
    }
}

impl fmt::Display for PolarsSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.data.df),
        }
    }
}

impl Tabular for PolarsSeries {
    type Frame = PolarsFrame;
    type Series = PolarsSeries;

    fn invoke(&self, op: Op, args: &[Arg<PolarsFrame>]) -> Outcome<Self> {
        let a = Args::new(op, args);
        let value = match op {
            Op::Get | Op::Loc | Op::At => match a.get(0) {
                Some(Arg::Labels(keys)) => Value::Series(self.select(keys)?),
                _ => self.get(a.label(0)?)?,
            },
            Op::Iloc => Value::Scalar(self.iloc(a.position(0, self.len())?)?),
            Op::Xs => Value::Series(self.xs(a.label(0)?, a.level_or(1, 0, &self.data)?)?),
            Op::Unstack => Value::Frame(self.unstack(a.level_or(0, -1, &self.data)?)?),
            Op::FillNa => Value::Series(self.fillna(&a.scalar(0)?)?),
            Op::Ffill => Value::Series(self.ffill()?),
            Op::DropNa => Value::Series(self.dropna()?),
            Op::Head => Value::Series(self.head(a.count_or(0, 5)?)),
            Op::Tail => Value::Series(self.tail(a.count_or(0, 5)?)),
            Op::Drop => Value::Series(self.drop(&a.labels(0)?)?),
            Op::DropLevel => {
                let level = a.level_or(0, 0, &self.data)?;
                Value::Series(self.with_data(self.data.drop_levels(&[level])?))
            }
            Op::Transpose => Value::Series(self.clone()),
            Op::SortIndex => Value::Series(self.with_data(self.data.sorted()?)),
            Op::Arithmetic(op) => {
                Value::Series(self.with_data(kernels::arithmetic(&self.data, op, a.float(0)?)?))
            }
            Op::Compare(op) => {
                Value::Series(self.with_data(kernels::compare(&self.data, op, &a.scalar(0)?)?))
            }
            Op::IsIn => Value::Series(self.with_data(kernels::isin(&self.data, &a.scalars(0)?)?)),
            Op::Aggregate(agg) => Value::Scalar(self.aggregate(agg)?),
            Op::Len => Value::Count(self.len()),
            Op::Shape => Value::Shape(self.len(), 1),
            Op::Empty => Value::Bool(self.is_empty()),
            Op::Index => Value::Labels(self.data.keys()?),
            Op::Levels => Value::Labels(self.data.level_values(a.level_or(0, 0, &self.data)?)?),
            Op::Contains => Value::Bool(self.contains(a.label(0)?)),
            Op::AddPrefix
            | Op::AddSuffix
            | Op::Items
            | Op::IterRows
            | Op::Align
            | Op::Join
            | Op::Merge
            | Op::Concat
            | Op::CombineFirst
            | Op::Columns => return Err(a.invalid("not supported on a series")),
        };
        Ok(value)
    }

    fn contains(&self, key: &Label) -> bool {
        self.data.locate(key).is_ok()
    }

    fn level_contains(&self, level: usize, key: &Label) -> bool {
        self.data.level_contains(level, key)
    }

    fn has_label(&self, _axis: Axis, level: Option<usize>, key: &Label) -> bool {
        match level {
            Some(level) => self.level_contains(level, key),
            None => self.contains(key),
        }
    }

    fn key_axis(&self) -> Axis {
        Axis::Index
    }

    fn level_names(&self) -> Vec<Option<String>> {
        self.data.names()
    }

    fn len(&self) -> usize {
        self.data.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::Identity;

    fn series() -> PolarsSeries {
        let labels = [Label::from("a"), Label::from("b"), Label::from("c")];
        let values = [Scalar::Float(1.0), Scalar::Null, Scalar::Float(3.0)];
        PolarsSeries::from_labels(&labels, &values, Some(Label::from("x"))).unwrap()
    }

    #[test]
    fn get_returns_the_entry() {
        let s = series();
        assert_eq!(s.get(&Label::from("a")).unwrap(), Value::Scalar(Scalar::Float(1.0)));
        assert_eq!(
            s.get(&Label::from("z")).unwrap_err(),
            FrameError::KeyNotFound(Label::from("z"))
        );
    }

    #[test]
    fn partial_key_yields_sub_series() {
        let spy = Label::from(Identity::equity("SPY", "usa"));
        let labels = [
            Label::from((spy.clone(), Label::Int(1))),
            Label::from((spy.clone(), Label::Int(2))),
        ];
        let values = [Scalar::Float(1.0), Scalar::Float(2.0)];
        let s = PolarsSeries::from_labels(&labels, &values, None).unwrap();
        let sub = s.get(&spy).unwrap().into_series().unwrap();
        assert_eq!(sub.index_keys().unwrap(), vec![Label::Int(1), Label::Int(2)]);
    }

    #[test]
    fn display_ends_with_name_and_dtype() {
        let text = series().to_string();
        assert!(text.starts_with("a\t1\n"));
        assert!(text.ends_with("Name: x, dtype: float64"));
    }

    #[test]
    fn frame_only_operations_are_rejected() {
        let err = series().invoke(Op::Columns, &[]).unwrap_err();
        assert!(matches!(err, FrameError::InvalidArgument { .. }));
    }

    #[test]
    fn aggregate_and_drop() {
        let s = series();
        assert_eq!(s.aggregate(Aggregate::Max).unwrap(), Scalar::Float(3.0));
        let dropped = s.drop(&[Label::from("a")]).unwrap();
        assert_eq!(dropped.len(), 2);
        assert!(s.drop(&[Label::from("zz")]).is_err());
    }
}
