//! Labelled columns over a (possibly multi-level) row index.

use super::args::{Args, Rows};
use super::index::{
    label_levels, level_column, level_name, scalar_at, scalar_column, scalars, value_name,
    Indexed, Level, LevelKind,
};
use super::kernels;
use super::series::PolarsSeries;
use super::EngineValue;
use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Aggregate, Arg, Axis, Op, Scalar, Value};
use crate::domain::table_builder::{CanonicalTable, ColumnData, SYMBOL_LEVEL, TIME_LEVEL};
use crate::ports::tabular_port::{Outcome, Tabular, TableEngine};
use polars::prelude::{
    col, concat, Column, DataFrame, Expr, IntoColumn, IntoLazy, JoinArgs, JoinType, LazyFrame,
    NamedFrom, PlSmallStr, Series, UnionArgs,
};
use polars::frame::UniqueKeepStrategy;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct PolarsFrame {
    data: Indexed,
    columns: Vec<Label>,
}

fn right_name(j: usize) -> PlSmallStr {
    format!("_right_{j}").into()
}

fn out_name(j: usize) -> PlSmallStr {
    format!("_out_{j}").into()
}

fn suffixed(label: &Label, suffix: &str) -> Label {
    Label::Text(format!("{label}{suffix}"))
}

impl TableEngine for PolarsFrame {
    fn from_canonical(table: CanonicalTable) -> Result<Self, FrameError> {
        let symbols: Vec<Label> = table.identities.into_iter().map(Label::Identity).collect();
        let times: Vec<Label> = table.times.into_iter().map(Label::Time).collect();
        let mut columns = vec![
            level_column(level_name(0), LevelKind::Identity, &symbols)?,
            level_column(level_name(1), LevelKind::Time, &times)?,
        ];
        let mut labels = Vec::with_capacity(table.columns.len());
        for (name, data) in table.columns {
            let series = match data {
                ColumnData::Float(values) => Series::new(name.as_str().into(), values),
                ColumnData::Text(values) => Series::new(name.as_str().into(), values),
            };
            columns.push(series.into_column());
            labels.push(Label::Text(name));
        }
        let levels = vec![
            Level::new(Some(SYMBOL_LEVEL), LevelKind::Identity),
            Level::new(Some(TIME_LEVEL), LevelKind::Time),
        ];
        Ok(Self::from_parts(Indexed::from_columns(levels, columns)?, labels))
    }
}

impl PolarsFrame {
    pub(crate) fn from_parts(data: Indexed, columns: Vec<Label>) -> Self {
        debug_assert_eq!(data.width(), columns.len());
        Self { data, columns }
    }

    fn with_data(&self, data: Indexed) -> Self {
        Self::from_parts(data, self.columns.clone())
    }

    pub fn columns(&self) -> &[Label] {
        &self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.len(), self.columns.len())
    }

    pub fn index_keys(&self) -> Result<Vec<Label>, FrameError> {
        self.data.keys()
    }

    /// The polars frame underneath, index levels first.
    pub fn polars(&self) -> &DataFrame {
        &self.data.df
    }

    fn position(&self, key: &Label) -> Option<usize> {
        self.columns.iter().position(|label| label == key)
    }

    /// Tuple columns whose first element is `key`.
    fn group(&self, key: &Label) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, label)| matches!(label, Label::Tuple(parts) if parts.first() == Some(key)))
            .map(|(j, _)| j)
            .collect()
    }

    fn series_at(&self, j: usize) -> Result<PolarsSeries, FrameError> {
        let data = self.data.select_values(&[j])?;
        Ok(PolarsSeries::from_parts(data, Some(self.columns[j].clone())))
    }

    /// Column by label; a tuple prefix selects the sub-frame below it.
    pub fn get(&self, key: &Label) -> Result<EngineValue, FrameError> {
        if let Some(j) = self.position(key) {
            return Ok(Value::Series(self.series_at(j)?));
        }
        let group = self.group(key);
        if group.is_empty() {
            return Err(FrameError::KeyNotFound(key.clone()));
        }
        let labels = group
            .iter()
            .map(|&j| match &self.columns[j] {
                Label::Tuple(parts) if parts.len() == 2 => parts[1].clone(),
                Label::Tuple(parts) => Label::Tuple(parts[1..].to_vec()),
                other => other.clone(),
            })
            .collect();
        Ok(Value::Frame(Self::from_parts(self.data.select_values(&group)?, labels)))
    }

    pub fn select(&self, keys: &[Label]) -> Result<Self, FrameError> {
        let positions = keys
            .iter()
            .map(|key| {
                self.position(key)
                    .ok_or_else(|| FrameError::KeyNotFound(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let data = self.data.select_values(&positions)?;
        Ok(Self::from_parts(data, keys.to_vec()))
    }

    /// Rows under an index key: one row as a series, several as a frame.
    pub fn loc(&self, key: &Label) -> Result<EngineValue, FrameError> {
        let found = self.data.locate(key)?;
        if found.depth == self.data.nlevels() {
            if let &[row] = found.positions.as_slice() {
                return Ok(Value::Series(self.row(row)?));
            }
        }
        Ok(Value::Frame(self.with_data(self.data.narrow(&found)?)))
    }

    /// Two-axis selection: rows, then one column of them. A full row key
    /// reads the cell itself, keeping the column's dtype.
    fn loc_column(&self, rows: Rows<'_>, column: &Label) -> Result<EngineValue, FrameError> {
        let Rows::Key(key) = rows else {
            return self.get(column);
        };
        let found = self.data.locate(key)?;
        if found.depth == self.data.nlevels() {
            if let &[row] = found.positions.as_slice() {
                let j = self
                    .position(column)
                    .ok_or_else(|| FrameError::KeyNotFound(column.clone()))?;
                return Ok(Value::Scalar(scalar_at(self.data.value_column(j), row)?));
            }
        }
        self.with_data(self.data.narrow(&found)?).get(column)
    }

    /// One row as a series indexed by the column labels.
    pub fn row(&self, position: usize) -> Result<PolarsSeries, FrameError> {
        let values = (0..self.columns.len())
            .map(|j| scalar_at(self.data.value_column(j), position))
            .collect::<Result<Vec<_>, _>>()?;
        let name = self.data.keys()?.get(position).cloned();
        PolarsSeries::from_labels(&self.columns, &values, name)
    }

    pub fn xs(&self, key: &Label, level: usize) -> Result<Self, FrameError> {
        Ok(self.with_data(self.data.cross_section(key, level)?))
    }

    /// Pivot an index level into the columns; labels become
    /// `(column, level label)` tuples.
    pub fn unstack(&self, level: usize) -> Result<Self, FrameError> {
        let (data, pairs) = self.data.unstack(level)?;
        let columns = pairs
            .into_iter()
            .map(|(j, label)| Label::Tuple(vec![self.columns[j].clone(), label]))
            .collect();
        Ok(Self::from_parts(data, columns))
    }

    /// Swap rows and columns. Rows mixing dtypes become text columns.
    pub fn transpose(&self) -> Result<Self, FrameError> {
        let keys = self.data.keys()?;
        let cells = (0..self.columns.len())
            .map(|j| scalars(self.data.value_column(j)))
            .collect::<Result<Vec<_>, _>>()?;
        let (levels, mut columns) = label_levels(&self.columns)?;
        for row in 0..keys.len() {
            let values: Vec<Scalar> = cells.iter().map(|column| column[row].clone()).collect();
            columns.push(scalar_column(value_name(row), &values));
        }
        Ok(Self::from_parts(Indexed::from_columns(levels, columns)?, keys))
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

    fn relabel(&self, f: impl Fn(&Label) -> Label) -> Self {
        Self::from_parts(self.data.clone(), self.columns.iter().map(f).collect())
    }

    pub fn drop(&self, keys: &[Label], axis: Axis) -> Result<Self, FrameError> {
        match axis {
            Axis::Index => Ok(self.with_data(self.data.without_keys(keys)?)),
            Axis::Columns => {
                let mut dropped = Vec::new();
                for key in keys {
                    let hits = match self.position(key) {
                        Some(j) => vec![j],
                        None => self.group(key),
                    };
                    if hits.is_empty() {
                        return Err(FrameError::KeyNotFound(key.clone()));
                    }
                    dropped.extend(hits);
                }
                let kept: Vec<usize> = (0..self.columns.len())
                    .filter(|j| !dropped.contains(j))
                    .collect();
                let labels = kept.iter().map(|&j| self.columns[j].clone()).collect();
                Ok(Self::from_parts(self.data.select_values(&kept)?, labels))
            }
        }
    }

    /// Per-column reduction, as a series indexed by column label. Columns
    /// that cannot be reduced numerically are left out.
    pub fn aggregate(&self, agg: Aggregate) -> Result<PolarsSeries, FrameError> {
        let mut labels = Vec::new();
        let mut values = Vec::new();
        for (j, label) in self.columns.iter().enumerate() {
            match kernels::aggregate_column(self.data.value_column(j), agg) {
                Ok(value) => {
                    labels.push(label.clone());
                    values.push(value);
                }
                Err(FrameError::TypeMismatch { .. }) => continue,
                Err(err) => return Err(err),
            }
        }
        PolarsSeries::from_labels(&labels, &values, None)
    }

    /// `(column label, column)` pairs.
    pub fn items(&self) -> Result<Vec<(Label, PolarsSeries)>, FrameError> {
        (0..self.columns.len())
            .map(|j| Ok((self.columns[j].clone(), self.series_at(j)?)))
            .collect()
    }

    /// `(row key, row)` pairs.
    pub fn iterrows(&self) -> Result<Vec<(Label, PolarsSeries)>, FrameError> {
        let keys = self.data.keys()?;
        keys.into_iter()
            .enumerate()
            .map(|(row, key)| Ok((key, self.row(row)?)))
            .collect()
    }

    fn require_same_levels(&self, other: &Self, op: Op) -> Result<(), FrameError> {
        if self.data.same_levels(&other.data) {
            return Ok(());
        }
        Err(FrameError::InvalidArgument {
            op: op.name().into(),
            reason: "frames have incompatible row indexes".into(),
        })
    }

    /// Distinct index keys of both frames.
    fn union_keys(&self, other: &Self, op: Op) -> Result<LazyFrame, FrameError> {
        self.require_same_levels(other, op)?;
        let on = self.data.level_exprs();
        let both = concat(
            vec![
                self.data.lazy().select(on.clone()),
                other.data.lazy().select(on),
            ],
            UnionArgs::default(),
        )?;
        Ok(both.unique_stable(None, UniqueKeepStrategy::First))
    }

    fn sort_by_levels(&self, frame: LazyFrame) -> LazyFrame {
        let by: Vec<PlSmallStr> = (0..self.data.nlevels()).map(level_name).collect();
        frame.sort(by, Indexed::sort_options())
    }

    /// Both frames reindexed to the sorted union of their row keys.
    pub fn align(&self, other: &Self) -> Result<(Self, Self), FrameError> {
        let keys = self.union_keys(other, Op::Align)?;
        let on = self.data.level_exprs();
        let reindex = |frame: &Self| -> Result<Self, FrameError> {
            let joined = keys.clone().join(
                frame.data.lazy(),
                on.clone(),
                on.clone(),
                JoinArgs::new(JoinType::Left),
            );
            let df = self.sort_by_levels(joined).collect()?;
            Ok(frame.with_data(frame.data.with_df(df)?))
        };
        Ok((reindex(self)?, reindex(other)?))
    }

    /// Nulls in this frame patched from `other`, over the union of rows and
    /// columns.
    pub fn combine_first(&self, other: &Self) -> Result<Self, FrameError> {
        let keys = self.union_keys(other, Op::CombineFirst)?;
        let on = self.data.level_exprs();
        let mut right = on.clone();
        right.extend((0..other.columns.len()).map(|j| col(value_name(j)).alias(right_name(j))));
        let joined = keys
            .join(self.data.lazy(), on.clone(), on.clone(), JoinArgs::new(JoinType::Left))
            .join(
                other.data.lazy().select(right),
                on.clone(),
                on.clone(),
                JoinArgs::new(JoinType::Left),
            );

        let mut labels = self.columns.clone();
        labels.extend(
            other
                .columns
                .iter()
                .filter(|label| !self.columns.contains(label))
                .cloned(),
        );
        let mut select = on;
        for (j, label) in labels.iter().enumerate() {
            let expr = match (self.position(label), other.position(label)) {
                (Some(mine), Some(theirs)) => {
                    col(value_name(mine)).fill_null(col(right_name(theirs)))
                }
                (Some(mine), None) => col(value_name(mine)),
                (None, Some(theirs)) => col(right_name(theirs)),
                (None, None) => continue,
            };
            select.push(expr.alias(out_name(j)));
        }
        let df = self.sort_by_levels(joined.select(select)).collect()?;
        Ok(Self::from_parts(self.data.with_df(df)?, labels))
    }

    /// Left join of `other`'s columns on the index levels the two frames
    /// share by name, or on every level when neither is named. Row order of
    /// this frame is kept.
    pub fn join(&self, other: &Self, lsuffix: &str, rsuffix: &str) -> Result<Self, FrameError> {
        let invalid = |reason: String| FrameError::InvalidArgument {
            op: "join".into(),
            reason,
        };
        let mut pairs: Vec<(usize, usize)> = self
            .data
            .levels
            .iter()
            .enumerate()
            .filter_map(|(i, level)| {
                let name = level.name.as_deref()?;
                other.data.level_by_name(name).map(|k| (i, k))
            })
            .collect();
        if pairs.is_empty() && self.data.same_levels(&other.data) {
            pairs = (0..self.data.nlevels()).map(|i| (i, i)).collect();
        }
        if pairs.is_empty() {
            return Err(invalid("no index level in common".into()));
        }

        let overlap: Vec<&Label> = self
            .columns
            .iter()
            .filter(|label| other.columns.contains(label))
            .collect();
        if !overlap.is_empty() && lsuffix.is_empty() && rsuffix.is_empty() {
            let names: Vec<String> = overlap.iter().map(ToString::to_string).collect();
            return Err(invalid(format!(
                "columns overlap but no suffix specified: [{}]",
                names.join(", ")
            )));
        }

        let on: Vec<Expr> = pairs.iter().map(|&(i, _)| col(level_name(i))).collect();
        let mut right: Vec<Expr> = pairs
            .iter()
            .map(|&(i, k)| col(level_name(k)).alias(level_name(i)))
            .collect();
        right.extend((0..other.columns.len()).map(|j| col(value_name(j)).alias(right_name(j))));

        let mut select = self.data.level_exprs();
        select.extend((0..self.columns.len()).map(|j| col(value_name(j))));
        select.extend((0..other.columns.len()).map(|j| col(right_name(j))));
        let df = self
            .data
            .lazy()
            .with_row_index("_order", None)
            .join(
                other.data.lazy().select(right),
                on.clone(),
                on,
                JoinArgs::new(JoinType::Left),
            )
            .sort(["_order"], Indexed::sort_options())
            .select(select)
            .collect()?;

        let rename = |label: &Label, suffix: &str| {
            if overlap.contains(&label) {
                suffixed(label, suffix)
            } else {
                label.clone()
            }
        };
        let mut labels: Vec<Label> = self.columns.iter().map(|l| rename(l, lsuffix)).collect();
        labels.extend(other.columns.iter().map(|l| rename(l, rsuffix)));
        Ok(Self::from_parts(self.data.with_df(df)?, labels))
    }

    /// Database-style merge on named index levels. The result is indexed by
    /// those levels, sorted; overlapping columns get `_x` and `_y`.
    pub fn merge(&self, other: &Self, on: &[String], how: &str) -> Result<Self, FrameError> {
        let (left_how, right_how) = match how {
            "inner" => (JoinType::Inner, JoinType::Inner),
            "left" => (JoinType::Inner, JoinType::Left),
            "right" => (JoinType::Left, JoinType::Inner),
            "outer" => (JoinType::Left, JoinType::Left),
            other => {
                return Err(FrameError::InvalidArgument {
                    op: "merge".into(),
                    reason: format!("unknown join type {other:?}"),
                });
            }
        };
        let mut levels = Vec::with_capacity(on.len());
        let mut left_keys = Vec::with_capacity(on.len());
        let mut right_keys = Vec::with_capacity(on.len());
        for (n, name) in on.iter().enumerate() {
            let missing = || FrameError::KeyNotFound(Label::Text(name.clone()));
            let i = self.data.level_by_name(name).ok_or_else(missing)?;
            let k = other.data.level_by_name(name).ok_or_else(missing)?;
            levels.push(self.data.levels[i].clone());
            left_keys.push(col(level_name(i)).alias(level_name(n)));
            right_keys.push(col(level_name(k)).alias(level_name(n)));
        }
        let key_exprs: Vec<Expr> = (0..on.len()).map(|n| col(level_name(n))).collect();

        let mut left = left_keys.clone();
        left.extend((0..self.columns.len()).map(|j| col(value_name(j))));
        let mut right = right_keys.clone();
        right.extend((0..other.columns.len()).map(|j| col(value_name(j)).alias(right_name(j))));

        let keys = concat(
            vec![
                self.data.lazy().select(left_keys),
                other.data.lazy().select(right_keys),
            ],
            UnionArgs::default(),
        )?
        .unique_stable(None, UniqueKeepStrategy::First);
        let joined = keys
            .join(
                self.data.lazy().select(left),
                key_exprs.clone(),
                key_exprs.clone(),
                JoinArgs::new(left_how),
            )
            .join(
                other.data.lazy().select(right),
                key_exprs.clone(),
                key_exprs.clone(),
                JoinArgs::new(right_how),
            );
        let mut select = key_exprs;
        select.extend((0..self.columns.len()).map(|j| col(value_name(j))));
        select.extend((0..other.columns.len()).map(|j| col(right_name(j))));
        let by: Vec<PlSmallStr> = (0..on.len()).map(level_name).collect();
        let df = joined
            .select(select)
            .sort(by, Indexed::sort_options())
            .collect()?;

        let rename = |label: &Label, suffix: &str, theirs: &[Label]| {
            if theirs.contains(label) {
                suffixed(label, suffix)
            } else {
                label.clone()
            }
        };
        let mut labels: Vec<Label> = self
            .columns
            .iter()
            .map(|l| rename(l, "_x", &other.columns))
            .collect();
        labels.extend(other.columns.iter().map(|l| rename(l, "_y", &self.columns)));
        Ok(Self::from_parts(Indexed::new(df, levels)?, labels))
    }

    /// Rows of `others` stacked under this frame. Columns are the union, in
    /// order of first appearance; cells a frame lacks are null.
    pub fn concat(&self, others: &[&Self]) -> Result<Self, FrameError> {
        let frames: Vec<&Self> = std::iter::once(self).chain(others.iter().copied()).collect();
        let mut labels = self.columns.clone();
        for frame in &frames[1..] {
            self.require_same_levels(frame, Op::Concat)?;
            for label in &frame.columns {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }
        let dtypes: Vec<_> = labels
            .iter()
            .filter_map(|label| {
                frames.iter().find_map(|frame| {
                    let j = frame.position(label)?;
                    Some(frame.data.value_column(j).dtype().clone())
                })
            })
            .collect();

        let mut parts = Vec::with_capacity(frames.len());
        for frame in &frames {
            let height = frame.data.height();
            let levels = &frame.data.df.get_columns()[..frame.data.nlevels()];
            let mut columns: Vec<Column> = levels.to_vec();
            for (j, (label, dtype)) in labels.iter().zip(&dtypes).enumerate() {
                let column = match frame.position(label) {
                    Some(p) => frame.data.value_column(p).clone().with_name(out_name(j)),
                    None => Column::full_null(out_name(j), height, dtype),
                };
                columns.push(column);
            }
            parts.push(DataFrame::new(columns)?.lazy());
        }
        let df = concat(parts, UnionArgs::default())?.collect()?;
        Ok(Self::from_parts(self.data.with_df(df)?, labels))
    }

    fn render(&self) -> Result<String, FrameError> {
        let mut out = String::new();
        let header: Vec<String> = self
            .data
            .names()
            .into_iter()
            .map(Option::unwrap_or_default)
            .chain(self.columns.iter().map(ToString::to_string))
            .collect();
        out.push_str(&header.join("\t"));
        let keys = self.data.keys()?;
        let cells = (0..self.columns.len())
            .map(|j| scalars(self.data.value_column(j)))
            .collect::<Result<Vec<_>, _>>()?;
        for (row, key) in keys.iter().enumerate() {
            let mut line: Vec<String> = match key {
                Label::Tuple(parts) => parts.iter().map(ToString::to_string).collect(),
                other => vec![other.to_string()],
            };
            line.extend(cells.iter().map(|column| column[row].to_string()));
            out.push('\n');
            out.push_str(&line.join("\t"));
        }
        if keys.is_empty() {
            out.push_str(&format!("\n[0 rows x {} columns]", self.columns.len()));
        }
        Ok(out)
    }
}

impl fmt::Display for PolarsFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.data.df),
        }
    }
}

impl Tabular for PolarsFrame {
    type Frame = PolarsFrame;
    type Series = PolarsSeries;

    fn invoke(&self, op: Op, args: &[Arg<PolarsFrame>]) -> Outcome<Self> {
        let a = Args::new(op, args);
        let data = &self.data;
        let value = match op {
            Op::Get => match a.get(0) {
                Some(Arg::Labels(keys)) => Value::Frame(self.select(keys)?),
                _ => self.get(a.label(0)?)?,
            },
            Op::Loc if a.get(1).is_none() => self.loc(a.label(0)?)?,
            Op::Loc | Op::At => self.loc_column(a.rows(0)?, a.label(1)?)?,
            Op::Iloc => Value::Series(self.row(a.position(0, self.len())?)?),
            Op::Xs => Value::Frame(self.xs(a.label(0)?, a.level_or(1, 0, data)?)?),
            Op::Unstack => Value::Frame(self.unstack(a.level_or(0, -1, data)?)?),
            Op::FillNa => Value::Frame(self.fillna(&a.scalar(0)?)?),
            Op::Ffill => Value::Frame(self.ffill()?),
            Op::DropNa => Value::Frame(self.dropna()?),
            Op::Head => Value::Frame(self.head(a.count_or(0, 5)?)),
            Op::Tail => Value::Frame(self.tail(a.count_or(0, 5)?)),
            Op::AddPrefix => {
                let prefix = a.text(0)?;
                Value::Frame(self.relabel(|l| Label::Text(format!("{prefix}{l}"))))
            }
            Op::AddSuffix => {
                let suffix = a.text(0)?;
                Value::Frame(self.relabel(|l| suffixed(l, suffix)))
            }
            Op::Drop => Value::Frame(self.drop(&a.labels(0)?, a.axis(1)?)?),
            Op::DropLevel => {
                let level = a.level_or(0, 0, data)?;
                Value::Frame(self.with_data(data.drop_levels(&[level])?))
            }
            Op::Transpose => Value::Frame(self.transpose()?),
            Op::SortIndex => Value::Frame(self.with_data(data.sorted()?)),
            Op::Arithmetic(op) => {
                Value::Frame(self.with_data(kernels::arithmetic(data, op, a.float(0)?)?))
            }
            Op::Compare(op) => {
                Value::Frame(self.with_data(kernels::compare(data, op, &a.scalar(0)?)?))
            }
            Op::IsIn => Value::Frame(self.with_data(kernels::isin(data, &a.scalars(0)?)?)),
            Op::Aggregate(agg) => Value::Series(self.aggregate(agg)?),
            Op::Items => Value::Entries(self.items()?),
            Op::IterRows => Value::Entries(self.iterrows()?),
            Op::Align => {
                let (left, right) = self.align(a.frame(0)?)?;
                Value::Frames(vec![left, right])
            }
            Op::Join => {
                let (lsuffix, rsuffix) = (a.text_or(1, "")?, a.text_or(2, "")?);
                Value::Frame(self.join(a.frame(0)?, lsuffix, rsuffix)?)
            }
            Op::Merge => {
                let on = a.names(1)?;
                Value::Frame(self.merge(a.frame(0)?, &on, a.text_or(2, "inner")?)?)
            }
            Op::Concat => Value::Frame(self.concat(&a.frames(0)?)?),
            Op::CombineFirst => Value::Frame(self.combine_first(a.frame(0)?)?),
            Op::Len => Value::Count(self.len()),
            Op::Shape => {
                let (rows, columns) = self.shape();
                Value::Shape(rows, columns)
            }
            Op::Empty => Value::Bool(self.is_empty() || self.columns.is_empty()),
            Op::Columns => Value::Labels(self.columns.clone()),
            Op::Index => Value::Labels(data.keys()?),
            Op::Levels => Value::Labels(data.level_values(a.level_or(0, 0, data)?)?),
            Op::Contains => Value::Bool(self.contains(a.label(0)?)),
        };
        Ok(value)
    }

    fn contains(&self, key: &Label) -> bool {
        self.position(key).is_some() || !self.group(key).is_empty()
    }

    fn level_contains(&self, level: usize, key: &Label) -> bool {
        self.data.level_contains(level, key)
    }

    fn has_label(&self, axis: Axis, level: Option<usize>, key: &Label) -> bool {
        match (axis, level) {
            (Axis::Columns, _) => self.contains(key),
            (Axis::Index, Some(level)) => self.level_contains(level, key),
            (Axis::Index, None) => self.data.locate(key).is_ok(),
        }
    }

    fn key_axis(&self) -> Axis {
        Axis::Columns
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
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 10, 7)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn spy() -> Identity {
        Identity::equity("SPY", "usa")
    }

    fn aapl() -> Identity {
        Identity::equity("AAPL", "usa")
    }

    /// SPY at :31 and :32, AAPL at :31; `lastprice` and `exchange`.
    fn quotes() -> PolarsFrame {
        let table = CanonicalTable {
            identities: vec![aapl(), spy(), spy()],
            times: vec![at(31), at(31), at(32)],
            columns: vec![
                (
                    "lastprice".into(),
                    ColumnData::Float(vec![Some(50.0), Some(101.0), None]),
                ),
                (
                    "exchange".into(),
                    ColumnData::Text(vec![Some("Q".into()), Some("P".into()), Some("P".into())]),
                ),
            ],
        };
        PolarsFrame::from_canonical(table).unwrap()
    }

    fn text(name: &str) -> Label {
        Label::from(name)
    }

    fn floats(series: &PolarsSeries) -> Vec<Scalar> {
        series.values().unwrap()
    }

    #[test]
    fn canonical_table_keeps_levels_and_columns() {
        let frame = quotes();
        assert_eq!(frame.shape(), (3, 2));
        assert_eq!(frame.level_names(), vec![Some("symbol".into()), Some("time".into())]);
        assert_eq!(frame.columns(), &[text("lastprice"), text("exchange")]);
        assert!(frame.to_string().starts_with("symbol\ttime\tlastprice\texchange"));
        assert!(frame.to_string().contains("SPY\t2013-10-07 09:31:00\t101\tP"));
    }

    #[test]
    fn loc_by_symbol_drops_the_symbol_level() {
        let frame = quotes();
        let spy_rows = frame.loc(&Label::from(spy())).unwrap().into_frame().unwrap();
        assert_eq!(spy_rows.level_names(), vec![Some("time".into())]);
        assert_eq!(spy_rows.len(), 2);
        let err = frame.loc(&text("SPY")).unwrap_err();
        assert_eq!(err, FrameError::KeyNotFound(text("SPY")));
    }

    #[test]
    fn loc_with_row_and_column_reads_a_cell() {
        let frame = quotes();
        let key = Label::from((spy(), at(31)));
        let value = frame
            .invoke(Op::At, &[Arg::Label(key), Arg::label("exchange")])
            .unwrap();
        assert_eq!(value, Value::Scalar(Scalar::from("P")));
        let column = frame
            .invoke(Op::Loc, &[Arg::All, Arg::label("lastprice")])
            .unwrap()
            .into_series()
            .unwrap();
        assert_eq!(column.len(), 3);
    }

    #[test]
    fn unstack_then_transpose() {
        let prices = quotes().select(&[text("lastprice")]).unwrap();
        let wide = prices.unstack(0).unwrap();
        assert_eq!(
            wide.columns(),
            &[
                Label::Tuple(vec![text("lastprice"), Label::from(aapl())]),
                Label::Tuple(vec![text("lastprice"), Label::from(spy())]),
            ]
        );
        let by_symbol = wide.get(&text("lastprice")).unwrap().into_frame().unwrap();
        assert_eq!(by_symbol.columns(), &[Label::from(aapl()), Label::from(spy())]);
        let tall = by_symbol.transpose().unwrap();
        assert_eq!(tall.index_keys().unwrap(), vec![Label::from(aapl()), Label::from(spy())]);
        assert_eq!(tall.columns(), &[Label::Time(at(31)), Label::Time(at(32))]);
    }

    #[test]
    fn transposing_mixed_rows_gives_text() {
        let row = quotes().transpose().unwrap();
        let first = row.get(&Label::from((aapl(), at(31)))).unwrap();
        let first = first.into_series().unwrap();
        assert_eq!(floats(&first), vec![Scalar::from("50"), Scalar::from("Q")]);
    }

    #[test]
    fn ne_is_true_for_missing_prices() {
        let prices = quotes().select(&[text("lastprice")]).unwrap();
        let ne = prices
            .invoke(Op::Compare(crate::domain::ops::Comparison::Ne), &[Arg::from(101.0)])
            .unwrap()
            .into_frame()
            .unwrap();
        let flags = ne.get(&text("lastprice")).unwrap().into_series().unwrap();
        assert_eq!(
            floats(&flags),
            vec![Scalar::Bool(true), Scalar::Bool(false), Scalar::Bool(true)]
        );
    }

    #[test]
    fn drop_reports_the_first_missing_label() {
        let frame = quotes();
        let err = frame
            .drop(&[Label::from(spy()), text("MSFT")], Axis::Index)
            .unwrap_err();
        assert_eq!(err, FrameError::KeyNotFound(text("MSFT")));
        let kept = frame.drop(&[Label::from(spy())], Axis::Index).unwrap();
        assert_eq!(kept.len(), 1);
        let narrow = frame.drop(&[text("exchange")], Axis::Columns).unwrap();
        assert_eq!(narrow.columns(), &[text("lastprice")]);
    }

    #[test]
    fn aggregate_skips_text_columns() {
        let sums = quotes().aggregate(Aggregate::Sum).unwrap();
        assert_eq!(sums.index_keys().unwrap(), vec![text("lastprice")]);
        assert_eq!(floats(&sums), vec![Scalar::Float(151.0)]);
        let counts = quotes().aggregate(Aggregate::Count).unwrap();
        assert_eq!(floats(&counts), vec![Scalar::Float(2.0), Scalar::Float(3.0)]);
    }

    #[test]
    fn items_and_iterrows() {
        let frame = quotes();
        let items = frame.items().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].0, text("exchange"));
        let rows = frame.iterrows().unwrap();
        assert_eq!(rows[0].0, Label::from((aapl(), at(31))));
        assert_eq!(floats(&rows[0].1), vec![Scalar::from("50"), Scalar::from("Q")]);
    }

    #[test]
    fn xs_by_level_name() {
        let frame = quotes();
        let at_31 = frame
            .invoke(Op::Xs, &[Arg::Label(Label::Time(at(31))), Arg::text("time")])
            .unwrap()
            .into_frame()
            .unwrap();
        assert_eq!(at_31.index_keys().unwrap(), vec![Label::from(aapl()), Label::from(spy())]);
        let err = frame
            .invoke(Op::Xs, &[Arg::Label(Label::Time(at(31))), Arg::text("venue")])
            .unwrap_err();
        assert_eq!(err, FrameError::KeyNotFound(text("venue")));
    }

    #[test]
    fn concat_fills_missing_columns() {
        let frame = quotes();
        let prices = frame.select(&[text("lastprice")]).unwrap();
        let venues = frame.select(&[text("exchange")]).unwrap();
        let stacked = prices.concat(&[&venues]).unwrap();
        assert_eq!(stacked.shape(), (6, 2));
        let last = stacked.get(&text("lastprice")).unwrap().into_series().unwrap();
        assert_eq!(floats(&last)[5], Scalar::Null);
    }

    #[test]
    fn align_reindexes_both_sides() {
        let frame = quotes();
        let spy_only = frame.drop(&[Label::from(aapl())], Axis::Index).unwrap();
        let (left, right) = spy_only.align(&frame).unwrap();
        assert_eq!(left.len(), 3);
        assert_eq!(left.index_keys().unwrap(), right.index_keys().unwrap());
        let prices = left.get(&text("lastprice")).unwrap().into_series().unwrap();
        assert_eq!(floats(&prices)[0], Scalar::Null);
    }

    #[test]
    fn combine_first_patches_nulls() {
        let frame = quotes();
        let patch = frame.fillna(&Scalar::Float(0.0)).unwrap();
        let combined = frame.combine_first(&patch).unwrap();
        let prices = combined.get(&text("lastprice")).unwrap().into_series().unwrap();
        assert_eq!(
            floats(&prices),
            vec![Scalar::Float(50.0), Scalar::Float(101.0), Scalar::Float(0.0)]
        );
    }

    #[test]
    fn join_requires_suffixes_on_overlap() {
        let frame = quotes();
        let err = frame.join(&frame, "", "").unwrap_err();
        assert!(matches!(err, FrameError::InvalidArgument { .. }));
        let joined = frame.join(&frame, "_l", "_r").unwrap();
        assert_eq!(joined.columns()[0], text("lastprice_l"));
        assert_eq!(joined.columns()[2], text("lastprice_r"));
        assert_eq!(joined.index_keys().unwrap(), frame.index_keys().unwrap());
    }

    #[test]
    fn merge_on_symbol_suffixes_overlap() {
        let frame = quotes();
        let prices = frame.select(&[text("lastprice")]).unwrap();
        let merged = prices
            .merge(&frame, &["symbol".to_string(), "time".to_string()], "inner")
            .unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged.columns(),
            &[text("lastprice_x"), text("lastprice_y"), text("exchange")]
        );
        let err = prices.merge(&frame, &["venue".to_string()], "inner").unwrap_err();
        assert_eq!(err, FrameError::KeyNotFound(text("venue")));
    }
}
