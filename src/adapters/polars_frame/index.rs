//! Row index over a polars `DataFrame`.
//!
//! Polars has no row labels, so index levels are stored as the leading
//! columns of the frame. Column names inside polars are positional
//! (`_level_{i}`, `_value_{j}`); the labels callers see live next to the data.

use crate::domain::error::FrameError;
use crate::domain::identity::Identity;
use crate::domain::label::Label;
use crate::domain::ops::Scalar;
use chrono::DateTime;
use polars::prelude::{
    col, BooleanChunked, Column, DataFrame, DataType, Expr, IdxCa, IdxSize, IntoColumn, IntoLazy,
    JoinArgs, JoinType, LazyFrame, NamedFrom, NewChunkedArray, PlSmallStr, Series,
    SortMultipleOptions, TimeUnit,
};
use polars::frame::UniqueKeepStrategy;
use std::collections::HashSet;

/// How the labels of one index level are stored in polars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// Unique-form strings, decoded back into identities.
    Identity,
    /// Nanosecond datetimes.
    Time,
    Int,
    Text,
}

impl LevelKind {
    /// Kind able to hold every label; `Text` when they disagree.
    pub(crate) fn infer(labels: &[Label]) -> Self {
        let mut kinds = labels.iter().map(|label| match label {
            Label::Identity(_) => LevelKind::Identity,
            Label::Time(_) => LevelKind::Time,
            Label::Int(_) => LevelKind::Int,
            Label::Text(_) | Label::Tuple(_) => LevelKind::Text,
        });
        let Some(first) = kinds.next() else {
            return LevelKind::Text;
        };
        if kinds.all(|kind| kind == first) {
            first
        } else {
            LevelKind::Text
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub name: Option<String>,
    pub kind: LevelKind,
}

impl Level {
    pub fn new(name: Option<&str>, kind: LevelKind) -> Self {
        Self {
            name: name.map(str::to_string),
            kind,
        }
    }
}

pub(crate) fn level_name(i: usize) -> PlSmallStr {
    format!("_level_{i}").into()
}

pub(crate) fn value_name(j: usize) -> PlSmallStr {
    format!("_value_{j}").into()
}

pub(crate) fn mask(keep: &[bool]) -> BooleanChunked {
    BooleanChunked::from_slice("mask".into(), keep)
}

fn missing() -> Label {
    Label::Text("NaN".into())
}

/// Encode labels as a polars column of the given kind. Labels of another
/// kind become null.
pub(crate) fn level_column(
    name: PlSmallStr,
    kind: LevelKind,
    labels: &[Label],
) -> Result<Column, FrameError> {
    let series = match kind {
        LevelKind::Identity => {
            let values: Vec<Option<String>> = labels
                .iter()
                .map(|label| label.as_identity().map(Identity::unique_id))
                .collect();
            Series::new(name, values)
        }
        LevelKind::Time => {
            let nanos: Vec<Option<i64>> = labels
                .iter()
                .map(|label| match label {
                    Label::Time(t) => t.and_utc().timestamp_nanos_opt(),
                    _ => None,
                })
                .collect();
            Series::new(name, nanos).cast(&DataType::Datetime(TimeUnit::Nanoseconds, None))?
        }
        LevelKind::Int => {
            let values: Vec<Option<i64>> = labels
                .iter()
                .map(|label| match label {
                    Label::Int(i) => Some(*i),
                    _ => None,
                })
                .collect();
            Series::new(name, values)
        }
        LevelKind::Text => {
            let values: Vec<Option<String>> =
                labels.iter().map(|label| Some(label.to_string())).collect();
            Series::new(name, values)
        }
    };
    Ok(series.into_column())
}

fn decode_level(column: &Column, kind: LevelKind) -> Result<Vec<Label>, FrameError> {
    let labels = match kind {
        LevelKind::Identity => column
            .str()?
            .into_iter()
            .map(|value| match value {
                Some(text) => text
                    .parse::<Identity>()
                    .map_or_else(|_| Label::from(text), Label::Identity),
                None => missing(),
            })
            .collect(),
        LevelKind::Time => {
            let nanos = column.cast(&DataType::Int64)?;
            nanos
                .i64()?
                .into_iter()
                .map(|value| {
                    value.map_or_else(missing, |n| {
                        Label::Time(DateTime::from_timestamp_nanos(n).naive_utc())
                    })
                })
                .collect()
        }
        LevelKind::Int => column
            .i64()?
            .into_iter()
            .map(|value| value.map_or_else(missing, Label::Int))
            .collect(),
        LevelKind::Text => column
            .str()?
            .into_iter()
            .map(|value| value.map_or_else(missing, Label::from))
            .collect(),
    };
    Ok(labels)
}

/// Index levels spelling out a list of labels: one level per tuple element
/// when every label is a tuple of the same length, a single level otherwise.
pub(crate) fn label_levels(labels: &[Label]) -> Result<(Vec<Level>, Vec<Column>), FrameError> {
    let depth = match labels.first() {
        Some(Label::Tuple(first))
            if labels
                .iter()
                .all(|label| matches!(label, Label::Tuple(parts) if parts.len() == first.len())) =>
        {
            first.len()
        }
        _ => 1,
    };
    if depth == 1 {
        let kind = LevelKind::infer(labels);
        let column = level_column(level_name(0), kind, labels)?;
        return Ok((vec![Level::new(None, kind)], vec![column]));
    }
    let mut levels = Vec::with_capacity(depth);
    let mut columns = Vec::with_capacity(depth);
    for i in 0..depth {
        let parts: Vec<Label> = labels
            .iter()
            .map(|label| match label {
                Label::Tuple(parts) => parts[i].clone(),
                other => other.clone(),
            })
            .collect();
        let kind = LevelKind::infer(&parts);
        columns.push(level_column(level_name(i), kind, &parts)?);
        levels.push(Level::new(None, kind));
    }
    Ok((levels, columns))
}

/// Values of a data column as scalars.
pub(crate) fn scalars(column: &Column) -> Result<Vec<Scalar>, FrameError> {
    let values = match column.dtype() {
        DataType::Float64 => column.f64()?.into_iter().map(Scalar::from).collect(),
        DataType::Boolean => column.bool()?.into_iter().map(Scalar::from).collect(),
        DataType::String => column.str()?.into_iter().map(Scalar::from).collect(),
        _ => {
            let floats = column.cast(&DataType::Float64)?;
            floats.f64()?.into_iter().map(Scalar::from).collect()
        }
    };
    Ok(values)
}

pub(crate) fn scalar_at(column: &Column, row: usize) -> Result<Scalar, FrameError> {
    let cell = column.slice(row as i64, 1);
    Ok(scalars(&cell)?.pop().unwrap_or_default())
}

/// Narrowest polars column holding every scalar: floats, booleans, or text
/// when kinds are mixed.
pub(crate) fn scalar_column(name: PlSmallStr, values: &[Scalar]) -> Column {
    let floats = values
        .iter()
        .all(|v| matches!(v, Scalar::Null | Scalar::Float(_)));
    let bools = values
        .iter()
        .all(|v| matches!(v, Scalar::Null | Scalar::Bool(_)));
    let series = if floats {
        Series::new(name, values.iter().map(Scalar::as_f64).collect::<Vec<_>>())
    } else if bools {
        Series::new(name, values.iter().map(Scalar::as_bool).collect::<Vec<_>>())
    } else {
        let text: Vec<Option<String>> = values
            .iter()
            .map(|v| (!v.is_null()).then(|| v.to_string()))
            .collect();
        Series::new(name, text)
    };
    series.into_column()
}

/// pandas-style dtype name, as shown when rendering a series.
pub(crate) fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::Float64 => "float64".into(),
        DataType::Int64 => "int64".into(),
        DataType::Boolean => "bool".into(),
        DataType::String => "object".into(),
        DataType::Datetime(_, _) => "datetime64[ns]".into(),
        other => other.to_string(),
    }
}

/// Rows addressed by a key.
pub(crate) struct Located {
    pub positions: Vec<usize>,
    /// Number of leading levels the key spelled out.
    pub depth: usize,
}

/// A polars frame whose leading columns are the row index.
#[derive(Debug, Clone)]
pub(crate) struct Indexed {
    pub(crate) df: DataFrame,
    pub(crate) levels: Vec<Level>,
}

impl PartialEq for Indexed {
    fn eq(&self, other: &Self) -> bool {
        self.levels == other.levels && self.df.equals_missing(&other.df)
    }
}

impl Indexed {
    /// Take ownership of `df`, renaming its columns to the positional scheme.
    pub(crate) fn new(df: DataFrame, levels: Vec<Level>) -> Result<Self, FrameError> {
        let columns = df.get_columns().to_vec();
        Self::from_columns(levels, columns)
    }

    /// Build from level columns followed by value columns.
    pub(crate) fn from_columns(
        levels: Vec<Level>,
        columns: Vec<Column>,
    ) -> Result<Self, FrameError> {
        if columns.len() < levels.len() {
            return Err(FrameError::Engine(format!(
                "{} column(s) cannot hold {} index level(s)",
                columns.len(),
                levels.len()
            )));
        }
        let nlevels = levels.len();
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(i, column)| {
                let name = if i < nlevels {
                    level_name(i)
                } else {
                    value_name(i - nlevels)
                };
                column.with_name(name)
            })
            .collect();
        Ok(Self {
            df: DataFrame::new(columns)?,
            levels,
        })
    }

    /// Same index, different value columns.
    pub(crate) fn with_values(&self, values: Vec<Column>) -> Result<Self, FrameError> {
        let mut columns = self.df.get_columns()[..self.nlevels()].to_vec();
        columns.extend(values);
        Self::from_columns(self.levels.clone(), columns)
    }

    pub(crate) fn select_values(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let values = positions
            .iter()
            .map(|&j| self.value_column(j).clone())
            .collect();
        self.with_values(values)
    }

    pub(crate) fn with_df(&self, df: DataFrame) -> Result<Self, FrameError> {
        Self::new(df, self.levels.clone())
    }

    pub(crate) fn height(&self) -> usize {
        self.df.height()
    }

    pub(crate) fn nlevels(&self) -> usize {
        self.levels.len()
    }

    /// Number of value columns.
    pub(crate) fn width(&self) -> usize {
        self.df.width() - self.nlevels()
    }

    pub(crate) fn value_column(&self, j: usize) -> &Column {
        &self.df.get_columns()[self.nlevels() + j]
    }

    pub(crate) fn names(&self) -> Vec<Option<String>> {
        self.levels.iter().map(|level| level.name.clone()).collect()
    }

    pub(crate) fn level_labels(&self, level: usize) -> Result<Vec<Label>, FrameError> {
        let nlevels = self.nlevels();
        let kind = self
            .levels
            .get(level)
            .ok_or(FrameError::LevelOutOfRange { level, nlevels })?
            .kind;
        decode_level(&self.df.get_columns()[level], kind)
    }

    /// Distinct labels of one level, sorted.
    pub(crate) fn level_values(&self, level: usize) -> Result<Vec<Label>, FrameError> {
        let mut labels = self.level_labels(level)?;
        labels.sort();
        labels.dedup();
        Ok(labels)
    }

    /// Row labels: the label itself with one level, a tuple otherwise.
    pub(crate) fn keys(&self) -> Result<Vec<Label>, FrameError> {
        let levels = (0..self.nlevels())
            .map(|i| self.level_labels(i))
            .collect::<Result<Vec<_>, _>>()?;
        if let [only] = levels.as_slice() {
            return Ok(only.clone());
        }
        Ok((0..self.height())
            .map(|row| Label::Tuple(levels.iter().map(|level| level[row].clone()).collect()))
            .collect())
    }

    pub(crate) fn level_contains(&self, level: usize, key: &Label) -> bool {
        self.level_labels(level)
            .is_ok_and(|labels| labels.contains(key))
    }

    /// Level position from an integer counting from the end when negative.
    pub(crate) fn level_position(&self, raw: i64) -> Result<usize, FrameError> {
        let nlevels = self.nlevels();
        let level = if raw < 0 { nlevels as i64 + raw } else { raw };
        if level < 0 || level as usize >= nlevels {
            return Err(FrameError::LevelOutOfRange {
                level: raw.unsigned_abs() as usize,
                nlevels,
            });
        }
        Ok(level as usize)
    }

    pub(crate) fn level_by_name(&self, name: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.name.as_deref() == Some(name))
    }

    /// Rows whose leading levels equal `key`; a tuple spells out as many
    /// levels as it has elements.
    pub(crate) fn locate(&self, key: &Label) -> Result<Located, FrameError> {
        let parts: &[Label] = match key {
            Label::Tuple(parts) if !parts.is_empty() => parts,
            other => std::slice::from_ref(other),
        };
        if parts.len() > self.nlevels() {
            return Err(FrameError::KeyNotFound(key.clone()));
        }
        let mut keep = vec![true; self.height()];
        for (level, part) in parts.iter().enumerate() {
            let labels = self.level_labels(level)?;
            for (keep, label) in keep.iter_mut().zip(&labels) {
                *keep = *keep && label == part;
            }
        }
        let positions: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(row, &keep)| keep.then_some(row))
            .collect();
        if positions.is_empty() {
            return Err(FrameError::KeyNotFound(key.clone()));
        }
        Ok(Located {
            positions,
            depth: parts.len(),
        })
    }

    /// Rows of `located`, with the levels the key spelled out removed when
    /// any remain.
    pub(crate) fn narrow(&self, located: &Located) -> Result<Self, FrameError> {
        let rows = self.take(&located.positions)?;
        if located.depth >= self.nlevels() {
            return Ok(rows);
        }
        rows.drop_levels(&(0..located.depth).collect::<Vec<_>>())
    }

    /// Rows whose `level` equals `key`, with that level removed.
    pub(crate) fn cross_section(&self, key: &Label, level: usize) -> Result<Self, FrameError> {
        let keep: Vec<bool> = self
            .level_labels(level)?
            .iter()
            .map(|label| label == key)
            .collect();
        if !keep.contains(&true) {
            return Err(FrameError::KeyNotFound(key.clone()));
        }
        let rows = self.filter(&keep)?;
        if self.nlevels() == 1 {
            return Ok(rows);
        }
        rows.drop_levels(&[level])
    }

    pub(crate) fn filter(&self, keep: &[bool]) -> Result<Self, FrameError> {
        Ok(Self {
            df: self.df.filter(&mask(keep))?,
            levels: self.levels.clone(),
        })
    }

    pub(crate) fn take(&self, positions: &[usize]) -> Result<Self, FrameError> {
        let indices = IdxCa::from_vec(
            "take".into(),
            positions.iter().map(|&p| p as IdxSize).collect(),
        );
        Ok(Self {
            df: self.df.take(&indices)?,
            levels: self.levels.clone(),
        })
    }

    pub(crate) fn head(&self, n: usize) -> Self {
        Self {
            df: self.df.head(Some(n)),
            levels: self.levels.clone(),
        }
    }

    pub(crate) fn tail(&self, n: usize) -> Self {
        Self {
            df: self.df.tail(Some(n)),
            levels: self.levels.clone(),
        }
    }

    /// Rows whose index matches any of `keys`; each key must match something.
    pub(crate) fn without_keys(&self, keys: &[Label]) -> Result<Self, FrameError> {
        let mut keep = vec![true; self.height()];
        for key in keys {
            for row in self.locate(key)?.positions {
                keep[row] = false;
            }
        }
        self.filter(&keep)
    }

    pub(crate) fn drop_levels(&self, drop: &[usize]) -> Result<Self, FrameError> {
        if drop.len() >= self.nlevels() {
            return Err(FrameError::InvalidArgument {
                op: "droplevel".into(),
                reason: "cannot remove every index level".into(),
            });
        }
        let columns = self
            .df
            .get_columns()
            .iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, column)| column.clone())
            .collect();
        let levels = self
            .levels
            .iter()
            .enumerate()
            .filter(|(i, _)| !drop.contains(i))
            .map(|(_, level)| level.clone())
            .collect();
        Self::from_columns(levels, columns)
    }

    pub(crate) fn lazy(&self) -> LazyFrame {
        self.df.clone().lazy()
    }

    pub(crate) fn level_exprs(&self) -> Vec<Expr> {
        (0..self.nlevels()).map(|i| col(level_name(i))).collect()
    }

    fn level_names(&self) -> Vec<PlSmallStr> {
        (0..self.nlevels()).map(level_name).collect()
    }

    pub(crate) fn sort_options() -> SortMultipleOptions {
        SortMultipleOptions::default().with_maintain_order(true)
    }

    pub(crate) fn sorted(&self) -> Result<Self, FrameError> {
        Ok(Self {
            df: self.df.sort(self.level_names(), Self::sort_options())?,
            levels: self.levels.clone(),
        })
    }

    /// Whether `other` has the same number and kinds of levels, so the two
    /// can be stacked or aligned.
    pub(crate) fn same_levels(&self, other: &Self) -> bool {
        self.nlevels() == other.nlevels()
            && self
                .levels
                .iter()
                .zip(&other.levels)
                .all(|(a, b)| a.kind == b.kind)
    }

    /// Pivot `level` into columns. Output columns are value-major: every
    /// label of the level for the first value column, then the second.
    pub(crate) fn unstack(&self, level: usize) -> Result<(Self, Vec<(usize, Label)>), FrameError> {
        if self.nlevels() < 2 {
            return Err(FrameError::InvalidArgument {
                op: "unstack".into(),
                reason: "index has a single level".into(),
            });
        }
        let remaining: Vec<usize> = (0..self.nlevels()).filter(|&i| i != level).collect();
        let labels = self.level_labels(level)?;
        let rest = remaining
            .iter()
            .map(|&i| self.level_labels(i))
            .collect::<Result<Vec<_>, _>>()?;
        let mut seen = HashSet::new();
        for (row, label) in labels.iter().enumerate() {
            let key: Vec<&Label> = std::iter::once(label)
                .chain(rest.iter().map(|level| &level[row]))
                .collect();
            if !seen.insert(key) {
                return Err(FrameError::DuplicateEntries);
            }
        }

        let mut distinct = labels.clone();
        distinct.sort();
        distinct.dedup();

        let on: Vec<Expr> = remaining.iter().map(|&i| col(level_name(i))).collect();
        let pivot_name = |j: usize, k: usize| format!("_pivot_{j}_{k}");
        let mut out = self
            .lazy()
            .select(on.clone())
            .unique_stable(None, UniqueKeepStrategy::First);
        for (k, key) in distinct.iter().enumerate() {
            let keep: Vec<bool> = labels.iter().map(|label| label == key).collect();
            let mut select = on.clone();
            select.extend((0..self.width()).map(|j| col(value_name(j)).alias(pivot_name(j, k))));
            let part = self.df.filter(&mask(&keep))?.lazy().select(select);
            out = out.join(part, on.clone(), on.clone(), JoinArgs::new(JoinType::Left));
        }

        let mut select = on;
        let mut pairs = Vec::with_capacity(self.width() * distinct.len());
        for j in 0..self.width() {
            for (k, key) in distinct.iter().enumerate() {
                select.push(col(pivot_name(j, k)));
                pairs.push((j, key.clone()));
            }
        }
        let sort_by: Vec<PlSmallStr> = remaining.iter().map(|&i| level_name(i)).collect();
        let df = out
            .select(select)
            .sort(sort_by, Self::sort_options())
            .collect()?;
        let levels = remaining.iter().map(|&i| self.levels[i].clone()).collect();
        Ok((Self::new(df, levels)?, pairs))
    }
}
