//! Operation vocabulary shared by engine frames, engine series and anything
//! wrapping them.

use crate::domain::error::FrameError;
use crate::domain::label::Label;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Scalar {
    #[default]
    Null,
    Float(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("NaN"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
    Ne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Index,
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Loc,
    At,
    Iloc,
    Xs,
    Unstack,
    FillNa,
    Ffill,
    DropNa,
    Head,
    Tail,
    AddPrefix,
    AddSuffix,
    Drop,
    DropLevel,
    Transpose,
    SortIndex,
    Arithmetic(Arithmetic),
    Compare(Comparison),
    Aggregate(Aggregate),
    IsIn,
    Items,
    IterRows,
    Align,
    Join,
    Merge,
    Concat,
    CombineFirst,
    Len,
    Shape,
    Empty,
    Columns,
    Index,
    Levels,
    Contains,
}

/// Every operation with its canonical name, then aliases.
const NAMES: &[(&str, Op)] = &[
    ("get", Op::Get),
    ("loc", Op::Loc),
    ("at", Op::At),
    ("iloc", Op::Iloc),
    ("xs", Op::Xs),
    ("unstack", Op::Unstack),
    ("fillna", Op::FillNa),
    ("ffill", Op::Ffill),
    ("dropna", Op::DropNa),
    ("head", Op::Head),
    ("tail", Op::Tail),
    ("add_prefix", Op::AddPrefix),
    ("add_suffix", Op::AddSuffix),
    ("drop", Op::Drop),
    ("droplevel", Op::DropLevel),
    ("transpose", Op::Transpose),
    ("sort_index", Op::SortIndex),
    ("add", Op::Arithmetic(Arithmetic::Add)),
    ("sub", Op::Arithmetic(Arithmetic::Sub)),
    ("mul", Op::Arithmetic(Arithmetic::Mul)),
    ("div", Op::Arithmetic(Arithmetic::Div)),
    ("gt", Op::Compare(Comparison::Gt)),
    ("ge", Op::Compare(Comparison::Ge)),
    ("lt", Op::Compare(Comparison::Lt)),
    ("le", Op::Compare(Comparison::Le)),
    ("eq", Op::Compare(Comparison::Eq)),
    ("ne", Op::Compare(Comparison::Ne)),
    ("sum", Op::Aggregate(Aggregate::Sum)),
    ("mean", Op::Aggregate(Aggregate::Mean)),
    ("min", Op::Aggregate(Aggregate::Min)),
    ("max", Op::Aggregate(Aggregate::Max)),
    ("count", Op::Aggregate(Aggregate::Count)),
    ("isin", Op::IsIn),
    ("items", Op::Items),
    ("iterrows", Op::IterRows),
    ("align", Op::Align),
    ("join", Op::Join),
    ("merge", Op::Merge),
    ("concat", Op::Concat),
    ("combine_first", Op::CombineFirst),
    ("len", Op::Len),
    ("shape", Op::Shape),
    ("empty", Op::Empty),
    ("columns", Op::Columns),
    ("index", Op::Index),
    ("levels", Op::Levels),
    ("contains", Op::Contains),
    ("getitem", Op::Get),
    ("__getitem__", Op::Get),
    ("get_value", Op::At),
    ("pad", Op::Ffill),
    ("T", Op::Transpose),
    ("subtract", Op::Arithmetic(Arithmetic::Sub)),
    ("multiply", Op::Arithmetic(Arithmetic::Mul)),
    ("divide", Op::Arithmetic(Arithmetic::Div)),
    ("truediv", Op::Arithmetic(Arithmetic::Div)),
    ("iteritems", Op::Items),
    ("append", Op::Concat),
    ("__len__", Op::Len),
    ("__contains__", Op::Contains),
];

impl FromStr for Op {
    type Err = FrameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, op)| *op)
            .ok_or_else(|| FrameError::UnknownOperation(name.to_string()))
    }
}

impl Op {
    pub fn name(&self) -> &'static str {
        NAMES
            .iter()
            .find(|(_, op)| op == self)
            .map_or("unknown", |(name, _)| name)
    }
}

/// Positional operation argument. `F` is the frame type an argument may
/// carry for operations combining two frames.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<F> {
    Label(Label),
    Labels(Vec<Label>),
    Scalar(Scalar),
    Scalars(Vec<Scalar>),
    Int(i64),
    Text(String),
    /// Every row (`:` in a two-axis `loc`).
    All,
    Frame(F),
}

impl<F> Arg<F> {
    pub fn label(label: impl Into<Label>) -> Self {
        Arg::Label(label.into())
    }

    pub fn labels<L: Into<Label>>(labels: impl IntoIterator<Item = L>) -> Self {
        Arg::Labels(labels.into_iter().map(Into::into).collect())
    }

    pub fn scalars<S: Into<Scalar>>(values: impl IntoIterator<Item = S>) -> Self {
        Arg::Scalars(values.into_iter().map(Into::into).collect())
    }

    pub fn text(text: &str) -> Self {
        Arg::Text(text.to_string())
    }

    pub fn map_frame<G>(self, f: impl FnOnce(F) -> G) -> Arg<G> {
        match self {
            Arg::Label(v) => Arg::Label(v),
            Arg::Labels(v) => Arg::Labels(v),
            Arg::Scalar(v) => Arg::Scalar(v),
            Arg::Scalars(v) => Arg::Scalars(v),
            Arg::Int(v) => Arg::Int(v),
            Arg::Text(v) => Arg::Text(v),
            Arg::All => Arg::All,
            Arg::Frame(frame) => Arg::Frame(f(frame)),
        }
    }
}

impl<F> From<Label> for Arg<F> {
    fn from(value: Label) -> Self {
        Arg::Label(value)
    }
}

impl<F> From<Scalar> for Arg<F> {
    fn from(value: Scalar) -> Self {
        Arg::Scalar(value)
    }
}

impl<F> From<i64> for Arg<F> {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl<F> From<f64> for Arg<F> {
    fn from(value: f64) -> Self {
        Arg::Scalar(Scalar::Float(value))
    }
}

/// Result of any operation: wrapped-type values, or plain data that passes
/// through wrappers untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<F, S> {
    Frame(F),
    Series(S),
    /// Several frames, e.g. both sides of an alignment.
    Frames(Vec<F>),
    /// Labelled series: columns for `items`, rows for `iterrows`.
    Entries(Vec<(Label, S)>),
    Scalar(Scalar),
    Bool(bool),
    Labels(Vec<Label>),
    Count(usize),
    Shape(usize, usize),
}

impl<F, S> Value<F, S> {
    pub fn map<F2, S2>(
        self,
        mut frame: impl FnMut(F) -> F2,
        mut series: impl FnMut(S) -> S2,
    ) -> Value<F2, S2> {
        match self {
            Value::Frame(f) => Value::Frame(frame(f)),
            Value::Series(s) => Value::Series(series(s)),
            Value::Frames(fs) => Value::Frames(fs.into_iter().map(frame).collect()),
            Value::Entries(entries) => Value::Entries(
                entries
                    .into_iter()
                    .map(|(label, s)| (label, series(s)))
                    .collect(),
            ),
            Value::Scalar(v) => Value::Scalar(v),
            Value::Bool(v) => Value::Bool(v),
            Value::Labels(v) => Value::Labels(v),
            Value::Count(v) => Value::Count(v),
            Value::Shape(r, c) => Value::Shape(r, c),
        }
    }

    pub fn into_frame(self) -> Option<F> {
        match self {
            Value::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn into_series(self) -> Option<S> {
        match self {
            Value::Series(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_frames(self) -> Option<Vec<F>> {
        match self {
            Value::Frames(fs) => Some(fs),
            _ => None,
        }
    }

    pub fn into_entries(self) -> Option<Vec<(Label, S)>> {
        match self {
            Value::Entries(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn into_scalar(self) -> Option<Scalar> {
        match self {
            Value::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_labels(self) -> Option<Vec<Label>> {
        match self {
            Value::Labels(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, Value::Frame(_))
    }

    pub fn is_series(&self) -> bool {
        matches!(self, Value::Series(_))
    }
}
