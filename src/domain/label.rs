//! Index and column labels.

use crate::domain::identity::Identity;
use chrono::NaiveDateTime;
use std::fmt;

/// A row or column label, or a key used to look one up.
///
/// Legacy callers pass raw tickers and unique-form strings as `Text`; they
/// only equal an `Identity` label after resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Int(i64),
    Time(NaiveDateTime),
    Text(String),
    Identity(Identity),
    Tuple(Vec<Label>),
}

impl Label {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Label::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_identity(&self) -> Option<&Identity> {
        match self {
            Label::Identity(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{i}"),
            Label::Time(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S%.f")),
            Label::Text(s) => f.write_str(s),
            Label::Identity(id) => write!(f, "{id}"),
            Label::Tuple(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Text(value)
    }
}

impl From<Identity> for Label {
    fn from(value: Identity) -> Self {
        Label::Identity(value)
    }
}

impl From<&Identity> for Label {
    fn from(value: &Identity) -> Self {
        Label::Identity(value.clone())
    }
}

impl From<NaiveDateTime> for Label {
    fn from(value: NaiveDateTime) -> Self {
        Label::Time(value)
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Int(value)
    }
}

impl<A: Into<Label>, B: Into<Label>> From<(A, B)> for Label {
    fn from((a, b): (A, B)) -> Self {
        Label::Tuple(vec![a.into(), b.into()])
    }
}
