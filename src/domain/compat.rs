//! Compatibility wrapper accepting legacy identifiers (raw tickers and
//! unique-form strings) wherever the canonical table expects an [`Identity`].
//!
//! The wrapper works over any [`Tabular`] engine; it only rewrites labels in
//! known argument slots and re-wraps whatever the engine returns.
//!
//! [`Identity`]: crate::domain::identity::Identity

use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Arg, Axis, Op, Scalar, Value};
use crate::ports::symbol_port::SymbolResolver;
use crate::ports::tabular_port::{Outcome, Tabular};
use std::fmt;
use std::sync::Arc;

/// Result of an operation on a `Proxy<T>`: frames and series come back wrapped.
pub type Wrapped<T> = Value<Proxy<<T as Tabular>::Frame>, Proxy<<T as Tabular>::Series>>;

/// Which argument of an operation names a label, and where it is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySlot {
    /// Matched on the value's item-access axis: columns of a frame, the
    /// index of a series.
    Key { arg: usize },
    /// Matched on the row index; tuple keys element-wise per level.
    Row { arg: usize },
    /// Matched on the columns.
    Column { arg: usize },
    /// Matched on the index level given by `level_arg`, by number or name
    /// (outer level when absent).
    Level { arg: usize, level_arg: usize },
    /// Matched on the axis given by `axis_arg`: 0 rows, 1 columns.
    Axis { arg: usize, axis_arg: usize },
}

/// Operations whose arguments may carry legacy identifiers. Every other
/// operation reaches the engine untranslated.
pub static KEY_SLOTS: &[(Op, &[KeySlot])] = &[
    (Op::Get, &[KeySlot::Key { arg: 0 }]),
    (Op::Contains, &[KeySlot::Key { arg: 0 }]),
    (Op::Loc, &[KeySlot::Row { arg: 0 }, KeySlot::Column { arg: 1 }]),
    (Op::At, &[KeySlot::Row { arg: 0 }, KeySlot::Column { arg: 1 }]),
    (Op::Xs, &[KeySlot::Level { arg: 0, level_arg: 1 }]),
    (Op::Drop, &[KeySlot::Axis { arg: 0, axis_arg: 1 }]),
];

pub fn key_slots(op: Op) -> &'static [KeySlot] {
    match KEY_SLOTS.iter().find(|(o, _)| *o == op) {
        Some(&(_, slots)) => slots,
        None => &[],
    }
}

pub(crate) fn unexpected(op: &str, expected: &str) -> FrameError {
    FrameError::InvalidArgument {
        op: op.to_string(),
        reason: format!("expected a {expected} result"),
    }
}

/// A miss on a label this wrapper substituted is reported under the caller's
/// own key. Misses on anything else pass through as the engine raised them.
fn restore_key(err: FrameError, substitutions: &[(Label, Label)]) -> FrameError {
    match err {
        FrameError::KeyNotFound(missing) => {
            let raw = substitutions
                .iter()
                .find(|(_, resolved)| *resolved == missing)
                .map(|(raw, _)| raw.clone());
            FrameError::KeyNotFound(raw.unwrap_or(missing))
        }
        other => other,
    }
}

/// Wraps a frame or series, translating legacy identifiers on the way in and
/// re-wrapping every derived frame or series on the way out. Values, dtypes
/// and ordering pass through untouched.
#[derive(Clone)]
pub struct Proxy<T> {
    inner: T,
    resolver: Arc<dyn SymbolResolver>,
}

impl<T> Proxy<T> {
    pub fn new(inner: T, resolver: Arc<dyn SymbolResolver>) -> Self {
        Self { inner, resolver }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }

    pub fn resolver(&self) -> &Arc<dyn SymbolResolver> {
        &self.resolver
    }
}

impl<T> Proxy<T>
where
    T: Tabular,
    T::Frame: Clone,
{
    fn wrap(&self, value: Value<T::Frame, T::Series>) -> Wrapped<T> {
        value.map(
            |frame| Proxy::new(frame, Arc::clone(&self.resolver)),
            |series| Proxy::new(series, Arc::clone(&self.resolver)),
        )
    }

    /// Translate one label unless it already exists where it will be matched.
    fn translate(&self, label: &Label, axis: Axis, level: Option<usize>) -> Label {
        if self.inner.has_label(axis, level, label) {
            return label.clone();
        }
        if let (Label::Tuple(parts), Axis::Index, None) = (label, axis, level) {
            return Label::Tuple(
                parts
                    .iter()
                    .enumerate()
                    .map(|(i, part)| self.translate(part, axis, Some(i)))
                    .collect(),
            );
        }
        match self.resolver.resolve(label) {
            Some(identity) => {
                tracing::trace!(
                    raw = %label,
                    resolved = %identity.unique_id(),
                    "Translated identifier"
                );
                Label::Identity(identity)
            }
            None => label.clone(),
        }
    }

    fn translate_arg(
        &self,
        arg: &Arg<T::Frame>,
        axis: Axis,
        level: Option<usize>,
        substitutions: &mut Vec<(Label, Label)>,
    ) -> Arg<T::Frame> {
        let mut swap = |label: &Label| {
            let translated = self.translate(label, axis, level);
            if &translated != label {
                substitutions.push((label.clone(), translated.clone()));
            }
            translated
        };
        match arg {
            Arg::Label(label) => Arg::Label(swap(label)),
            Arg::Labels(labels) => Arg::Labels(labels.iter().map(&mut swap).collect()),
            Arg::Text(text) => {
                let label = Label::from(text.as_str());
                let translated = swap(&label);
                if translated == label {
                    arg.clone()
                } else {
                    Arg::Label(translated)
                }
            }
            other => other.clone(),
        }
    }

    /// Index level an argument names: a number (negative from the end) or a
    /// level name. `None` when it names no level.
    fn level_of(&self, arg: Option<&Arg<T::Frame>>) -> Option<usize> {
        let names = self.inner.level_names();
        let raw = match arg {
            None => 0,
            Some(Arg::Int(level)) => *level,
            Some(Arg::Text(name)) | Some(Arg::Label(Label::Text(name))) => {
                return names.iter().position(|n| n.as_deref() == Some(name.as_str()));
            }
            Some(_) => return None,
        };
        let nlevels = names.len() as i64;
        let level = if raw < 0 { nlevels + raw } else { raw };
        (0..nlevels).contains(&level).then_some(level as usize)
    }

    /// Argument position, axis and level a slot addresses.
    fn slot_target(
        &self,
        slot: KeySlot,
        args: &[Arg<T::Frame>],
    ) -> Option<(usize, Axis, Option<usize>)> {
        match slot {
            KeySlot::Key { arg } => Some((arg, self.inner.key_axis(), None)),
            KeySlot::Row { arg } => Some((arg, Axis::Index, None)),
            KeySlot::Column { arg } => Some((arg, Axis::Columns, None)),
            KeySlot::Level { arg, level_arg } => {
                let level = self.level_of(args.get(level_arg))?;
                Some((arg, Axis::Index, Some(level)))
            }
            KeySlot::Axis { arg, axis_arg } => {
                let axis = match args.get(axis_arg) {
                    Some(Arg::Int(1)) => Axis::Columns,
                    Some(Arg::Text(name)) if name == "columns" => Axis::Columns,
                    _ => Axis::Index,
                };
                Some((arg, axis, None))
            }
        }
    }

    /// Arguments with identifier slots translated, plus every (raw, resolved)
    /// pair substituted at the top level of a slot.
    fn translate_args(
        &self,
        op: Op,
        mut args: Vec<Arg<T::Frame>>,
    ) -> (Vec<Arg<T::Frame>>, Vec<(Label, Label)>) {
        let mut substitutions = Vec::new();
        for slot in key_slots(op) {
            let Some((arg, axis, level)) = self.slot_target(*slot, &args) else {
                continue;
            };
            if let Some(original) = args.get(arg) {
                let translated = self.translate_arg(original, axis, level, &mut substitutions);
                args[arg] = translated;
            }
        }
        (args, substitutions)
    }

    /// Resolve `key` to an identity label, if it is not one already.
    fn resolved(&self, key: &Label) -> Option<Label> {
        let identity = self.resolver.resolve(key)?;
        let label = Label::Identity(identity);
        (&label != key).then_some(label)
    }

    fn frame_of(
        &self,
        op: Op,
        args: &[Arg<Proxy<T::Frame>>],
    ) -> Result<Proxy<T::Frame>, FrameError> {
        self.invoke(op, args)?
            .into_frame()
            .ok_or_else(|| unexpected(op.name(), "frame"))
    }

    fn entries_of(&self, op: Op) -> Result<Vec<(Label, Proxy<T::Series>)>, FrameError> {
        self.invoke(op, &[])?
            .into_entries()
            .ok_or_else(|| unexpected(op.name(), "list of entries"))
    }

    /// Item access with a string-convertible key.
    pub fn get(&self, key: impl Into<Label>) -> Result<Wrapped<T>, FrameError> {
        Tabular::get(self, &key.into())
    }

    pub fn loc(&self, key: impl Into<Label>) -> Result<Wrapped<T>, FrameError> {
        self.invoke(Op::Loc, &[Arg::label(key)])
    }

    /// One column over every row: `loc[:, column]`.
    pub fn loc_column(&self, column: impl Into<Label>) -> Result<Wrapped<T>, FrameError> {
        self.invoke(Op::Loc, &[Arg::All, Arg::label(column)])
    }

    /// Single cell by row key and column label.
    pub fn at(
        &self,
        row: impl Into<Label>,
        column: impl Into<Label>,
    ) -> Result<Scalar, FrameError> {
        self.invoke(Op::At, &[Arg::label(row), Arg::label(column)])?
            .into_scalar()
            .ok_or_else(|| unexpected("at", "scalar"))
    }

    pub fn xs(&self, key: impl Into<Label>, level: i64) -> Result<Wrapped<T>, FrameError> {
        self.invoke(Op::Xs, &[Arg::label(key), Arg::Int(level)])
    }

    /// Cross-section on the index level called `level`.
    pub fn xs_level(&self, key: impl Into<Label>, level: &str) -> Result<Wrapped<T>, FrameError> {
        self.invoke(Op::Xs, &[Arg::label(key), Arg::text(level)])
    }

    pub fn unstack(&self, level: i64) -> Result<Proxy<T::Frame>, FrameError> {
        self.frame_of(Op::Unstack, &[Arg::Int(level)])
    }

    pub fn contains(&self, key: impl Into<Label>) -> bool {
        Tabular::contains(self, &key.into())
    }

    pub fn isin<S: Into<Scalar>>(
        &self,
        values: impl IntoIterator<Item = S>,
    ) -> Result<Wrapped<T>, FrameError> {
        self.invoke(Op::IsIn, &[Arg::scalars(values)])
    }

    pub fn items(&self) -> Result<Vec<(Label, Proxy<T::Series>)>, FrameError> {
        self.entries_of(Op::Items)
    }

    pub fn iterrows(&self) -> Result<Vec<(Label, Proxy<T::Series>)>, FrameError> {
        self.entries_of(Op::IterRows)
    }

    /// Both frames over the union of their row keys.
    pub fn align(
        &self,
        other: &Proxy<T::Frame>,
    ) -> Result<(Proxy<T::Frame>, Proxy<T::Frame>), FrameError> {
        let frames = self
            .invoke(Op::Align, &[Arg::Frame(other.clone())])?
            .into_frames()
            .ok_or_else(|| unexpected("align", "pair of frames"))?;
        let mut frames = frames.into_iter();
        match (frames.next(), frames.next()) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(unexpected("align", "pair of frames")),
        }
    }

    pub fn join(
        &self,
        other: &Proxy<T::Frame>,
        lsuffix: &str,
        rsuffix: &str,
    ) -> Result<Proxy<T::Frame>, FrameError> {
        let args = [Arg::Frame(other.clone()), Arg::text(lsuffix), Arg::text(rsuffix)];
        self.frame_of(Op::Join, &args)
    }

    pub fn merge(
        &self,
        other: &Proxy<T::Frame>,
        on: &[&str],
        how: &str,
    ) -> Result<Proxy<T::Frame>, FrameError> {
        let args = [
            Arg::Frame(other.clone()),
            Arg::labels(on.iter().copied()),
            Arg::text(how),
        ];
        self.frame_of(Op::Merge, &args)
    }

    pub fn concat(&self, others: &[&Proxy<T::Frame>]) -> Result<Proxy<T::Frame>, FrameError> {
        let args: Vec<_> = others.iter().map(|&other| Arg::Frame(other.clone())).collect();
        self.frame_of(Op::Concat, &args)
    }

    pub fn combine_first(&self, other: &Proxy<T::Frame>) -> Result<Proxy<T::Frame>, FrameError> {
        self.frame_of(Op::CombineFirst, &[Arg::Frame(other.clone())])
    }
}

impl<T> Tabular for Proxy<T>
where
    T: Tabular,
    T::Frame: Clone,
{
    type Frame = Proxy<T::Frame>;
    type Series = Proxy<T::Series>;

    fn invoke(&self, op: Op, args: &[Arg<Proxy<T::Frame>>]) -> Outcome<Self> {
        let args = args
            .iter()
            .map(|arg| arg.clone().map_frame(Proxy::into_inner))
            .collect();
        let (args, substitutions) = self.translate_args(op, args);
        self.inner
            .invoke(op, &args)
            .map(|value| self.wrap(value))
            .map_err(|err| restore_key(err, &substitutions))
    }

    /// Delegate first; resolve and retry once only on a missing key. The
    /// engine's original error wins whenever the retry cannot help.
    fn get(&self, key: &Label) -> Outcome<Self> {
        match self.inner.invoke(Op::Get, &[Arg::Label(key.clone())]) {
            Err(err) if err.is_key_not_found() => {
                let Some(resolved) = self.resolved(key) else {
                    return Err(err);
                };
                tracing::trace!(
                    raw = %key,
                    resolved = %resolved,
                    "Retrying lookup with resolved identity"
                );
                self.inner
                    .invoke(Op::Get, &[Arg::Label(resolved)])
                    .map(|value| self.wrap(value))
                    .map_err(|retry| if retry.is_key_not_found() { err } else { retry })
            }
            other => other.map(|value| self.wrap(value)),
        }
    }

    fn contains(&self, key: &Label) -> bool {
        self.inner.contains(key)
            || self
                .resolved(key)
                .is_some_and(|resolved| self.inner.contains(&resolved))
    }

    fn level_contains(&self, level: usize, key: &Label) -> bool {
        self.inner.level_contains(level, key)
            || self
                .resolved(key)
                .is_some_and(|resolved| self.inner.level_contains(level, &resolved))
    }

    fn has_label(&self, axis: Axis, level: Option<usize>, key: &Label) -> bool {
        self.inner.has_label(axis, level, key)
    }

    fn key_axis(&self) -> Axis {
        self.inner.key_axis()
    }

    fn level_names(&self) -> Vec<Option<String>> {
        self.inner.level_names()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<T: fmt::Display> fmt::Display for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: PartialEq> PartialEq for Proxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Proxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}
