//! Typed access to positional operation arguments.

use super::index::Indexed;
use crate::domain::error::FrameError;
use crate::domain::label::Label;
use crate::domain::ops::{Arg, Axis, Op, Scalar};

/// Row selector of a two-axis `loc`.
pub(crate) enum Rows<'a> {
    All,
    Key(&'a Label),
}

pub(crate) struct Args<'a, F> {
    op: Op,
    args: &'a [Arg<F>],
}

impl<'a, F> Args<'a, F> {
    pub(crate) fn new(op: Op, args: &'a [Arg<F>]) -> Self {
        Self { op, args }
    }

    pub(crate) fn get(&self, i: usize) -> Option<&'a Arg<F>> {
        self.args.get(i)
    }

    pub(crate) fn invalid(&self, reason: impl Into<String>) -> FrameError {
        FrameError::InvalidArgument {
            op: self.op.name().into(),
            reason: reason.into(),
        }
    }

    fn missing(&self, i: usize, what: &str) -> FrameError {
        self.invalid(format!("argument {i} must be {what}"))
    }

    pub(crate) fn label(&self, i: usize) -> Result<&'a Label, FrameError> {
        match self.get(i) {
            Some(Arg::Label(label)) => Ok(label),
            _ => Err(self.missing(i, "a label")),
        }
    }

    /// One label or a list of them.
    pub(crate) fn labels(&self, i: usize) -> Result<Vec<Label>, FrameError> {
        match self.get(i) {
            Some(Arg::Label(label)) => Ok(vec![label.clone()]),
            Some(Arg::Labels(labels)) => Ok(labels.clone()),
            Some(Arg::Text(text)) => Ok(vec![Label::from(text.as_str())]),
            _ => Err(self.missing(i, "a label or list of labels")),
        }
    }

    pub(crate) fn rows(&self, i: usize) -> Result<Rows<'a>, FrameError> {
        match self.get(i) {
            Some(Arg::All) => Ok(Rows::All),
            Some(Arg::Label(label)) => Ok(Rows::Key(label)),
            _ => Err(self.missing(i, "a row label or every row")),
        }
    }

    pub(crate) fn scalar(&self, i: usize) -> Result<Scalar, FrameError> {
        match self.get(i) {
            Some(Arg::Scalar(value)) => Ok(value.clone()),
            Some(Arg::Text(text)) => Ok(Scalar::Text(text.clone())),
            Some(Arg::Int(v)) => Ok(Scalar::Float(*v as f64)),
            _ => Err(self.missing(i, "a scalar")),
        }
    }

    pub(crate) fn scalars(&self, i: usize) -> Result<Vec<Scalar>, FrameError> {
        match self.get(i) {
            Some(Arg::Scalars(values)) => Ok(values.clone()),
            Some(_) => Ok(vec![self.scalar(i)?]),
            None => Err(self.missing(i, "a list of values")),
        }
    }

    pub(crate) fn float(&self, i: usize) -> Result<f64, FrameError> {
        self.scalar(i)?
            .as_f64()
            .ok_or_else(|| self.missing(i, "a number"))
    }

    pub(crate) fn text(&self, i: usize) -> Result<&'a str, FrameError> {
        match self.get(i) {
            Some(Arg::Text(text)) => Ok(text),
            Some(Arg::Label(Label::Text(text))) => Ok(text),
            _ => Err(self.missing(i, "text")),
        }
    }

    pub(crate) fn text_or(&self, i: usize, default: &'a str) -> Result<&'a str, FrameError> {
        match self.get(i) {
            None => Ok(default),
            Some(_) => self.text(i),
        }
    }

    /// One name or a list of them.
    pub(crate) fn names(&self, i: usize) -> Result<Vec<String>, FrameError> {
        match self.get(i) {
            Some(Arg::Labels(labels)) => labels
                .iter()
                .map(|label| {
                    label
                        .as_text()
                        .map(str::to_string)
                        .ok_or_else(|| self.missing(i, "level names"))
                })
                .collect(),
            _ => Ok(vec![self.text(i)?.to_string()]),
        }
    }

    pub(crate) fn count_or(&self, i: usize, default: usize) -> Result<usize, FrameError> {
        match self.get(i) {
            None => Ok(default),
            Some(Arg::Int(n)) if *n >= 0 => Ok(*n as usize),
            _ => Err(self.missing(i, "a non-negative count")),
        }
    }

    /// Row position, negative counting from the end.
    pub(crate) fn position(&self, i: usize, len: usize) -> Result<usize, FrameError> {
        let Some(Arg::Int(raw)) = self.get(i) else {
            return Err(self.missing(i, "a position"));
        };
        let position = if *raw < 0 { len as i64 + raw } else { *raw };
        if position < 0 || position as usize >= len {
            return Err(FrameError::PositionOutOfBounds {
                position: *raw,
                len,
            });
        }
        Ok(position as usize)
    }

    /// Index level by number or by name.
    pub(crate) fn level_or(
        &self,
        i: usize,
        default: i64,
        data: &Indexed,
    ) -> Result<usize, FrameError> {
        match self.get(i) {
            None => data.level_position(default),
            Some(Arg::Int(raw)) => data.level_position(*raw),
            Some(Arg::Text(name)) | Some(Arg::Label(Label::Text(name))) => data
                .level_by_name(name)
                .ok_or_else(|| FrameError::KeyNotFound(Label::Text(name.clone()))),
            _ => Err(self.missing(i, "a level number or name")),
        }
    }

    pub(crate) fn axis(&self, i: usize) -> Result<Axis, FrameError> {
        match self.get(i) {
            None | Some(Arg::Int(0)) => Ok(Axis::Index),
            Some(Arg::Int(1)) => Ok(Axis::Columns),
            Some(Arg::Text(name)) => match name.as_str() {
                "index" | "rows" => Ok(Axis::Index),
                "columns" => Ok(Axis::Columns),
                _ => Err(self.missing(i, "an axis")),
            },
            _ => Err(self.missing(i, "an axis")),
        }
    }

    pub(crate) fn frame(&self, i: usize) -> Result<&'a F, FrameError> {
        match self.get(i) {
            Some(Arg::Frame(frame)) => Ok(frame),
            _ => Err(self.missing(i, "a frame")),
        }
    }

    /// Every frame argument from position `i` on.
    pub(crate) fn frames(&self, i: usize) -> Result<Vec<&'a F>, FrameError> {
        let frames: Vec<&F> = self
            .args
            .iter()
            .skip(i)
            .filter_map(|arg| match arg {
                Arg::Frame(frame) => Some(frame),
                _ => None,
            })
            .collect();
        if frames.is_empty() {
            return Err(self.missing(i, "a frame"));
        }
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_count_from_the_end() {
        let args: Vec<Arg<()>> = vec![Arg::Int(-1)];
        let a = Args::new(Op::Iloc, &args);
        assert_eq!(a.position(0, 3).unwrap(), 2);
        let args: Vec<Arg<()>> = vec![Arg::Int(3)];
        assert_eq!(
            Args::new(Op::Iloc, &args).position(0, 3),
            Err(FrameError::PositionOutOfBounds { position: 3, len: 3 })
        );
    }

    #[test]
    fn axis_accepts_numbers_and_names() {
        let args: Vec<Arg<()>> = vec![Arg::Int(1), Arg::text("index")];
        let a = Args::new(Op::Drop, &args);
        assert_eq!(a.axis(0).unwrap(), Axis::Columns);
        assert_eq!(a.axis(1).unwrap(), Axis::Index);
        assert_eq!(a.axis(2).unwrap(), Axis::Index);
    }

    #[test]
    fn wrong_kind_names_the_operation() {
        let args: Vec<Arg<()>> = vec![Arg::Int(1)];
        let err = Args::new(Op::Xs, &args).label(0).unwrap_err();
        assert_eq!(
            err,
            FrameError::InvalidArgument {
                op: "xs".into(),
                reason: "argument 0 must be a label".into()
            }
        );
    }
}
