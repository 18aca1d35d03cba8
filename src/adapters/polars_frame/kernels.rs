//! Element-wise work on the value columns of an [`Indexed`], shared by
//! frames and series.

use super::index::{dtype_name, value_name, Indexed};
use crate::domain::error::FrameError;
use crate::domain::ops::{Aggregate, Arithmetic, Comparison, Op, Scalar};
use polars::prelude::{
    col, lit, ChunkAgg, Column, DataType, Expr, FillNullStrategy, IntoColumn, PlSmallStr,
};

fn type_mismatch(op: Op, dtype: &DataType) -> FrameError {
    FrameError::TypeMismatch {
        op: op.name().into(),
        dtype: dtype_name(dtype),
    }
}

/// Literal for `value` if it can sit in a column of `dtype`.
fn literal(dtype: &DataType, value: &Scalar) -> Option<Expr> {
    match (dtype, value) {
        (DataType::Float64, Scalar::Float(v)) => Some(lit(*v)),
        (DataType::String, Scalar::Text(s)) => Some(lit(s.clone())),
        (DataType::Boolean, Scalar::Bool(b)) => Some(lit(*b)),
        _ => None,
    }
}

fn value_exprs(
    data: &Indexed,
    mut f: impl FnMut(PlSmallStr, &DataType) -> Result<Option<Expr>, FrameError>,
) -> Result<Vec<Expr>, FrameError> {
    let mut exprs = Vec::with_capacity(data.width());
    for j in 0..data.width() {
        let name = value_name(j);
        if let Some(expr) = f(name.clone(), data.value_column(j).dtype())? {
            exprs.push(expr.alias(name));
        }
    }
    Ok(exprs)
}

fn replace_values(data: &Indexed, exprs: Vec<Expr>) -> Result<Indexed, FrameError> {
    if exprs.is_empty() {
        return Ok(data.clone());
    }
    data.with_df(data.lazy().with_columns(exprs).collect()?)
}

/// Nulls replaced by `value` in every column whose dtype can hold it.
pub(crate) fn fill_null(data: &Indexed, value: &Scalar) -> Result<Indexed, FrameError> {
    let exprs = value_exprs(data, |name, dtype| {
        Ok(literal(dtype, value).map(|fill| col(name).fill_null(fill)))
    })?;
    replace_values(data, exprs)
}

pub(crate) fn forward_fill(data: &Indexed) -> Result<Indexed, FrameError> {
    let values = (0..data.width())
        .map(|j| {
            let filled = data
                .value_column(j)
                .as_materialized_series()
                .fill_null(FillNullStrategy::Forward(None))?;
            Ok(filled.into_column())
        })
        .collect::<Result<Vec<Column>, FrameError>>()?;
    data.with_values(values)
}

/// Rows with a null in any value column removed.
pub(crate) fn drop_nulls(data: &Indexed) -> Result<Indexed, FrameError> {
    let keep = (0..data.width())
        .map(|j| col(value_name(j)).is_not_null())
        .reduce(Expr::and);
    match keep {
        Some(keep) => data.with_df(data.lazy().filter(keep).collect()?),
        None => Ok(data.clone()),
    }
}

pub(crate) fn arithmetic(data: &Indexed, op: Arithmetic, rhs: f64) -> Result<Indexed, FrameError> {
    let exprs = value_exprs(data, |name, dtype| {
        if dtype != &DataType::Float64 {
            return Err(type_mismatch(Op::Arithmetic(op), dtype));
        }
        let column = col(name);
        let out = match op {
            Arithmetic::Add => column + lit(rhs),
            Arithmetic::Sub => column - lit(rhs),
            Arithmetic::Mul => column * lit(rhs),
            Arithmetic::Div => column / lit(rhs),
        };
        Ok(Some(out))
    })?;
    replace_values(data, exprs)
}

/// Boolean columns comparing each cell with `rhs`. A null on either side
/// compares unequal: false for every comparison except `ne`.
pub(crate) fn compare(data: &Indexed, op: Comparison, rhs: &Scalar) -> Result<Indexed, FrameError> {
    let on_null = op == Comparison::Ne;
    let exprs = value_exprs(data, |name, dtype| {
        if rhs.is_null() {
            return Ok(Some(lit(on_null)));
        }
        let value = literal(dtype, rhs).ok_or_else(|| type_mismatch(Op::Compare(op), dtype))?;
        let column = col(name);
        let out = match op {
            Comparison::Gt => column.gt(value),
            Comparison::Ge => column.gt_eq(value),
            Comparison::Lt => column.lt(value),
            Comparison::Le => column.lt_eq(value),
            Comparison::Eq => column.eq(value),
            Comparison::Ne => column.neq(value),
        };
        Ok(Some(out.fill_null(lit(on_null))))
    })?;
    replace_values(data, exprs)
}

/// Boolean columns: whether each cell equals one of `values`.
pub(crate) fn isin(data: &Indexed, values: &[Scalar]) -> Result<Indexed, FrameError> {
    let exprs = value_exprs(data, |name, dtype| {
        let hit = values
            .iter()
            .filter_map(|value| literal(dtype, value))
            .map(|value| col(name.clone()).eq(value))
            .reduce(Expr::or)
            .unwrap_or_else(|| lit(false));
        Ok(Some(hit.fill_null(lit(false))))
    })?;
    replace_values(data, exprs)
}

/// Reduce one column. Counting works on any dtype; the rest need floats.
pub(crate) fn aggregate_column(column: &Column, agg: Aggregate) -> Result<Scalar, FrameError> {
    let count = column.len() - column.null_count();
    if agg == Aggregate::Count {
        return Ok(Scalar::Float(count as f64));
    }
    let values = column
        .f64()
        .map_err(|_| type_mismatch(Op::Aggregate(agg), column.dtype()))?;
    let result = match agg {
        Aggregate::Sum => values.sum(),
        Aggregate::Mean => values.mean(),
        Aggregate::Min => values.min(),
        Aggregate::Max => values.max(),
        Aggregate::Count => Some(count as f64),
    };
    Ok(Scalar::from(result))
}

#[cfg(test)]
mod tests {
    use super::super::index::{level_column, level_name, scalars, Level, LevelKind};
    use super::*;
    use crate::domain::label::Label;
    use polars::prelude::{NamedFrom, Series};

    fn prices(values: &[Option<f64>]) -> Indexed {
        let labels: Vec<Label> = (0..values.len() as i64).map(Label::Int).collect();
        let columns = vec![
            level_column(level_name(0), LevelKind::Int, &labels).unwrap(),
            Series::new("p".into(), values.to_vec()).into_column(),
        ];
        Indexed::from_columns(vec![Level::new(None, LevelKind::Int)], columns).unwrap()
    }

    fn column(data: &Indexed) -> Vec<Scalar> {
        scalars(data.value_column(0)).unwrap()
    }

    #[test]
    fn null_is_unequal_to_everything() {
        let data = prices(&[Some(1.0), None]);
        let ne = compare(&data, Comparison::Ne, &Scalar::Float(1.0)).unwrap();
        assert_eq!(column(&ne), vec![Scalar::Bool(false), Scalar::Bool(true)]);
        let eq = compare(&data, Comparison::Eq, &Scalar::Float(1.0)).unwrap();
        assert_eq!(column(&eq), vec![Scalar::Bool(true), Scalar::Bool(false)]);
        let ne_null = compare(&data, Comparison::Ne, &Scalar::Null).unwrap();
        assert_eq!(column(&ne_null), vec![Scalar::Bool(true), Scalar::Bool(true)]);
        let gt_null = compare(&data, Comparison::Gt, &Scalar::Null).unwrap();
        assert_eq!(column(&gt_null), vec![Scalar::Bool(false), Scalar::Bool(false)]);
    }

    #[test]
    fn comparing_text_with_a_number_is_a_type_error() {
        let data = prices(&[Some(1.0)]);
        let err = compare(&data, Comparison::Gt, &Scalar::from("a")).unwrap_err();
        assert_eq!(
            err,
            FrameError::TypeMismatch {
                op: "gt".into(),
                dtype: "float64".into()
            }
        );
    }

    #[test]
    fn isin_ignores_nulls_and_foreign_types() {
        let data = prices(&[Some(1.0), None, Some(3.0)]);
        let hit = isin(&data, &[Scalar::Float(3.0), Scalar::from("x")]).unwrap();
        assert_eq!(
            column(&hit),
            vec![Scalar::Bool(false), Scalar::Bool(false), Scalar::Bool(true)]
        );
    }

    #[test]
    fn fill_and_forward_fill() {
        let data = prices(&[None, Some(2.0), None]);
        let filled = fill_null(&data, &Scalar::Float(0.0)).unwrap();
        assert_eq!(
            column(&filled),
            vec![Scalar::Float(0.0), Scalar::Float(2.0), Scalar::Float(0.0)]
        );
        let carried = forward_fill(&data).unwrap();
        assert_eq!(
            column(&carried),
            vec![Scalar::Null, Scalar::Float(2.0), Scalar::Float(2.0)]
        );
        assert_eq!(drop_nulls(&data).unwrap().height(), 1);
    }

    #[test]
    fn aggregates_skip_nulls() {
        let data = prices(&[Some(1.0), None, Some(3.0)]);
        let values = data.value_column(0);
        assert_eq!(aggregate_column(values, Aggregate::Sum).unwrap(), Scalar::Float(4.0));
        assert_eq!(aggregate_column(values, Aggregate::Mean).unwrap(), Scalar::Float(2.0));
        assert_eq!(aggregate_column(values, Aggregate::Count).unwrap(), Scalar::Float(2.0));
        let scaled = arithmetic(&data, Arithmetic::Mul, 2.0).unwrap();
        assert_eq!(column(&scaled)[2], Scalar::Float(6.0));
    }
}
