//! Assembly of normalized rows into the canonical (symbol, time) table.

use crate::domain::error::TickframeError;
use crate::domain::field::FieldValue;
use crate::domain::identity::Identity;
use crate::domain::normalize::NormalizedRow;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const SYMBOL_LEVEL: &str = "symbol";
pub const TIME_LEVEL: &str = "time";

/// What to do with several rows at the same (identity, time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Keep every row, in arrival order.
    #[default]
    KeepAll,
    /// Keep only the latest arrival.
    KeepLast,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keep_all" => Ok(DuplicatePolicy::KeepAll),
            "keep_last" => Ok(DuplicatePolicy::KeepLast),
            other => Err(format!("expected keep_all or keep_last, got {other:?}")),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::KeepAll => f.write_str("keep_all"),
            DuplicatePolicy::KeepLast => f.write_str("keep_last"),
        }
    }
}

/// One typed, nullable column of the canonical table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

/// The canonical table in engine-neutral columnar form: one identity and one
/// time per row, plus the field columns sorted by name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CanonicalTable {
    pub identities: Vec<Identity>,
    pub times: Vec<NaiveDateTime>,
    pub columns: Vec<(String, ColumnData)>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Number,
    Text,
}

impl FieldKind {
    fn of(value: &FieldValue) -> Self {
        match value {
            FieldValue::Number(_) => FieldKind::Number,
            FieldValue::Text(_) => FieldKind::Text,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldKind::Number => "number",
            FieldKind::Text => "text",
        }
    }
}

#[derive(Debug, Default)]
pub struct TableBuilder {
    policy: DuplicatePolicy,
    rows: Vec<NormalizedRow>,
}

impl TableBuilder {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: NormalizedRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build the table: union of field names as sorted columns (nulls where a
    /// row lacks a field), rows stably sorted by (identity, time).
    pub fn finish(self) -> Result<CanonicalTable, TickframeError> {
        let received = self.rows.len();
        let rows = match self.policy {
            DuplicatePolicy::KeepAll => self.rows,
            DuplicatePolicy::KeepLast => keep_last(self.rows),
        };
        let dropped = received - rows.len();
        if dropped > 0 {
            tracing::warn!(dropped, policy = %self.policy, "Dropped duplicate rows");
        }

        let mut schema: BTreeMap<&str, FieldKind> = BTreeMap::new();
        for row in &rows {
            for (name, value) in &row.fields {
                let kind = FieldKind::of(value);
                let expected = *schema.entry(name.as_str()).or_insert(kind);
                if expected != kind {
                    return Err(TickframeError::SchemaMismatch {
                        column: name.clone(),
                        expected: expected.name().to_string(),
                        found: kind.name().to_string(),
                    });
                }
            }
        }

        let mut order: Vec<usize> = (0..rows.len()).collect();
        order.sort_by(|&a, &b| {
            (&rows[a].identity, rows[a].time).cmp(&(&rows[b].identity, rows[b].time))
        });

        let identities = order.iter().map(|&i| rows[i].identity.clone()).collect();
        let times = order.iter().map(|&i| rows[i].time).collect();

        let mut columns = Vec::with_capacity(schema.len());
        for (&name, &kind) in &schema {
            let column = match kind {
                FieldKind::Number => ColumnData::Float(
                    order
                        .iter()
                        .map(|&i| match rows[i].fields.get(name) {
                            Some(FieldValue::Number(v)) => Some(*v),
                            _ => None,
                        })
                        .collect(),
                ),
                FieldKind::Text => ColumnData::Text(
                    order
                        .iter()
                        .map(|&i| match rows[i].fields.get(name) {
                            Some(FieldValue::Text(v)) => Some(v.clone()),
                            _ => None,
                        })
                        .collect(),
                ),
            };
            columns.push((name.to_string(), column));
        }

        tracing::debug!(
            rows = rows.len(),
            columns = columns.len(),
            dropped,
            "Built canonical table"
        );
        Ok(CanonicalTable {
            identities,
            times,
            columns,
        })
    }
}

/// Latest arrival per (identity, time), remaining in arrival order.
fn keep_last(rows: Vec<NormalizedRow>) -> Vec<NormalizedRow> {
    let mut last: HashMap<(Identity, NaiveDateTime), usize> = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        last.insert((row.identity.clone(), row.time), i);
    }
    rows.into_iter()
        .enumerate()
        .filter(|(i, row)| last.get(&(row.identity.clone(), row.time)) == Some(i))
        .map(|(_, row)| row)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::FieldMap;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 10, 7)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn row(ticker: &str, minute: u32, fields: &[(&str, FieldValue)]) -> NormalizedRow {
        let mut map = FieldMap::new();
        for (name, value) in fields {
            map.insert(name, value.clone());
        }
        NormalizedRow {
            identity: Identity::equity(ticker, "usa"),
            time: at(minute),
            fields: map,
        }
    }

    fn price(v: f64) -> (&'static str, FieldValue) {
        ("lastprice", FieldValue::Number(v))
    }

    fn prices(table: &CanonicalTable) -> Vec<Option<f64>> {
        match table.column("lastprice") {
            Some(ColumnData::Float(values)) => values.clone(),
            other => panic!("expected a float lastprice column, got {other:?}"),
        }
    }

    #[test]
    fn empty_input_gives_empty_table() {
        let table = TableBuilder::new(DuplicatePolicy::KeepAll).finish().unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names().count(), 0);
    }

    #[test]
    fn columns_are_sorted_union_with_nulls() {
        let mut builder = TableBuilder::default();
        builder.push(row("SPY", 31, &[price(1.0), ("exchange", "P".into())]));
        builder.push(row("SPY", 32, &[("openinterest", FieldValue::Number(5.0))]));
        let table = builder.finish().unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["exchange", "lastprice", "openinterest"]
        );
        assert_eq!(
            table.column("openinterest"),
            Some(&ColumnData::Float(vec![None, Some(5.0)]))
        );
        assert_eq!(
            table.column("exchange"),
            Some(&ColumnData::Text(vec![Some("P".into()), None]))
        );
    }

    #[test]
    fn rows_sort_by_identity_then_time() {
        let mut builder = TableBuilder::default();
        builder.push(row("SPY", 32, &[price(3.0)]));
        builder.push(row("AAPL", 33, &[price(2.0)]));
        builder.push(row("SPY", 31, &[price(1.0)]));
        let table = builder.finish().unwrap();
        assert_eq!(prices(&table), vec![Some(2.0), Some(1.0), Some(3.0)]);
        assert_eq!(table.identities[0].ticker(), "AAPL");
        assert_eq!(table.times[1], at(31));
    }

    #[test]
    fn keep_all_preserves_duplicates_in_arrival_order() {
        let mut builder = TableBuilder::new(DuplicatePolicy::KeepAll);
        builder.push(row("SPY", 31, &[price(1.0)]));
        builder.push(row("SPY", 31, &[price(2.0)]));
        let table = builder.finish().unwrap();
        assert_eq!(prices(&table), vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn keep_last_keeps_latest_arrival() {
        let mut builder = TableBuilder::new(DuplicatePolicy::KeepLast);
        builder.push(row("SPY", 31, &[price(1.0)]));
        builder.push(row("SPY", 32, &[price(5.0)]));
        builder.push(row("SPY", 31, &[price(2.0)]));
        let table = builder.finish().unwrap();
        assert_eq!(prices(&table), vec![Some(2.0), Some(5.0)]);
    }

    #[test]
    fn mixed_kinds_are_schema_mismatch() {
        let mut builder = TableBuilder::default();
        builder.push(row("SPY", 31, &[("exchange", "P".into())]));
        builder.push(row("SPY", 32, &[("exchange", FieldValue::Number(1.0))]));
        let err = builder.finish().unwrap_err();
        assert!(matches!(
            err,
            TickframeError::SchemaMismatch { ref column, .. } if column == "exchange"
        ));
    }

    #[test]
    fn policy_parses_from_config_spelling() {
        assert_eq!("keep_last".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::KeepLast));
        assert_eq!(" KEEP_ALL ".parse::<DuplicatePolicy>(), Ok(DuplicatePolicy::KeepAll));
        assert!("newest".parse::<DuplicatePolicy>().is_err());
    }

    proptest! {
        #[test]
        fn keep_all_preserves_cardinality_and_sorts(
            entries in prop::collection::vec((0usize..3, 0u32..5), 0..40)
        ) {
            let tickers = ["AAPL", "IBM", "SPY"];
            let mut builder = TableBuilder::new(DuplicatePolicy::KeepAll);
            for (n, (t, minute)) in entries.iter().enumerate() {
                builder.push(row(tickers[*t], *minute, &[price(n as f64)]));
            }
            let table = builder.finish().unwrap();
            prop_assert_eq!(table.len(), entries.len());

            let keys: Vec<_> = table.identities.iter().zip(&table.times).collect();
            for pair in keys.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            // Equal keys keep arrival order, which the price column encodes.
            let prices = prices(&table);
            for (i, pair) in keys.windows(2).enumerate() {
                if pair[0] == pair[1] {
                    prop_assert!(prices[i] < prices[i + 1]);
                }
            }
        }

        #[test]
        fn keep_last_leaves_one_row_per_key(
            entries in prop::collection::vec((0usize..3, 0u32..5), 1..40)
        ) {
            let tickers = ["AAPL", "IBM", "SPY"];
            let mut builder = TableBuilder::new(DuplicatePolicy::KeepLast);
            for (t, minute) in &entries {
                builder.push(row(tickers[*t], *minute, &[price(1.0)]));
            }
            let table = builder.finish().unwrap();
            let distinct: std::collections::BTreeSet<_> = entries.iter().collect();
            prop_assert_eq!(table.len(), distinct.len());
        }
    }
}
