//! Flattening of heterogeneous records into uniform named rows.

use crate::domain::field::{FieldMap, FieldProvider};
use crate::domain::identity::Identity;
use crate::domain::record::{Record, Slice};
use chrono::NaiveDateTime;

/// One table row before column alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub fields: FieldMap,
}

pub fn normalize(record: &Record) -> NormalizedRow {
    let mut fields = FieldMap::new();
    match record {
        Record::TradeBar(r) => r.provide_fields(&mut fields),
        Record::QuoteBar(r) => r.provide_fields(&mut fields),
        Record::TradeTick(r) => r.provide_fields(&mut fields),
        Record::QuoteTick(r) => r.provide_fields(&mut fields),
        Record::OpenInterest(r) => r.provide_fields(&mut fields),
        Record::Custom(r) => {
            fields.insert("value", r.value());
            r.provide_fields(&mut fields);
        }
    }
    NormalizedRow {
        identity: record.identity().clone(),
        time: record.time(),
        fields,
    }
}

/// Rows of every slice in order, as if the records had been passed directly.
pub fn normalize_slices(slices: &[Slice]) -> impl Iterator<Item = NormalizedRow> + '_ {
    slices.iter().flat_map(|s| s.records.iter().map(normalize))
}
