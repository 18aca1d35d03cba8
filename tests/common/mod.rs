#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tickframe::adapters::symbol_cache::SymbolCache;
use tickframe::domain::field::{CustomData, FieldMap, FieldProvider};
use tickframe::domain::identity::Identity;
use tickframe::domain::record::{
    Bar, OpenInterest, QuoteBar, QuoteTick, Record, TradeBar, TradeTick,
};
use tickframe::PolarsConverter;

pub fn spy() -> Identity {
    Identity::equity("SPY", "usa")
}

pub fn aapl() -> Identity {
    Identity::equity("AAPL", "usa")
}

pub fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2013, 10, 7)
        .unwrap()
        .and_hms_opt(9, 31, 0)
        .unwrap()
}

pub fn at(minute: i64) -> NaiveDateTime {
    t0() + Duration::minutes(minute)
}

/// Fresh cache plus a converter sharing it.
pub fn converter() -> (Arc<SymbolCache>, PolarsConverter) {
    let cache = Arc::new(SymbolCache::new());
    let converter = PolarsConverter::new(cache.clone());
    (cache, converter)
}

pub fn trade_tick(identity: &Identity, minute: i64, price: f64) -> Record {
    TradeTick {
        identity: identity.clone(),
        time: at(minute),
        price,
        quantity: 10.0,
        exchange: "ARCA".into(),
    }
    .into()
}

pub fn quote_tick(identity: &Identity, minute: i64, bid: f64, ask: f64) -> Record {
    QuoteTick {
        identity: identity.clone(),
        time: at(minute),
        bid_price: bid,
        bid_size: 100.0,
        ask_price: ask,
        ask_size: 200.0,
    }
    .into()
}

pub fn trade_bar(identity: &Identity, minute: i64, close: f64) -> Record {
    TradeBar {
        identity: identity.clone(),
        time: at(minute),
        open: close - 1.0,
        high: close + 1.0,
        low: close - 2.0,
        close,
        volume: 1000.0,
    }
    .into()
}

pub fn quote_bar(identity: &Identity, minute: i64, bid: Option<f64>, ask: Option<f64>) -> Record {
    QuoteBar {
        identity: identity.clone(),
        time: at(minute),
        bid: bid.map(|p| Bar::new(p, p, p, p)),
        last_bid_size: 5.0,
        ask: ask.map(|p| Bar::new(p, p, p, p)),
        last_ask_size: 7.0,
    }
    .into()
}

pub fn open_interest(identity: &Identity, minute: i64, value: f64) -> Record {
    OpenInterest {
        identity: identity.clone(),
        time: at(minute),
        value,
    }
    .into()
}

/// Custom kind at the root of a three-level chain.
#[derive(Debug, Clone)]
pub struct Fundamentals {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub close: f64,
    pub pe_ratio: f64,
}

impl FieldProvider for Fundamentals {
    fn provide_fields(&self, out: &mut FieldMap) {
        out.insert("close", self.close);
        out.insert("PeRatio", self.pe_ratio);
    }
}

#[derive(Debug, Clone)]
pub struct SectorFundamentals {
    pub base: Fundamentals,
    pub sector: String,
}

impl FieldProvider for SectorFundamentals {
    fn provide_fields(&self, out: &mut FieldMap) {
        self.base.provide_fields(out);
        out.insert("sector", self.sector.as_str());
    }
}

#[derive(Debug, Clone)]
pub struct RatedSectorFundamentals {
    pub parent: SectorFundamentals,
    pub rating: f64,
}

impl FieldProvider for RatedSectorFundamentals {
    fn provide_fields(&self, out: &mut FieldMap) {
        self.parent.provide_fields(out);
        out.insert("rating", self.rating);
    }
}

impl CustomData for RatedSectorFundamentals {
    fn identity(&self) -> &Identity {
        &self.parent.base.identity
    }

    fn time(&self) -> NaiveDateTime {
        self.parent.base.time
    }

    fn value(&self) -> f64 {
        self.parent.base.close
    }
}

pub fn rated_fundamentals(identity: &Identity, minute: i64, close: f64) -> Record {
    Record::custom(RatedSectorFundamentals {
        parent: SectorFundamentals {
            base: Fundamentals {
                identity: identity.clone(),
                time: at(minute),
                close,
                pe_ratio: 20.0,
            },
            sector: "Technology".into(),
        },
        rating: 4.5,
    })
}
