//! Market data record kinds.

use crate::domain::field::{CustomData, FieldMap, FieldProvider};
use crate::domain::identity::Identity;
use chrono::NaiveDateTime;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    fn mid(a: &Bar, b: &Bar) -> Bar {
        Bar {
            open: (a.open + b.open) / 2.0,
            high: (a.high + b.high) / 2.0,
            low: (a.low + b.low) / 2.0,
            close: (a.close + b.close) / 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeBar {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl FieldProvider for TradeBar {
    fn provide_fields(&self, out: &mut FieldMap) {
        out.insert("open", self.open);
        out.insert("high", self.high);
        out.insert("low", self.low);
        out.insert("close", self.close);
        out.insert("volume", self.volume);
    }
}

/// Bid and ask bars over one period. Either side may be missing.
#[derive(Debug, Clone)]
pub struct QuoteBar {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub bid: Option<Bar>,
    pub last_bid_size: f64,
    pub ask: Option<Bar>,
    pub last_ask_size: f64,
}

impl QuoteBar {
    /// Mid bar when both sides are present, otherwise the side that is.
    pub fn mid(&self) -> Option<Bar> {
        match (&self.bid, &self.ask) {
            (Some(bid), Some(ask)) => Some(Bar::mid(bid, ask)),
            (Some(side), None) | (None, Some(side)) => Some(*side),
            (None, None) => None,
        }
    }
}

impl FieldProvider for QuoteBar {
    fn provide_fields(&self, out: &mut FieldMap) {
        if let Some(bid) = &self.bid {
            out.insert("bidopen", bid.open);
            out.insert("bidhigh", bid.high);
            out.insert("bidlow", bid.low);
            out.insert("bidclose", bid.close);
            out.insert("bidsize", self.last_bid_size);
        }
        if let Some(ask) = &self.ask {
            out.insert("askopen", ask.open);
            out.insert("askhigh", ask.high);
            out.insert("asklow", ask.low);
            out.insert("askclose", ask.close);
            out.insert("asksize", self.last_ask_size);
        }
        if let Some(mid) = self.mid() {
            out.insert("open", mid.open);
            out.insert("high", mid.high);
            out.insert("low", mid.low);
            out.insert("close", mid.close);
        }
    }
}

#[derive(Debug, Clone)]
pub struct TradeTick {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub price: f64,
    pub quantity: f64,
    pub exchange: String,
}

impl FieldProvider for TradeTick {
    fn provide_fields(&self, out: &mut FieldMap) {
        out.insert("lastprice", self.price);
        out.insert("quantity", self.quantity);
        out.insert("exchange", self.exchange.as_str());
    }
}

#[derive(Debug, Clone)]
pub struct QuoteTick {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub bid_price: f64,
    pub bid_size: f64,
    pub ask_price: f64,
    pub ask_size: f64,
}

impl QuoteTick {
    pub fn mid_price(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }
}

impl FieldProvider for QuoteTick {
    fn provide_fields(&self, out: &mut FieldMap) {
        out.insert("askprice", self.ask_price);
        out.insert("asksize", self.ask_size);
        out.insert("bidprice", self.bid_price);
        out.insert("bidsize", self.bid_size);
        out.insert("lastprice", self.mid_price());
    }
}

#[derive(Debug, Clone)]
pub struct OpenInterest {
    pub identity: Identity,
    pub time: NaiveDateTime,
    pub value: f64,
}

impl FieldProvider for OpenInterest {
    fn provide_fields(&self, out: &mut FieldMap) {
        out.insert("openinterest", self.value);
    }
}

#[derive(Debug, Clone)]
pub enum Record {
    TradeBar(TradeBar),
    QuoteBar(QuoteBar),
    TradeTick(TradeTick),
    QuoteTick(QuoteTick),
    OpenInterest(OpenInterest),
    Custom(Arc<dyn CustomData>),
}

impl Record {
    pub fn custom(data: impl CustomData + 'static) -> Self {
        Record::Custom(Arc::new(data))
    }

    pub fn identity(&self) -> &Identity {
        match self {
            Record::TradeBar(r) => &r.identity,
            Record::QuoteBar(r) => &r.identity,
            Record::TradeTick(r) => &r.identity,
            Record::QuoteTick(r) => &r.identity,
            Record::OpenInterest(r) => &r.identity,
            Record::Custom(r) => r.identity(),
        }
    }

    pub fn time(&self) -> NaiveDateTime {
        match self {
            Record::TradeBar(r) => r.time,
            Record::QuoteBar(r) => r.time,
            Record::TradeTick(r) => r.time,
            Record::QuoteTick(r) => r.time,
            Record::OpenInterest(r) => r.time,
            Record::Custom(r) => r.time(),
        }
    }
}

impl From<TradeBar> for Record {
    fn from(r: TradeBar) -> Self {
        Record::TradeBar(r)
    }
}

impl From<QuoteBar> for Record {
    fn from(r: QuoteBar) -> Self {
        Record::QuoteBar(r)
    }
}

impl From<TradeTick> for Record {
    fn from(r: TradeTick) -> Self {
        Record::TradeTick(r)
    }
}

impl From<QuoteTick> for Record {
    fn from(r: QuoteTick) -> Self {
        Record::QuoteTick(r)
    }
}

impl From<OpenInterest> for Record {
    fn from(r: OpenInterest) -> Self {
        Record::OpenInterest(r)
    }
}

/// Records emitted for one instant of a history request.
#[derive(Debug, Clone)]
pub struct Slice {
    pub time: NaiveDateTime,
    pub records: Vec<Record>,
}

impl Slice {
    pub fn new(time: NaiveDateTime, records: Vec<Record>) -> Self {
        Self { time, records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2013, 10, 7)
            .unwrap()
            .and_hms_opt(9, 31, 0)
            .unwrap()
    }

    fn fields_of(provider: &dyn FieldProvider) -> FieldMap {
        let mut out = FieldMap::new();
        provider.provide_fields(&mut out);
        out
    }

    #[test]
    fn quote_bar_mid_averages_sides() {
        let bar = QuoteBar {
            identity: Identity::forex("EURUSD", "oanda"),
            time: t0(),
            bid: Some(Bar::new(1.0, 1.2, 0.9, 1.1)),
            last_bid_size: 0.0,
            ask: Some(Bar::new(1.2, 1.4, 1.1, 1.3)),
            last_ask_size: 0.0,
        };
        let mid = bar.mid().unwrap();
        assert!((mid.close - 1.2).abs() < 1e-12);
        assert!((mid.open - 1.1).abs() < 1e-12);
    }

    #[test]
    fn quote_bar_with_one_side_omits_the_other() {
        let bar = QuoteBar {
            identity: Identity::forex("EURUSD", "oanda"),
            time: t0(),
            bid: Some(Bar::new(1.0, 1.2, 0.9, 1.1)),
            last_bid_size: 3.0,
            ask: None,
            last_ask_size: 0.0,
        };
        let fields = fields_of(&bar);
        assert!(fields.contains("bidclose"));
        assert!(!fields.contains("askclose"));
        assert!(!fields.contains("asksize"));
        assert_eq!(fields.get("close"), fields.get("bidclose"));
    }

    #[test]
    fn trade_tick_has_exchange_and_no_quote_side() {
        let tick = TradeTick {
            identity: Identity::equity("SPY", "usa"),
            time: t0(),
            price: 167.0,
            quantity: 100.0,
            exchange: "T".into(),
        };
        let fields = fields_of(&tick);
        assert!(fields.contains("exchange"));
        assert!(!fields.names().any(|n| n.starts_with("ask") || n.starts_with("bid")));
    }

    #[test]
    fn quote_tick_has_quote_side_and_no_exchange() {
        let tick = QuoteTick {
            identity: Identity::forex("EURUSD", "oanda"),
            time: t0(),
            bid_price: 0.5,
            bid_size: 1.0,
            ask_price: 1.5,
            ask_size: 2.0,
        };
        let fields = fields_of(&tick);
        assert!(fields.contains("askprice"));
        assert!(fields.contains("bidprice"));
        assert!(!fields.contains("exchange"));
        assert_eq!(fields.get("lastprice"), Some(&1.0.into()));
    }

    #[test]
    fn record_accessors_dispatch_on_kind() {
        let record: Record = OpenInterest {
            identity: Identity::equity("SPY", "usa"),
            time: t0(),
            value: 11.0,
        }
        .into();
        assert_eq!(record.identity().ticker(), "SPY");
        assert_eq!(record.time(), t0());
    }
}
