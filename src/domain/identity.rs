//! Canonical instrument identity.
//!
//! An [`Identity`] names exactly one tradable instrument. Its display string is
//! the bare ticker; its unique form carries every disambiguating attribute and
//! can be parsed back without any registration:
//!
//! ```text
//! SPY EQUITY USA
//! ES FUTURE CME 20160219
//! SPY OPTION USA 20160219 C 192
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

const EXPIRY_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SecurityType {
    Equity,
    Forex,
    Crypto,
    Cfd,
    Future,
    Option,
    Custom,
}

impl SecurityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityType::Equity => "EQUITY",
            SecurityType::Forex => "FOREX",
            SecurityType::Crypto => "CRYPTO",
            SecurityType::Cfd => "CFD",
            SecurityType::Future => "FUTURE",
            SecurityType::Option => "OPTION",
            SecurityType::Custom => "CUSTOM",
        }
    }

    fn parse(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "EQUITY" => Some(SecurityType::Equity),
            "FOREX" => Some(SecurityType::Forex),
            "CRYPTO" => Some(SecurityType::Crypto),
            "CFD" => Some(SecurityType::Cfd),
            "FUTURE" => Some(SecurityType::Future),
            "OPTION" => Some(SecurityType::Option),
            "CUSTOM" => Some(SecurityType::Custom),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptionRight {
    Call,
    Put,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OptionContract {
    pub right: OptionRight,
    pub strike: Decimal,
}

/// Canonical, fully disambiguated instrument identifier.
///
/// Field order matters: the derived `Ord` sorts by ticker first, which is the
/// outer ordering of every table built by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identity {
    ticker: String,
    security_type: SecurityType,
    market: String,
    expiry: Option<NaiveDate>,
    contract: Option<OptionContract>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityParseError {
    #[error("empty identity string")]
    Empty,

    #[error("expected at least ticker, security type and market in {0:?}")]
    MissingParts(String),

    #[error("unknown security type {0:?}")]
    UnknownSecurityType(String),

    #[error("invalid expiry {0:?} (expected YYYYMMDD)")]
    InvalidExpiry(String),

    #[error("invalid option right {0:?} (expected C or P)")]
    InvalidRight(String),

    #[error("invalid strike {0:?}")]
    InvalidStrike(String),

    #[error("unexpected trailing data in {0:?}")]
    Trailing(String),
}

impl Identity {
    fn spot(ticker: &str, security_type: SecurityType, market: &str) -> Self {
        Self {
            ticker: ticker.to_uppercase(),
            security_type,
            market: market.to_uppercase(),
            expiry: None,
            contract: None,
        }
    }

    pub fn equity(ticker: &str, market: &str) -> Self {
        Self::spot(ticker, SecurityType::Equity, market)
    }

    pub fn forex(ticker: &str, market: &str) -> Self {
        Self::spot(ticker, SecurityType::Forex, market)
    }

    pub fn crypto(ticker: &str, market: &str) -> Self {
        Self::spot(ticker, SecurityType::Crypto, market)
    }

    pub fn cfd(ticker: &str, market: &str) -> Self {
        Self::spot(ticker, SecurityType::Cfd, market)
    }

    pub fn custom(ticker: &str, market: &str) -> Self {
        Self::spot(ticker, SecurityType::Custom, market)
    }

    pub fn future(ticker: &str, market: &str, expiry: NaiveDate) -> Self {
        Self {
            expiry: Some(expiry),
            ..Self::spot(ticker, SecurityType::Future, market)
        }
    }

    pub fn option(
        ticker: &str,
        market: &str,
        expiry: NaiveDate,
        right: OptionRight,
        strike: Decimal,
    ) -> Self {
        Self {
            expiry: Some(expiry),
            contract: Some(OptionContract {
                right,
                strike: strike.normalize(),
            }),
            ..Self::spot(ticker, SecurityType::Option, market)
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn security_type(&self) -> SecurityType {
        self.security_type
    }

    pub fn market(&self) -> &str {
        &self.market
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    pub fn contract(&self) -> Option<&OptionContract> {
        self.contract.as_ref()
    }

    /// Full stringified form; parses back to an equal identity.
    pub fn unique_id(&self) -> String {
        let mut id = format!("{} {} {}", self.ticker, self.security_type, self.market);
        if let Some(expiry) = self.expiry {
            id.push(' ');
            id.push_str(&expiry.format(EXPIRY_FORMAT).to_string());
        }
        if let Some(contract) = &self.contract {
            let right = match contract.right {
                OptionRight::Call => "C",
                OptionRight::Put => "P",
            };
            id.push_str(&format!(" {right} {}", contract.strike));
        }
        id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ticker)
    }
}

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let ticker = tokens.next().ok_or(IdentityParseError::Empty)?;
        let (Some(kind), Some(market)) = (tokens.next(), tokens.next()) else {
            return Err(IdentityParseError::MissingParts(s.to_string()));
        };
        let security_type = SecurityType::parse(kind)
            .ok_or_else(|| IdentityParseError::UnknownSecurityType(kind.to_string()))?;

        let mut identity = Identity::spot(ticker, security_type, market);

        if matches!(security_type, SecurityType::Future | SecurityType::Option) {
            let raw = tokens
                .next()
                .ok_or_else(|| IdentityParseError::MissingParts(s.to_string()))?;
            let expiry = NaiveDate::parse_from_str(raw, EXPIRY_FORMAT)
                .map_err(|_| IdentityParseError::InvalidExpiry(raw.to_string()))?;
            identity.expiry = Some(expiry);
        }

        if security_type == SecurityType::Option {
            let (Some(right), Some(strike)) = (tokens.next(), tokens.next()) else {
                return Err(IdentityParseError::MissingParts(s.to_string()));
            };
            let right = match right.to_uppercase().as_str() {
                "C" => OptionRight::Call,
                "P" => OptionRight::Put,
                _ => return Err(IdentityParseError::InvalidRight(right.to_string())),
            };
            let strike = Decimal::from_str(strike)
                .map_err(|_| IdentityParseError::InvalidStrike(strike.to_string()))?;
            identity.contract = Some(OptionContract {
                right,
                strike: strike.normalize(),
            });
        }

        if tokens.next().is_some() {
            return Err(IdentityParseError::Trailing(s.to_string()));
        }
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 2, 19).unwrap()
    }

    #[test]
    fn display_is_the_ticker() {
        assert_eq!(Identity::equity("spy", "usa").to_string(), "SPY");
    }

    #[test]
    fn unique_id_for_equity() {
        assert_eq!(Identity::equity("SPY", "usa").unique_id(), "SPY EQUITY USA");
    }

    #[test]
    fn unique_id_for_option() {
        let id = Identity::option("SPY", "usa", expiry(), OptionRight::Put, Decimal::new(1920, 1));
        assert_eq!(id.unique_id(), "SPY OPTION USA 20160219 P 192");
    }

    #[test]
    fn parse_recovers_every_security_type() {
        let ids = [
            Identity::equity("SPY", "usa"),
            Identity::forex("EURUSD", "oanda"),
            Identity::crypto("LTCUSD", "gdax"),
            Identity::future("ES", "cme", expiry()),
            Identity::option("SPY", "usa", expiry(), OptionRight::Call, Decimal::from(192)),
        ];
        for id in ids {
            assert_eq!(id.unique_id().parse::<Identity>().unwrap(), id);
        }
    }

    #[test]
    fn parse_rejects_bare_ticker() {
        assert_eq!(
            "SPY".parse::<Identity>(),
            Err(IdentityParseError::MissingParts("SPY".into()))
        );
    }

    #[test]
    fn parse_rejects_unknown_type() {
        assert!(matches!(
            "SPY BOND USA".parse::<Identity>(),
            Err(IdentityParseError::UnknownSecurityType(_))
        ));
    }

    #[test]
    fn parse_rejects_future_without_expiry() {
        assert!("ES FUTURE CME".parse::<Identity>().is_err());
        assert!(matches!(
            "ES FUTURE CME 2016-02-19".parse::<Identity>(),
            Err(IdentityParseError::InvalidExpiry(_))
        ));
    }

    #[test]
    fn parse_rejects_trailing_tokens() {
        assert!(matches!(
            "SPY EQUITY USA extra".parse::<Identity>(),
            Err(IdentityParseError::Trailing(_))
        ));
    }

    #[test]
    fn equality_needs_every_attribute() {
        assert_ne!(Identity::equity("SPY", "usa"), Identity::cfd("SPY", "usa"));
        assert_ne!(Identity::equity("SPY", "usa"), Identity::equity("SPY", "fxcm"));
        assert_ne!(
            Identity::future("ES", "cme", expiry()),
            Identity::future("ES", "cme", NaiveDate::from_ymd_opt(2016, 3, 18).unwrap())
        );
    }

    #[test]
    fn ordering_is_by_ticker_first() {
        let mut ids = vec![Identity::equity("SPY", "usa"), Identity::forex("EURUSD", "oanda")];
        ids.sort();
        assert_eq!(ids[0].ticker(), "EURUSD");
    }
}
