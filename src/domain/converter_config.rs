//! Converter settings read from the `[table]` and `[symbols]` INI sections.

use crate::domain::error::TickframeError;
use crate::domain::identity::Identity;
use crate::domain::table_builder::DuplicatePolicy;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConverterConfig {
    pub duplicates: DuplicatePolicy,
    /// Ticker registrations seeded into the resolver, sorted by ticker.
    pub symbols: Vec<(String, Identity)>,
}

impl ConverterConfig {
    pub fn from_port(config: &dyn ConfigPort) -> Result<Self, TickframeError> {
        let duplicates = match config.get_string("table", "duplicates") {
            Some(raw) => raw
                .parse()
                .map_err(|reason| TickframeError::ConfigInvalid {
                    section: "table".into(),
                    key: "duplicates".into(),
                    reason,
                })?,
            None => DuplicatePolicy::default(),
        };

        let mut symbols = Vec::new();
        for (ticker, unique_form) in config.get_section("symbols") {
            let identity = unique_form
                .parse::<Identity>()
                .map_err(|e| TickframeError::ConfigInvalid {
                    section: "symbols".into(),
                    key: ticker.clone(),
                    reason: e.to_string(),
                })?;
            symbols.push((ticker, identity));
        }

        Ok(Self {
            duplicates,
            symbols,
        })
    }
}
