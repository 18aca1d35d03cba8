//! Entry point: records in, identifier-tolerant table out.

use crate::domain::compat::Proxy;
use crate::domain::converter_config::ConverterConfig;
use crate::domain::error::TickframeError;
use crate::domain::identity::Identity;
use crate::domain::normalize::{normalize, normalize_slices, NormalizedRow};
use crate::domain::record::{Record, Slice};
use crate::domain::table_builder::{DuplicatePolicy, TableBuilder};
use crate::ports::symbol_port::SymbolResolver;
use crate::ports::tabular_port::TableEngine;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builds canonical (symbol, time) tables and wraps them for legacy callers.
///
/// The resolver is shared, not owned: registrations made through it after a
/// conversion are visible to every proxy that conversion returned. `E` is the
/// engine holding the table.
pub struct FrameConverter<E> {
    resolver: Arc<dyn SymbolResolver>,
    duplicates: DuplicatePolicy,
    engine: PhantomData<fn() -> E>,
}

impl<E: TableEngine> FrameConverter<E> {
    pub fn new(resolver: Arc<dyn SymbolResolver>) -> Self {
        Self {
            resolver,
            duplicates: DuplicatePolicy::default(),
            engine: PhantomData,
        }
    }

    /// Apply the duplicate policy and seed the resolver with configured tickers.
    pub fn with_config(resolver: Arc<dyn SymbolResolver>, config: &ConverterConfig) -> Self {
        for (ticker, identity) in &config.symbols {
            resolver.set(ticker, identity.clone());
        }
        tracing::debug!(
            symbols = config.symbols.len(),
            duplicates = %config.duplicates,
            "Configured frame converter"
        );
        Self {
            resolver,
            duplicates: config.duplicates,
            engine: PhantomData,
        }
    }

    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn resolver(&self) -> &Arc<dyn SymbolResolver> {
        &self.resolver
    }

    /// Register `ticker` from its unique form, e.g. `SPY EQUITY USA`.
    pub fn register(&self, ticker: &str, unique_form: &str) -> Result<Identity, TickframeError> {
        let identity: Identity = unique_form.parse()?;
        self.resolver.set(ticker, identity.clone());
        Ok(identity)
    }

    pub fn to_frame(&self, records: &[Record]) -> Result<Proxy<E>, TickframeError> {
        self.build(records.iter().map(normalize))
    }

    /// Same table as [`FrameConverter::to_frame`] over the slices' records in order.
    pub fn slices_to_frame(&self, slices: &[Slice]) -> Result<Proxy<E>, TickframeError> {
        self.build(normalize_slices(slices))
    }

    fn build(
        &self,
        rows: impl Iterator<Item = NormalizedRow>,
    ) -> Result<Proxy<E>, TickframeError> {
        let mut builder = TableBuilder::new(self.duplicates);
        for row in rows {
            builder.push(row);
        }
        let table = E::from_canonical(builder.finish()?)?;
        Ok(Proxy::new(table, Arc::clone(&self.resolver)))
    }
}
