//! Symbol resolution port.

use crate::domain::identity::Identity;
use crate::domain::label::Label;

/// Maps legacy identifiers (raw tickers, unique-form strings) to identities.
///
/// Shared by every proxy derived from one conversion, so implementations
/// must be safe to read and write from several threads.
pub trait SymbolResolver: Send + Sync {
    /// `None` when the key cannot be resolved; never an error.
    fn resolve(&self, key: &Label) -> Option<Identity>;
    /// Register `ticker`, overwriting any earlier entry.
    fn set(&self, ticker: &str, identity: Identity);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
