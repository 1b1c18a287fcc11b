use dashmap::DashMap;
use std::sync::Arc;

use super::{Stock, Symbol};

/// Global stock cache
pub static STOCKS: std::sync::LazyLock<StockStore> = std::sync::LazyLock::new(StockStore::new);

pub struct StockStore {
    inner: DashMap<Symbol, Arc<Stock>>,
}

impl StockStore {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Arc<Stock>> {
        self.inner.get(symbol).map(|r| Arc::clone(r.value()))
    }

    pub fn insert(&self, stock: Stock) {
        let symbol = stock.symbol.clone();
        self.inner.insert(symbol, Arc::new(stock));
    }

    /// Modify stock data (atomic operation)
    pub fn modify<F>(&self, symbol: Symbol, f: F)
    where
        F: FnOnce(&mut Stock),
    {
        let mut entry = self
            .inner
            .entry(symbol.clone())
            .or_insert_with(|| Arc::new(Stock::new(symbol)));
        f(Arc::make_mut(entry.value_mut()));
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for StockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modify_creates_then_updates() {
        let store = StockStore::new();
        let symbol = Symbol::new("NVDA");
        store.modify(symbol.clone(), |s| s.name = "NVIDIA".to_string());
        store.modify(symbol.clone(), |s| s.name.push_str(" Corp"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&symbol).unwrap().name, "NVIDIA Corp");
        store.clear();
        assert!(store.is_empty());
    }
}
