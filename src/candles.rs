use std::{collections::HashMap, sync::RwLock};

use crate::data::{Candles, Resolution, Symbol, Timeframe};

/// Candles fetched during this session, so cycling the chart controls back to a window
/// already seen does not hit the backend again. Cleared on refresh.
pub static CANDLES: std::sync::LazyLock<CandleStore> = std::sync::LazyLock::new(CandleStore::new);

type StoreKey = (Symbol, Timeframe, Resolution);

#[derive(Debug, Default)]
pub struct CandleStore {
    inner: RwLock<HashMap<StoreKey, Candles>>,
}

impl CandleStore {
    fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        resolution: Resolution,
    ) -> Option<Candles> {
        let store = self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.get(&(symbol.clone(), timeframe, resolution)).cloned()
    }

    /// Merges `data` into the stored bars; a bar with a timestamp already present replaces it.
    pub fn update(
        &self,
        symbol: Symbol,
        timeframe: Timeframe,
        resolution: Resolution,
        data: Candles,
    ) {
        let mut store = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = store.entry((symbol, timeframe, resolution)).or_default();

        for candle in data {
            if let Some(existing) = entry.iter_mut().find(|c| c.timestamp == candle.timestamp) {
                *existing = candle;
            } else {
                entry.push(candle);
            }
        }

        entry.sort_by_key(|c| c.timestamp);
    }

    pub fn clear(&self) {
        let mut store = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        store.clear();
    }

    pub fn clear_symbol(&self, symbol: &Symbol) {
        let mut store = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        store.retain(|(s, _, _), _| s != symbol);
    }
}

/// UNIX-second bounds `(from, to)` of the look-back window ending at `now`.
pub fn window(timeframe: Timeframe, now: i64) -> (i64, i64) {
    (now - timeframe.seconds(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Candle;

    fn bar(timestamp: i64, close: f64) -> Candle {
        Candle {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0.0,
        }
    }

    #[test]
    fn update_merges_by_timestamp() {
        let store = CandleStore::new();
        let aapl = Symbol::new("AAPL");
        store.update(
            aapl.clone(),
            Timeframe::Month,
            Resolution::Day,
            vec![bar(200, 2.0), bar(100, 1.0)],
        );
        store.update(
            aapl.clone(),
            Timeframe::Month,
            Resolution::Day,
            vec![bar(200, 2.5), bar(300, 3.0)],
        );

        let candles = store
            .get(&aapl, Timeframe::Month, Resolution::Day)
            .unwrap();
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.0, 2.5, 3.0]);
        assert!(store.get(&aapl, Timeframe::Year, Resolution::Week).is_none());
    }

    #[test]
    fn clear_symbol_keeps_other_tickers() {
        let store = CandleStore::new();
        store.update(
            Symbol::new("AAPL"),
            Timeframe::Day,
            Resolution::Min5,
            vec![bar(1, 1.0)],
        );
        store.update(
            Symbol::new("MSFT"),
            Timeframe::Day,
            Resolution::Min5,
            vec![bar(1, 1.0)],
        );

        store.clear_symbol(&Symbol::new("AAPL"));
        assert!(store
            .get(&Symbol::new("AAPL"), Timeframe::Day, Resolution::Min5)
            .is_none());
        assert!(store
            .get(&Symbol::new("MSFT"), Timeframe::Day, Resolution::Min5)
            .is_some());

        store.clear();
        assert!(store
            .get(&Symbol::new("MSFT"), Timeframe::Day, Resolution::Min5)
            .is_none());
    }

    #[test]
    fn window_ends_now() {
        assert_eq!(window(Timeframe::Day, 1_000_000), (1_000_000 - 86_400, 1_000_000));
    }
}
