//! Mock market data for development mode.
//!
//! Every symbol gets its own RNG stream derived from the provider seed, so a
//! given seed always yields the same history, fundamentals and earnings date.
//! Prices random-walk through drift regimes so the moving averages actually
//! cross now and then.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Fundamentals};
use crate::earnings::EarningsEvidence;

/// Price used for symbols without a configured base.
pub const DEFAULT_BASE_PRICE: f64 = 100.0;

/// Typical price level per symbol.
pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "^VIX" => 20.5,
        "SPY" => 445.2,
        "QQQ" => 375.8,
        "AAPL" => 185.3,
        "MSFT" => 378.9,
        "AMZN" => 145.7,
        "GOOGL" => 138.4,
        "META" => 325.6,
        "TSLA" => 248.5,
        "NVDA" => 875.2,
        "AMD" => 142.8,
        "NFLX" => 485.3,
        "CRM" => 245.7,
        "GLD" => 185.4,
        "SLV" => 22.8,
        "BTC-USD" => 42_500.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

// Stream salts so each method draws from an independent sequence.
const PROFILE_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;
const HISTORY_STREAM: u64 = 0xbf58_476d_1ce4_e5b9;
const FUNDAMENTALS_STREAM: u64 = 0x94d0_49bb_1331_11eb;
const EARNINGS_STREAM: u64 = 0xd6e8_feb8_6659_fd93;

/// FNV-1a; stable across platforms and releases.
fn symbol_hash(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

/// Per-symbol constants shared by history and fundamentals.
struct Profile {
    /// Latest close, within ±5% of the base price.
    last_close: f64,
    /// Typical daily volume, 10M to 100M.
    base_volume: f64,
}

/// Seeded mock provider.
pub struct MockProvider {
    seed: u64,
    anchor: NaiveDateTime,
    missing: HashSet<String>,
}

impl MockProvider {
    /// `anchor` is the "now" earnings dates are generated relative to.
    pub fn new(seed: u64, anchor: NaiveDateTime) -> Self {
        Self {
            seed,
            anchor,
            missing: HashSet::new(),
        }
    }

    /// Symbols that answer like a delisted ticker.
    pub fn with_missing<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing.extend(symbols.into_iter().map(Into::into));
        self
    }

    fn rng(&self, symbol: &str, stream: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed ^ symbol_hash(symbol) ^ stream)
    }

    fn check(&self, symbol: &str) -> Result<(), DataError> {
        if self.missing.contains(symbol) {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(())
    }

    fn profile(&self, symbol: &str) -> Profile {
        let mut rng = self.rng(symbol, PROFILE_STREAM);
        let base = base_price(symbol);
        Profile {
            last_close: base * (1.0 + rng.gen_range(-0.05..0.05)),
            base_volume: rng.gen_range(10_000_000.0..100_000_000.0),
        }
    }
}

fn trading_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut d = start;
    while d <= end {
        if !matches!(d.weekday(), Weekday::Sat | Weekday::Sun) {
            days.push(d);
        }
        d += Duration::days(1);
    }
    days
}

/// Value present with probability `p`.
fn maybe(rng: &mut StdRng, p: f64, lo: f64, hi: f64) -> Option<f64> {
    let value = rng.gen_range(lo..hi);
    rng.gen_bool(p).then_some(value)
}

impl MarketDataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        self.check(symbol)?;
        let days = trading_days(start, end);
        if days.is_empty() {
            return Err(DataError::NoData {
                symbol: symbol.to_string(),
            });
        }

        let profile = self.profile(symbol);
        let mut rng = self.rng(symbol, HISTORY_STREAM);

        // Log-price walk with a drift that switches every 40-80 bars.
        let mut path = Vec::with_capacity(days.len());
        let mut level = 0.0_f64;
        let mut drift = 0.0_f64;
        let mut regime_left = 0_u32;
        for _ in &days {
            if regime_left == 0 {
                drift = rng.gen_range(-0.004..0.004);
                regime_left = rng.gen_range(40..80);
            }
            regime_left -= 1;
            level += drift + rng.gen_range(-0.02..0.02);
            path.push(level);
        }

        let last = path[path.len() - 1];
        let mut bars = Vec::with_capacity(days.len());
        let mut prev_close: Option<f64> = None;
        for (date, p) in days.into_iter().zip(path) {
            let close = profile.last_close * (p - last).exp();
            let open = prev_close.unwrap_or(close) * (1.0 + rng.gen_range(-0.01..0.01));
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = (profile.base_volume * rng.gen_range(0.5..2.0)) as u64;
            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
            prev_close = Some(close);
        }
        Ok(bars)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError> {
        self.check(symbol)?;
        let profile = self.profile(symbol);
        let mut rng = self.rng(symbol, FUNDAMENTALS_STREAM);

        let pct_change = rng.gen_range(-5.0..5.0);
        let previous_close = profile.last_close / (1.0 + pct_change / 100.0);

        Ok(Fundamentals {
            market_cap: Some(rng.gen_range(50e9..3e12)),
            trailing_pe: maybe(&mut rng, 0.9, 10.0, 35.0),
            forward_pe: None,
            trailing_eps: maybe(&mut rng, 0.9, 1.0, 15.0),
            forward_eps: None,
            eps_ttm: None,
            peg_ratio: maybe(&mut rng, 0.85, 0.5, 3.0),
            price_to_book: maybe(&mut rng, 0.9, 1.0, 8.0),
            short_percent_of_float: maybe(&mut rng, 0.8, 0.01, 0.15),
            average_volume: Some(profile.base_volume.round()),
            previous_close: Some(previous_close),
        })
    }

    fn earnings_evidence(&self, symbol: &str) -> Result<EarningsEvidence, DataError> {
        self.check(symbol)?;
        let mut rng = self.rng(symbol, EARNINGS_STREAM);
        let ahead = rng.gen_range(1..=90);
        Ok(EarningsEvidence {
            listed_dates: vec![self.anchor + Duration::days(ahead)],
            ..EarningsEvidence::default()
        })
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn span() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2022, 5, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        )
    }

    #[test]
    fn same_seed_same_history() {
        let (start, end) = span();
        let a = MockProvider::new(7, anchor()).history("AAPL", start, end).unwrap();
        let b = MockProvider::new(7, anchor()).history("AAPL", start, end).unwrap();
        assert_eq!(a, b);
        let c = MockProvider::new(8, anchor()).history("AAPL", start, end).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn history_skips_weekends_and_ends_near_base() {
        let (start, end) = span();
        let bars = MockProvider::new(1, anchor()).history("SPY", start, end).unwrap();
        assert!(bars.len() > 500);
        assert!(bars
            .iter()
            .all(|b| !matches!(b.date.weekday(), Weekday::Sat | Weekday::Sun)));
        let last = bars.last().unwrap().close;
        assert!((last / 445.2 - 1.0).abs() <= 0.05 + 1e-9);
        assert!(bars.iter().all(|b| b.low <= b.open.min(b.close)));
        assert!(bars.iter().all(|b| b.high >= b.open.max(b.close)));
    }

    #[test]
    fn unknown_symbol_uses_default_base() {
        assert_eq!(base_price("ZZZZ"), DEFAULT_BASE_PRICE);
        assert_eq!(base_price("BTC-USD"), 42_500.0);
    }

    #[test]
    fn fundamentals_ranges() {
        let f = MockProvider::new(3, anchor()).fundamentals("MSFT").unwrap();
        let cap = f.market_cap.unwrap();
        assert!((50e9..3e12).contains(&cap));
        let avg = f.average_volume.unwrap();
        assert!((10e6..=100e6).contains(&avg));
        if let Some(pe) = f.trailing_pe {
            assert!((10.0..35.0).contains(&pe));
        }
    }

    #[test]
    fn earnings_within_ninety_days() {
        let ev = MockProvider::new(5, anchor()).earnings_evidence("NVDA").unwrap();
        let date = ev.listed_dates[0];
        let ahead = (date - anchor()).num_days();
        assert!((1..=90).contains(&ahead));
    }

    #[test]
    fn missing_symbols_are_not_found() {
        let p = MockProvider::new(1, anchor()).with_missing(["LCID"]);
        let (start, end) = span();
        assert!(matches!(
            p.history("LCID", start, end),
            Err(DataError::SymbolNotFound { .. })
        ));
        assert!(p.history("RIVN", start, end).is_ok());
    }

    #[test]
    fn empty_range_is_no_data() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(); // Saturday
        let err = MockProvider::new(1, anchor()).history("AAPL", d, d).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }
}
