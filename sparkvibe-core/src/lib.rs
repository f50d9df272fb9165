//! SparkVibe Core — market dashboard domain types, indicators and data sources.
//!
//! This crate contains everything the dashboard derives per poll:
//! - Domain records (bars, watch-list entries, fundamentals, ticker snapshots)
//! - Rolling moving averages and golden/death cross detection
//! - Volume ratio and weekly volume trend
//! - The earnings-date resolution chain
//! - Display formatting for currency, volume and percentages
//! - Providers: Yahoo Finance, BLS CPI, and a seeded mock for development mode

pub mod analysis;
pub mod cpi;
pub mod data;
pub mod domain;
pub mod earnings;
pub mod format;
pub mod indicators;
pub mod watchlist;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the TUI worker sends across threads is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::WatchEntry>();
        require_sync::<domain::WatchEntry>();
        require_send::<domain::Fundamentals>();
        require_sync::<domain::Fundamentals>();
        require_send::<domain::TickerSnapshot>();
        require_sync::<domain::TickerSnapshot>();
        require_send::<earnings::ResolvedEarnings>();
        require_sync::<earnings::ResolvedEarnings>();
        require_send::<cpi::CpiDataset>();
        require_sync::<cpi::CpiDataset>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::MockProvider>();
        require_sync::<data::MockProvider>();
    }

    /// The provider trait is object-safe so the poller can hold `&dyn MarketDataProvider`.
    #[test]
    fn provider_trait_is_object_safe() {
        fn _check(provider: &dyn data::MarketDataProvider) -> bool {
            provider.is_available()
        }
    }
}
