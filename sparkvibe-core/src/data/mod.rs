//! Data sources: Yahoo Finance for market data, BLS for CPI, and a seeded
//! mock for development mode.

pub mod bls;
pub mod circuit_breaker;
pub mod mock;
pub mod provider;
pub mod yahoo;

pub use bls::{BlsClient, BlsFetch};
pub use circuit_breaker::CircuitBreaker;
pub use mock::MockProvider;
pub use provider::{ConsoleProgress, DataError, MarketDataProvider, PollProgress, SilentProgress};
pub use yahoo::YahooProvider;
