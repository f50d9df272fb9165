//! Domain records for the dashboard

pub mod bar;
pub mod fundamentals;
pub mod instrument;
pub mod snapshot;

pub use bar::{closes, Bar};
pub use fundamentals::Fundamentals;
pub use instrument::{AssetKind, WatchEntry};
pub use snapshot::TickerSnapshot;

/// Symbol type alias
pub type Symbol = String;
