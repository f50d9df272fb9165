//! Valuation ratios and reference values from the quote summary.

use serde::{Deserialize, Serialize};

/// Per-ticker fundamentals. Every field is optional; absent values render as "N/A".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub market_cap: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub forward_pe: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub forward_eps: Option<f64>,
    pub eps_ttm: Option<f64>,
    pub peg_ratio: Option<f64>,
    pub price_to_book: Option<f64>,
    pub short_percent_of_float: Option<f64>,
    pub average_volume: Option<f64>,
    pub previous_close: Option<f64>,
}

impl Fundamentals {
    /// Trailing P/E, else forward P/E.
    pub fn pe_ratio(&self) -> Option<f64> {
        self.trailing_pe.or(self.forward_pe)
    }

    /// Trailing EPS, else forward EPS, else trailing-twelve-month EPS.
    pub fn eps(&self) -> Option<f64> {
        self.trailing_eps.or(self.forward_eps).or(self.eps_ttm)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
