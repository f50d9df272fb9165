use serde::{Deserialize, Serialize};

/// Broad asset kind of a watch-list ticker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Equity,
    Etf,
    Index,
    Crypto,
}

impl AssetKind {
    /// Only single-company equities report earnings.
    pub fn has_earnings(self) -> bool {
        matches!(self, AssetKind::Equity)
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Equity => "Equity",
            AssetKind::Etf => "ETF",
            AssetKind::Index => "Index",
            AssetKind::Crypto => "Crypto",
        }
    }
}

/// A ticker on the watch-list with its display name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchEntry {
    pub symbol: String,
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: AssetKind,
}

fn default_kind() -> AssetKind {
    AssetKind::Equity
}

impl WatchEntry {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            kind,
        }
    }
}
