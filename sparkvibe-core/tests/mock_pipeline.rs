//! End-to-end: mock provider data through the snapshot builder.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use sparkvibe_core::analysis::{build_snapshot, AnalysisSettings};
use sparkvibe_core::data::{MarketDataProvider, MockProvider};
use sparkvibe_core::earnings::{EarningsEvidence, EarningsStatus};
use sparkvibe_core::watchlist::Watchlist;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, 10)
        .unwrap()
        .and_hms_opt(15, 30, 0)
        .unwrap()
}

#[test]
fn every_default_ticker_builds_a_snapshot() {
    let provider = MockProvider::new(2024, now());
    let watchlist = Watchlist::default_list();
    let end = now().date();
    let start = end - Duration::days(730);
    let settings = AnalysisSettings::default();

    for entry in watchlist.display_order() {
        let bars = provider.history(&entry.symbol, start, end).unwrap();
        let fundamentals = provider.fundamentals(&entry.symbol).unwrap();
        let evidence = if entry.kind.has_earnings() {
            provider.earnings_evidence(&entry.symbol).unwrap()
        } else {
            EarningsEvidence::default()
        };

        let snap = build_snapshot(entry, &bars, fundamentals, &evidence, now(), &settings).unwrap();
        assert_eq!(snap.symbol, entry.symbol);
        assert!(snap.ma_50.is_some(), "{} lacks MA50", entry.symbol);
        assert!(snap.ma_200.is_some(), "{} lacks MA200", entry.symbol);

        match snap.earnings {
            Some(e) => {
                assert!(entry.kind.has_earnings());
                assert_eq!(e.status, EarningsStatus::Upcoming);
            }
            None => assert!(!entry.kind.has_earnings()),
        }

        if let (Some(g), Some(d)) = (snap.golden_cross, snap.death_cross) {
            assert_ne!(g.days_ago, d.days_ago);
        }
    }
}

#[test]
fn snapshots_are_reproducible_for_a_seed() {
    let end = now().date();
    let start = end - Duration::days(400);
    let entry = Watchlist::default_list().get("NVDA").unwrap().clone();
    let build = || {
        let provider = MockProvider::new(99, now());
        let bars = provider.history("NVDA", start, end).unwrap();
        let f = provider.fundamentals("NVDA").unwrap();
        let ev = provider.earnings_evidence("NVDA").unwrap();
        build_snapshot(&entry, &bars, f, &ev, now(), &AnalysisSettings::default()).unwrap()
    };
    let a = build();
    let b = build();
    assert_eq!(a.price, b.price);
    assert_eq!(a.golden_cross, b.golden_cross);
    assert_eq!(a.earnings, b.earnings);
}
