//! CPI loading: live BLS data when enough categories come back, otherwise
//! the synthetic generator with a warning.

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sparkvibe_core::cpi::{generate_synthetic, CpiDataset, CpiError, CpiSource, MIN_LIVE_CATEGORIES};
use sparkvibe_core::data::{BlsClient, BlsFetch};

use crate::config::{DashboardConfig, DataMode};

const FALLBACK_NOTE: &str = "Using realistic mock data based on recent CPI trends.";

#[derive(Debug, Clone)]
pub struct CpiLoad {
    pub dataset: CpiDataset,
    /// Shown to the user when live data was requested but not used.
    pub warning: Option<String>,
}

impl CpiLoad {
    pub fn source_text(&self) -> String {
        match self.dataset.source {
            CpiSource::Live { categories } => format!(
                "Successfully fetched real CPI data from BLS API for {categories} categories"
            ),
            CpiSource::Synthetic => "Using synthetic CPI data".to_string(),
        }
    }
}

/// Load the CPI dataset for `today` according to the configured mode.
pub fn load_cpi(config: &DashboardConfig, today: NaiveDate) -> CpiLoad {
    let mut rng = match config.mock_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    match config.mode {
        DataMode::Mock => {
            tracing::info!("using synthetic CPI data");
            CpiLoad {
                dataset: generate_synthetic(today, &mut rng),
                warning: None,
            }
        }
        DataMode::Live => {
            let fetched = BlsClient::new(config.bls_key.clone()).and_then(|c| c.fetch(today));
            accept_live(fetched, today, &mut rng)
        }
    }
}

/// Keep a live fetch with at least [`MIN_LIVE_CATEGORIES`] categories,
/// otherwise fall back to synthetic data.
pub fn accept_live<R: Rng>(
    fetched: Result<BlsFetch, CpiError>,
    today: NaiveDate,
    rng: &mut R,
) -> CpiLoad {
    let warning = match fetched {
        Ok(fetch) if fetch.categories >= MIN_LIVE_CATEGORIES => {
            tracing::info!(categories = fetch.categories, "live CPI data accepted");
            return CpiLoad {
                dataset: CpiDataset::new(
                    fetch.observations,
                    CpiSource::Live {
                        categories: fetch.categories,
                    },
                ),
                warning: None,
            };
        }
        Ok(fetch) => {
            tracing::warn!(categories = fetch.categories, "too few CPI categories from BLS");
            format!("BLS API access limited or no data available. {FALLBACK_NOTE}")
        }
        Err(e) => {
            tracing::warn!(error = %e, "BLS fetch failed");
            format!("Error connecting to BLS API: {e}. {FALLBACK_NOTE}")
        }
    };

    CpiLoad {
        dataset: generate_synthetic(today, rng),
        warning: Some(warning),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sparkvibe_core::cpi::{latest_available_month, CpiObservation, CATEGORIES};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 20).unwrap()
    }

    fn live_fetch(categories: usize) -> BlsFetch {
        let month = latest_available_month(today());
        BlsFetch {
            observations: CATEGORIES[..categories]
                .iter()
                .map(|c| CpiObservation {
                    month,
                    category: c.name.to_string(),
                    rate: 3.0,
                })
                .collect(),
            categories,
        }
    }

    #[test]
    fn enough_categories_is_live() {
        let mut rng = StdRng::seed_from_u64(1);
        let load = accept_live(Ok(live_fetch(3)), today(), &mut rng);
        assert!(load.warning.is_none());
        assert_eq!(load.dataset.source, CpiSource::Live { categories: 3 });
        assert_eq!(load.dataset.latest_rows().len(), 3);
        assert!(load.source_text().contains("for 3 categories"));
    }

    #[test]
    fn too_few_categories_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let load = accept_live(Ok(live_fetch(2)), today(), &mut rng);
        assert_eq!(load.dataset.source, CpiSource::Synthetic);
        assert!(load.warning.unwrap().starts_with("BLS API access limited"));
        assert_eq!(load.dataset.latest_rows().len(), CATEGORIES.len());
    }

    #[test]
    fn transport_error_falls_back() {
        let mut rng = StdRng::seed_from_u64(1);
        let load = accept_live(
            Err(CpiError::Network("connection refused".into())),
            today(),
            &mut rng,
        );
        assert_eq!(load.dataset.source, CpiSource::Synthetic);
        let warning = load.warning.unwrap();
        assert!(warning.starts_with("Error connecting to BLS API:"));
        assert!(warning.contains("connection refused"));
    }

    #[test]
    fn mock_mode_never_touches_the_network() {
        let config = DashboardConfig {
            mode: DataMode::Mock,
            mock_seed: Some(7),
            ..DashboardConfig::default()
        };
        let load = load_cpi(&config, today());
        assert!(load.warning.is_none());
        assert_eq!(load.dataset.source, CpiSource::Synthetic);
        assert_eq!(
            load.dataset.latest_month(),
            Some(latest_available_month(today()))
        );
    }
}
