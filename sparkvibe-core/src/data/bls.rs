//! Bureau of Labor Statistics public API v2 client for CPI series.
//!
//! Series are requested in batches of ten with `calculations` enabled so the
//! response carries 12-month percent changes directly. A batch that fails is
//! logged and skipped; the caller decides whether enough categories came back.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::cpi::{category_for_series, round1, CpiError, CpiObservation, CATEGORIES};

const BLS_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";
const BATCH_SIZE: usize = 10;
/// Years of history requested before the current one.
const YEARS_BACK: i32 = 2;

#[derive(Debug, Serialize)]
struct BlsRequest<'a> {
    seriesid: Vec<&'a str>,
    startyear: String,
    endyear: String,
    calculations: bool,
    annualaverage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct BlsResponse {
    status: String,
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    #[serde(default)]
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID")]
    series_id: String,
    #[serde(default)]
    data: Vec<BlsDataPoint>,
}

#[derive(Debug, Deserialize)]
struct BlsDataPoint {
    year: String,
    period: String,
    calculations: Option<BlsCalculations>,
}

#[derive(Debug, Deserialize)]
struct BlsCalculations {
    #[serde(default)]
    pct_changes: BTreeMap<String, String>,
}

/// Observations from every batch that succeeded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BlsFetch {
    pub observations: Vec<CpiObservation>,
    /// Categories with at least one usable observation.
    pub categories: usize,
}

pub struct BlsClient {
    client: reqwest::blocking::Client,
    registration_key: Option<String>,
}

impl BlsClient {
    pub fn new(registration_key: Option<String>) -> Result<Self, CpiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CpiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            registration_key,
        })
    }

    /// Fetch every CPI category from `today.year() - 2` through this year.
    pub fn fetch(&self, today: NaiveDate) -> Result<BlsFetch, CpiError> {
        let series_ids: Vec<&str> = CATEGORIES.iter().map(|c| c.series_id).collect();
        let mut observations = Vec::new();
        let mut last_error = None;

        for batch in series_ids.chunks(BATCH_SIZE) {
            match self.fetch_batch(batch, today.year()) {
                Ok(mut obs) => observations.append(&mut obs),
                Err(e) => {
                    tracing::warn!(error = %e, series = batch.len(), "BLS batch failed");
                    last_error = Some(e);
                }
            }
        }

        if observations.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        let categories = observations
            .iter()
            .map(|o| o.category.as_str())
            .collect::<HashSet<_>>()
            .len();
        tracing::info!(categories, observations = observations.len(), "fetched BLS CPI data");
        Ok(BlsFetch {
            observations,
            categories,
        })
    }

    fn fetch_batch(&self, series: &[&str], year: i32) -> Result<Vec<CpiObservation>, CpiError> {
        let request = BlsRequest {
            seriesid: series.to_vec(),
            startyear: (year - YEARS_BACK).to_string(),
            endyear: year.to_string(),
            calculations: true,
            annualaverage: false,
            registrationkey: self.registration_key.as_deref(),
        };

        let resp = self
            .client
            .post(BLS_URL)
            .json(&request)
            .send()
            .map_err(|e| CpiError::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CpiError::Http(status.as_u16()));
        }
        let body = resp.text().map_err(|e| CpiError::Network(e.to_string()))?;
        parse_response(&body)
    }
}

/// Parse a BLS v2 response body into observations.
///
/// Only monthly periods `M01`..`M12` with a 12-month percent change are kept;
/// unknown series ids and malformed points are skipped.
pub fn parse_response(body: &str) -> Result<Vec<CpiObservation>, CpiError> {
    let resp: BlsResponse =
        serde_json::from_str(body).map_err(|e| CpiError::Format(e.to_string()))?;
    if resp.status != "REQUEST_SUCCEEDED" {
        return Err(CpiError::Rejected(resp.message.join("; ")));
    }
    let results = resp
        .results
        .ok_or_else(|| CpiError::Format("missing Results".into()))?;

    let mut observations = Vec::new();
    for series in results.series {
        let Some(category) = category_for_series(&series.series_id) else {
            tracing::debug!(series = %series.series_id, "ignoring unknown BLS series");
            continue;
        };
        for point in series.data {
            if let Some(obs) = parse_point(category.name, &point) {
                observations.push(obs);
            }
        }
    }
    Ok(observations)
}

fn parse_point(category: &str, point: &BlsDataPoint) -> Option<CpiObservation> {
    let month: u32 = point.period.strip_prefix('M')?.parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    let year: i32 = point.year.parse().ok()?;
    let rate: f64 = point
        .calculations
        .as_ref()?
        .pct_changes
        .get("12")?
        .parse()
        .ok()?;
    Some(CpiObservation {
        month: NaiveDate::from_ymd_opt(year, month, 1)?,
        category: category.to_string(),
        rate: round1(rate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "status": "REQUEST_SUCCEEDED",
        "responseTime": 143,
        "message": [],
        "Results": {
            "series": [
                {
                    "seriesID": "CUUR0000SA0",
                    "data": [
                        {"year": "2024", "period": "M07", "periodName": "July", "value": "314.540",
                         "calculations": {"net_changes": {}, "pct_changes": {"1": "0.1", "3": "0.2", "6": "1.4", "12": "2.94"}}},
                        {"year": "2024", "period": "M13", "periodName": "Annual", "value": "313.0",
                         "calculations": {"pct_changes": {"12": "3.0"}}},
                        {"year": "2024", "period": "M06", "periodName": "June", "value": "314.175",
                         "calculations": {"pct_changes": {"1": "0.0"}}}
                    ]
                },
                {
                    "seriesID": "CUUR0000SETB01",
                    "data": [
                        {"year": "2024", "period": "M07", "value": "3.5",
                         "calculations": {"pct_changes": {"12": "-2.16"}}}
                    ]
                },
                {
                    "seriesID": "CUUR9999XXXX",
                    "data": [
                        {"year": "2024", "period": "M07", "value": "1.0",
                         "calculations": {"pct_changes": {"12": "9.9"}}}
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn parses_monthly_twelve_month_changes() {
        let obs = parse_response(SAMPLE).unwrap();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].category, "All Items");
        assert_eq!(obs[0].month, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(obs[0].rate, 2.9);
        assert_eq!(obs[1].category, "Gasoline");
        assert_eq!(obs[1].rate, -2.2);
    }

    #[test]
    fn rejected_request_is_an_error() {
        let body = r#"{"status":"REQUEST_NOT_PROCESSED","message":["daily threshold reached"]}"#;
        match parse_response(body) {
            Err(CpiError::Rejected(msg)) => assert!(msg.contains("threshold")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn garbage_is_a_format_error() {
        assert!(matches!(parse_response("<html>"), Err(CpiError::Format(_))));
    }

    #[test]
    fn request_body_shape() {
        let req = BlsRequest {
            seriesid: vec!["CUUR0000SA0"],
            startyear: "2022".into(),
            endyear: "2024".into(),
            calculations: true,
            annualaverage: false,
            registrationkey: None,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["seriesid"][0], "CUUR0000SA0");
        assert_eq!(json["calculations"], true);
        assert!(json.get("registrationkey").is_none());
    }
}
