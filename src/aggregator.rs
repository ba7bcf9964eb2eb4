// Luggage Telemetry - Aggregation and status engine
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Telemetry aggregator
//!
//! Groups and filters any [`TimedRecord`] series by selection and time.
//! Under "All", valued records are averaged per time bucket; under a tag the
//! matching records come back one point per sample. Everything here is a pure
//! function of its inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::record::{Tag, TimedRecord};
use crate::selection::Selection;

/// One point of a chart series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Output of one aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Records matching the selection, timed or not.
    pub count: usize,
    /// Ascending by timestamp.
    pub series: Vec<SeriesPoint>,
    /// Matching records left out of `series` for lack of a timestamp.
    pub excluded_untimed: usize,
}

impl AggregateResult {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Round to `precision` decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Mean that does not depend on input order.
///
/// Values are summed in sorted order so any permutation of the same
/// multiset yields bit-identical results.
fn stable_mean(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}

/// Time-series aggregator.
#[derive(Debug, Clone)]
pub struct Aggregator {
    config: AggregationConfig,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(AggregationConfig::default())
    }
}

impl Aggregator {
    /// Create a new aggregator
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate `series` under `selection`.
    ///
    /// "All": `count` is every record; `series` holds the mean value per
    /// `bucket_secs` bucket. Tag: `count` is the matching records; `series`
    /// holds each matching valued record, stable-sorted by timestamp.
    pub fn aggregate<R: TimedRecord>(&self, series: &[R], selection: &Selection) -> AggregateResult {
        let matching = series.iter().filter(|r| selection.matches(r.tag()));

        let mut count = 0;
        let mut excluded_untimed = 0;
        let mut timed: Vec<(DateTime<Utc>, f64)> = Vec::new();
        for record in matching {
            count += 1;
            match record.timestamp() {
                None => excluded_untimed += 1,
                Some(ts) => {
                    if let Some(value) = record.value() {
                        timed.push((ts, value));
                    }
                }
            }
        }

        let series = match selection {
            Selection::All => self.bucket_means(timed),
            Selection::Tag(_) => {
                timed.sort_by_key(|(ts, _)| *ts);
                timed
                    .into_iter()
                    .map(|(timestamp, value)| SeriesPoint { timestamp, value })
                    .collect()
            }
        };

        AggregateResult {
            count,
            series,
            excluded_untimed,
        }
    }

    /// Count records per `timeline_bucket_secs` bucket.
    ///
    /// Each point's value is the number of matching timed records in that
    /// bucket; empty buckets are omitted.
    pub fn timeline<R: TimedRecord>(&self, series: &[R], selection: &Selection) -> AggregateResult {
        let width = i64::from(self.config.timeline_bucket_secs.max(1));
        let mut buckets: BTreeMap<i64, usize> = BTreeMap::new();
        let mut count = 0;
        let mut excluded_untimed = 0;

        for record in series.iter().filter(|r| selection.matches(r.tag())) {
            count += 1;
            match record.timestamp() {
                Some(ts) => *buckets.entry(bucket_start(ts, width)).or_insert(0) += 1,
                None => excluded_untimed += 1,
            }
        }

        let series = buckets
            .into_iter()
            .filter_map(|(start, n)| {
                Some(SeriesPoint {
                    timestamp: Utc.timestamp_opt(start, 0).single()?,
                    value: n as f64,
                })
            })
            .collect();

        AggregateResult {
            count,
            series,
            excluded_untimed,
        }
    }

    /// Value of the newest timed, valued record in the selection.
    ///
    /// Ties on timestamp go to the later record in input order.
    pub fn latest_value<R: TimedRecord>(&self, series: &[R], selection: &Selection) -> Option<f64> {
        series
            .iter()
            .filter(|r| selection.matches(r.tag()))
            .filter_map(|r| Some((r.timestamp()?, r.value()?)))
            .max_by_key(|(ts, _)| *ts)
            .map(|(_, value)| value)
    }

    /// Plain mean over every valued record in the selection, timed or not.
    pub fn mean_value<R: TimedRecord>(&self, series: &[R], selection: &Selection) -> Option<f64> {
        let mut values: Vec<f64> = series
            .iter()
            .filter(|r| selection.matches(r.tag()))
            .filter_map(|r| r.value())
            .collect();
        stable_mean(&mut values)
    }

    /// Record count per tag.
    pub fn count_by_tag<R: TimedRecord>(&self, series: &[R]) -> BTreeMap<Tag, usize> {
        let mut counts = BTreeMap::new();
        for record in series {
            *counts.entry(record.tag().clone()).or_insert(0) += 1;
        }
        counts
    }

    fn bucket_means(&self, timed: Vec<(DateTime<Utc>, f64)>) -> Vec<SeriesPoint> {
        let width = i64::from(self.config.bucket_secs.max(1));
        let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
        for (ts, value) in timed {
            buckets.entry(bucket_start(ts, width)).or_default().push(value);
        }

        buckets
            .into_iter()
            .filter_map(|(start, mut values)| {
                Some(SeriesPoint {
                    timestamp: Utc.timestamp_opt(start, 0).single()?,
                    value: stable_mean(&mut values)?,
                })
            })
            .collect()
    }
}

fn bucket_start(ts: DateTime<Utc>, width: i64) -> i64 {
    let secs = ts.timestamp();
    secs - secs.rem_euclid(width)
}
