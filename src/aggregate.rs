use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use tracing::{debug, warn};

use crate::error::InvalidRecordError;
use crate::models::{AggregateResult, PerformanceTier, RankedEntry, ScoreRecord, TierCount};

pub const SCALE: f64 = 20.0;

/// Means closer than this are treated as equal when ranking.
const MEAN_RESOLUTION: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord<K> {
    pub entity_id: K,
    pub reason: InvalidRecordError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation<K> {
    pub results: Vec<AggregateResult<K>>,
    pub rejected: Vec<RejectedRecord<K>>,
}

/// Rescales `score / max_score` onto 0-20, clamped to that range.
pub fn normalize(score: f64, max_score: f64) -> Result<f64, InvalidRecordError> {
    if !max_score.is_finite() {
        return Err(InvalidRecordError::NonFiniteMax { max_score });
    }
    if !score.is_finite() {
        return Err(InvalidRecordError::NonFiniteScore { score });
    }
    if max_score <= 0.0 {
        return Err(InvalidRecordError::NonPositiveMax { max_score });
    }

    let normalized = score / max_score * SCALE;
    if !(0.0..=SCALE).contains(&normalized) {
        debug!(score, max_score, "score outside [0, max], clamping");
    }
    Ok(normalized.clamp(0.0, SCALE))
}

// Welford running mean/variance; equal inputs keep m2 at exactly zero.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn finish<K>(self, entity_id: K) -> AggregateResult<K> {
        let std_dev = if self.count < 2 {
            0.0
        } else {
            (self.m2.max(0.0) / self.count as f64).sqrt()
        };

        AggregateResult {
            entity_id,
            count: self.count,
            mean: self.mean.clamp(self.min, self.max),
            min: self.min,
            max: self.max,
            std_dev,
        }
    }
}

/// Groups records by entity and computes per-entity statistics, keeping
/// track of every record that had to be skipped.
pub fn aggregate_records<K>(records: &[ScoreRecord<K>]) -> Aggregation<K>
where
    K: Clone + Debug + Eq + Hash + Ord,
{
    let mut buckets: HashMap<&K, Accumulator> = HashMap::new();
    let mut rejected = Vec::new();

    for record in records {
        match normalize(record.score, record.max_score) {
            Ok(value) => buckets
                .entry(&record.entity_id)
                .or_insert_with(Accumulator::new)
                .push(value),
            Err(reason) => {
                warn!(entity = ?record.entity_id, %reason, "skipping invalid score record");
                rejected.push(RejectedRecord {
                    entity_id: record.entity_id.clone(),
                    reason,
                });
            }
        }
    }

    let mut results: Vec<AggregateResult<K>> = buckets
        .into_iter()
        .map(|(entity_id, acc)| acc.finish(entity_id.clone()))
        .collect();
    results.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));

    if results.is_empty() {
        debug!(records = records.len(), "no statistics available");
    }

    Aggregation { results, rejected }
}

pub fn compute_aggregates<K>(records: &[ScoreRecord<K>]) -> Vec<AggregateResult<K>>
where
    K: Clone + Debug + Eq + Hash + Ord,
{
    aggregate_records(records).results
}

fn mean_key(mean: f64) -> i64 {
    (mean / MEAN_RESOLUTION).round() as i64
}

fn ranking_order<K: Ord>(a: &AggregateResult<K>, b: &AggregateResult<K>) -> Ordering {
    mean_key(b.mean)
        .cmp(&mean_key(a.mean))
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Orders entities by mean (desc), count (desc), then id (asc) and numbers
/// them 1, 2, 3... with no shared ranks.
pub fn rank<K: Ord>(mut aggregates: Vec<AggregateResult<K>>) -> Vec<RankedEntry<K>> {
    aggregates.sort_by(ranking_order);
    aggregates
        .into_iter()
        .enumerate()
        .map(|(index, aggregate)| RankedEntry {
            tier: classify_performance(aggregate.mean),
            rank: index + 1,
            aggregate,
        })
        .collect()
}

/// | Mean (0-20) | Tier         |
/// |-------------|--------------|
/// | >= 16       | Excellent    |
/// | >= 14       | VeryGood     |
/// | >= 12       | Good         |
/// | >= 10       | Passable     |
/// | < 10        | Insufficient |
pub fn classify_performance(mean: f64) -> PerformanceTier {
    match mean {
        m if m >= 16.0 => PerformanceTier::Excellent,
        m if m >= 14.0 => PerformanceTier::VeryGood,
        m if m >= 12.0 => PerformanceTier::Good,
        m if m >= 10.0 => PerformanceTier::Passable,
        _ => PerformanceTier::Insufficient,
    }
}

pub fn tier_distribution<K>(ranked: &[RankedEntry<K>]) -> Vec<TierCount> {
    PerformanceTier::ALL
        .iter()
        .map(|&tier| TierCount {
            tier,
            count: ranked.iter().filter(|entry| entry.tier == tier).count(),
        })
        .collect()
}
