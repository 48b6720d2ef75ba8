//! Tiered snapshot retention
//!
//! Given the snapshots of a set, a retention policy and a reference date,
//! decide which snapshots to delete.
//!
//! # Algorithm
//!
//! Tiers are processed farthest-back first. Each tier `T[i]` defines a
//! boundary date `today - T[i].days`. A single forward scan over the sorted
//! identifiers cuts them into consecutive buckets: `bucket[i]` holds the
//! identifiers before `B[i]` that were not already taken by an earlier
//! bucket. Identifiers at or after the nearest boundary are never touched.
//!
//! - `bucket[0]` lies beyond the oldest window and is dropped entirely.
//! - `bucket[i]` for `i >= 1` is thinned to `T[i - 1].count` survivors,
//!   chosen at random. The cap of a bucket is the count of the tier one
//!   step farther back, so the count of the nearest tier is never used.
//!
//! The newest identifier overall is never returned.

use chrono::{Days, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{RetentionPolicy, RetentionTier, SnapshotId};

/// Snapshots that should be deleted to satisfy `policy` as of `today`
///
/// Survivors within a bucket are picked with the thread-local RNG, so the
/// exact selection differs between runs; only the counts are stable.
pub fn outdated(ids: &[SnapshotId], policy: &RetentionPolicy, today: NaiveDate) -> Vec<SnapshotId> {
    outdated_with_rng(ids, policy, today, &mut rand::thread_rng())
}

/// Same as [`outdated`] with an explicit source of randomness
pub fn outdated_with_rng<R: Rng + ?Sized>(
    ids: &[SnapshotId],
    policy: &RetentionPolicy,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<SnapshotId> {
    if ids.is_empty() || policy.is_empty() {
        return Vec::new();
    }

    let mut tiers: Vec<RetentionTier> = policy.tiers().to_vec();
    tiers.sort_by(|a, b| b.days.cmp(&a.days));

    let mut sorted = ids.to_vec();
    sorted.sort();
    let newest = sorted[sorted.len() - 1].clone();

    let cuts: Vec<String> = tiers.iter().map(|t| boundary(today, t.days)).collect();
    let buckets = partition(&sorted, &cuts);

    let mut marked: Vec<SnapshotId> = buckets[0]
        .iter()
        .filter(|id| **id != newest)
        .cloned()
        .collect();

    for (i, bucket) in buckets.iter().enumerate().skip(1) {
        let cap = tiers[i - 1].count as usize;
        let excess = bucket.len().saturating_sub(cap);
        if excess == 0 {
            continue;
        }

        let candidates: Vec<&SnapshotId> = bucket.iter().filter(|id| **id != newest).collect();
        let picked = candidates.choose_multiple(rng, excess.min(candidates.len()));
        marked.extend(picked.map(|id| (*id).clone()));
    }

    marked.sort();
    marked
}

/// ISO date `days` days before `today`
fn boundary(today: NaiveDate, days: u32) -> String {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
        .format("%Y-%m-%d")
        .to_string()
}

/// Cut `sorted` into consecutive runs, one per ascending boundary
///
/// Run `i` holds the identifiers left over from the previous runs that are
/// strictly less than `cuts[i]`. Whatever follows the last cut is not part
/// of any run.
fn partition<'a>(sorted: &'a [SnapshotId], cuts: &[String]) -> Vec<&'a [SnapshotId]> {
    let mut cursor = 0;
    cuts.iter()
        .map(|cut| {
            let start = cursor;
            while cursor < sorted.len() && sorted[cursor].as_str() < cut.as_str() {
                cursor += 1;
            }
            &sorted[start..cursor]
        })
        .collect()
}
