//! Retention tiers
//!
//! A tier reads "snapshots older than `days` days are thinned down to at
//! most `count` survivors". A policy is a list of tiers; callers supply them
//! in ascending order of `days`.

use serde::{Deserialize, Serialize};

/// One age/count rule of a retention policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTier {
    /// Age threshold in days
    pub days: u32,
    /// Number of snapshots to keep within the tier's window
    pub count: u32,
}

impl RetentionTier {
    pub fn new(days: u32, count: u32) -> Self {
        Self { days, count }
    }
}

/// An ordered list of retention tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetentionPolicy(Vec<RetentionTier>);

impl RetentionPolicy {
    pub fn new(tiers: Vec<RetentionTier>) -> Self {
        Self(tiers)
    }

    /// A policy with no tiers, which never outdates anything
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn tiers(&self) -> &[RetentionTier] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RetentionPolicy {
    /// 1 day, 6 days, 4 weeks, 24 weeks, 96 weeks
    fn default() -> Self {
        Self(vec![
            RetentionTier::new(1, 1),
            RetentionTier::new(6, 6),
            RetentionTier::new(4 * 7, 4),
            RetentionTier::new(4 * 7 * 6, 6),
            RetentionTier::new(4 * 7 * 12 * 2, 2),
        ])
    }
}
