use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::types::ReviewRecord;

/// Count of reviews per star value. All five stars are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingDistribution([u64; 5]);

impl RatingDistribution {
    pub const STARS: std::ops::RangeInclusive<u8> = 1..=5;

    /// Count for `star`; zero for anything outside 1..=5.
    pub fn get(&self, star: u8) -> u64 {
        match star {
            1..=5 => self.0[usize::from(star - 1)],
            _ => 0,
        }
    }

    fn record(&mut self, star: u8) {
        self.0[usize::from(star - 1)] += 1;
    }

    /// `(star, count)` pairs in ascending star order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        Self::STARS.map(|star| (star, self.get(star)))
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn max(&self) -> u64 {
        self.0.iter().copied().max().unwrap_or(0)
    }
}

impl From<[u64; 5]> for RatingDistribution {
    fn from(counts: [u64; 5]) -> Self {
        Self(counts)
    }
}

impl Serialize for RatingDistribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(5))?;
        for (star, count) in self.iter() {
            map.serialize_entry(&star, &count)?;
        }
        map.end()
    }
}

/// Aggregated rating statistics for one batch of reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReviewStats {
    pub distribution: RatingDistribution,
    /// Records carrying a usable rating.
    pub total_count: u64,
    /// Records whose rating was absent.
    pub unrated_count: u64,
    /// `None` when there is nothing to average, never `0.0`.
    pub mean_rating: Option<f64>,
}

impl ReviewStats {
    /// Aggregates `records`. The result does not depend on record order.
    pub fn from_records(records: &[ReviewRecord]) -> Self {
        let mut distribution = RatingDistribution::default();
        let mut unrated_count = 0u64;
        let mut rating_sum = 0u64;

        for r in records {
            match r.rating {
                Some(star @ 1..=5) => {
                    distribution.record(star);
                    rating_sum += u64::from(star);
                }
                _ => unrated_count += 1,
            }
        }

        let total_count = distribution.total();
        let mean_rating = (total_count > 0).then(|| rating_sum as f64 / total_count as f64);

        ReviewStats {
            distribution,
            total_count,
            unrated_count,
            mean_rating,
        }
    }

    pub fn pct(part: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Percentage of rated reviews that gave `star` stars.
    pub fn share(&self, star: u8) -> f64 {
        Self::pct(self.distribution.get(star), self.total_count)
    }
}

/// Shorthand for [`ReviewStats::from_records`].
pub fn aggregate(records: &[ReviewRecord]) -> ReviewStats {
    ReviewStats::from_records(records)
}
