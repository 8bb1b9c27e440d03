//! Audio feature vocabulary and the closed-interval ranges used as acceptance bands.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The eight audio features the recommender reasons about.
///
/// Variant order is the vocabulary order; blending walks features in this order
/// and [`FeatureRanges`] iterates in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFeature {
    Danceability,
    Energy,
    Loudness,
    Speechiness,
    Acousticness,
    Instrumentalness,
    Valence,
    Tempo,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 8] = [
        AudioFeature::Danceability,
        AudioFeature::Energy,
        AudioFeature::Loudness,
        AudioFeature::Speechiness,
        AudioFeature::Acousticness,
        AudioFeature::Instrumentalness,
        AudioFeature::Valence,
        AudioFeature::Tempo,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AudioFeature::Danceability => "danceability",
            AudioFeature::Energy => "energy",
            AudioFeature::Loudness => "loudness",
            AudioFeature::Speechiness => "speechiness",
            AudioFeature::Acousticness => "acousticness",
            AudioFeature::Instrumentalness => "instrumentalness",
            AudioFeature::Valence => "valence",
            AudioFeature::Tempo => "tempo",
        }
    }
}

impl fmt::Display for AudioFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audio feature: {0}")]
pub struct UnknownFeature(pub String);

impl FromStr for AudioFeature {
    type Err = UnknownFeature;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        AudioFeature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == raw)
            .ok_or_else(|| UnknownFeature(raw.to_string()))
    }
}

/// Closed interval `[min, max]` over one audio feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

/// Shorthand for the static range tables.
#[must_use]
pub const fn range(min: f64, max: f64) -> FeatureRange {
    FeatureRange { min, max }
}

impl FeatureRange {
    /// Builds a range, swapping the bounds when they arrive reversed.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Range union: the smallest interval covering both.
    #[must_use]
    pub fn union(self, other: FeatureRange) -> FeatureRange {
        FeatureRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Midpoint of each bound with `other`'s bound.
    #[must_use]
    pub fn midpoint_with(self, other: FeatureRange) -> FeatureRange {
        FeatureRange {
            min: (self.min + other.min) / 2.0,
            max: (self.max + other.max) / 2.0,
        }
    }
}

/// A static `feature -> range` table, as authored for axes and genres.
pub type RangeTable = &'static [(AudioFeature, FeatureRange)];

/// Mapping from feature to target range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRanges {
    ranges: BTreeMap<AudioFeature, FeatureRange>,
}

impl FeatureRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_table(table: &[(AudioFeature, FeatureRange)]) -> Self {
        let mut ranges = Self::new();
        ranges.assign_table(table);
        ranges
    }

    #[must_use]
    pub fn get(&self, feature: AudioFeature) -> Option<FeatureRange> {
        self.ranges.get(&feature).copied()
    }

    #[must_use]
    pub fn contains_feature(&self, feature: AudioFeature) -> bool {
        self.ranges.contains_key(&feature)
    }

    /// Overwrites whatever range the feature had.
    pub fn insert(&mut self, feature: AudioFeature, range: FeatureRange) {
        self.ranges.insert(feature, range);
    }

    /// Unions `range` into the existing entry, or inserts it when absent.
    pub fn merge(&mut self, feature: AudioFeature, range: FeatureRange) {
        self.ranges
            .entry(feature)
            .and_modify(|current| *current = current.union(range))
            .or_insert(range);
    }

    /// Key-wise overwrite with every entry of `table`.
    pub fn assign_table(&mut self, table: &[(AudioFeature, FeatureRange)]) {
        for &(feature, range) in table {
            self.insert(feature, range);
        }
    }

    /// Key-wise union with every entry of `table`.
    pub fn merge_table(&mut self, table: &[(AudioFeature, FeatureRange)]) {
        for &(feature, range) in table {
            self.merge(feature, range);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AudioFeature, FeatureRange)> + '_ {
        self.ranges.iter().map(|(feature, range)| (*feature, *range))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromIterator<(AudioFeature, FeatureRange)> for FeatureRanges {
    fn from_iter<I: IntoIterator<Item = (AudioFeature, FeatureRange)>>(iter: I) -> Self {
        Self {
            ranges: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(range(0.2, 0.4), range(0.3, 0.9))]
    #[case(range(0.6, 0.8), range(0.1, 0.2))]
    #[case(range(120.0, 140.0), range(60.0, 90.0))]
    #[case(range(0.5, 0.5), range(0.5, 0.5))]
    fn union_is_commutative_and_ordered(#[case] a: FeatureRange, #[case] b: FeatureRange) {
        let ab = a.union(b);
        let ba = b.union(a);
        assert_eq!(ab, ba);
        assert!(ab.min <= ab.max);
        assert!(ab.min <= a.min && ab.min <= b.min);
        assert!(ab.max >= a.max && ab.max >= b.max);
    }

    #[test]
    fn union_is_associative() {
        let a = range(0.2, 0.4);
        let b = range(0.5, 0.7);
        let c = range(0.1, 0.3);
        assert_eq!(a.union(b).union(c), a.union(b.union(c)));
        assert_eq!(a.union(b).union(c), range(0.1, 0.7));
    }

    #[test]
    fn new_swaps_reversed_bounds() {
        assert_eq!(FeatureRange::new(0.9, 0.1), range(0.1, 0.9));
    }

    #[test]
    fn contains_is_inclusive() {
        let band = range(0.6, 0.8);
        assert!(band.contains(0.6));
        assert!(band.contains(0.8));
        assert!(!band.contains(0.59));
        assert!(!band.contains(0.81));
    }

    #[test]
    fn assign_overwrites_and_merge_unions() {
        let mut ranges = FeatureRanges::new();
        ranges.assign_table(&[(AudioFeature::Energy, range(0.6, 0.8))]);
        ranges.merge_table(&[(AudioFeature::Energy, range(0.2, 0.4))]);
        assert_eq!(ranges.get(AudioFeature::Energy), Some(range(0.2, 0.8)));

        ranges.assign_table(&[(AudioFeature::Energy, range(0.5, 0.7))]);
        assert_eq!(ranges.get(AudioFeature::Energy), Some(range(0.5, 0.7)));
    }

    #[test]
    fn iteration_follows_vocabulary_order() {
        let ranges: FeatureRanges = [
            (AudioFeature::Tempo, range(90.0, 120.0)),
            (AudioFeature::Danceability, range(0.6, 0.8)),
            (AudioFeature::Valence, range(0.5, 0.7)),
        ]
        .into_iter()
        .collect();
        let order: Vec<_> = ranges.iter().map(|(feature, _)| feature).collect();
        assert_eq!(
            order,
            vec![
                AudioFeature::Danceability,
                AudioFeature::Valence,
                AudioFeature::Tempo
            ]
        );
    }

    #[test]
    fn feature_names_round_trip_through_from_str() {
        for feature in AudioFeature::ALL {
            assert_eq!(feature.as_str().parse::<AudioFeature>(), Ok(feature));
        }
        assert!("bpm".parse::<AudioFeature>().is_err());
    }
}
