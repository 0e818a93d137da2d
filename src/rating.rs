//! Ordinal 1–8 ratings and their derivation from a population by quantile partitioning.
//!
//! A population of samples is split into [BUCKETS] equal-frequency buckets with linearly
//! interpolated boundaries; the lowest bucket is rated 1 and the highest is rated 8.
//! Boundaries are recomputed from the population on every call.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use anyhow::bail;
use ordinalizer::Ordinal;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

use crate::error::InsufficientData;

pub const BUCKETS: usize = 8;

/// The three rated attributes of a synthetic participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display, Serialize, Deserialize)]
pub enum Axis {
    Speed,
    Consistency,
    Endurance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(BUCKETS as u8);

    pub fn number(number: u8) -> Self {
        Self::try_number(number).unwrap()
    }

    pub fn try_number(number: u8) -> anyhow::Result<Self> {
        if number < Self::MIN.0 || number > Self::MAX.0 {
            bail!("rating must be in the range {}..={}", Self::MIN, Self::MAX);
        }
        Ok(Self(number))
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self(rng.gen_range(Self::MIN.0..=Self::MAX.0))
    }

    pub fn as_number(&self) -> u8 {
        self.0
    }

    pub fn as_index(&self) -> usize {
        self.0 as usize - 1
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Rating {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::try_number(s.trim().parse()?)
    }
}

impl TryFrom<u8> for Rating {
    type Error = anyhow::Error;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Rating::try_number(number)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Rates each of `values` by the quantile bucket it falls into, where [Rating::MAX] is the
/// highest bucket. Fails if the population cannot form [BUCKETS] distinct, non-empty
/// buckets.
pub fn bucket(values: &[f64]) -> Result<Vec<Rating>, InsufficientData> {
    if values.len() < BUCKETS {
        return Err(InsufficientData::new(format!(
            "{} samples cannot fill {BUCKETS} buckets",
            values.len()
        )));
    }
    if values.iter().any(|value| !value.is_finite()) {
        return Err(InsufficientData::new("population contains non-finite samples"));
    }

    let edges = quantile_edges(values);
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(InsufficientData::new(format!(
            "{} samples do not have {BUCKETS} distinct quantiles",
            values.len()
        )));
    }

    let inner_edges = &edges[1..BUCKETS];
    let mut occupancy = [0usize; BUCKETS];
    let ratings: Vec<_> = values
        .iter()
        .map(|&value| {
            // buckets are right-closed; the lowest also admits its left edge
            let bin = inner_edges.partition_point(|&edge| edge < value);
            occupancy[bin] += 1;
            Rating(bin as u8 + 1)
        })
        .collect();

    if let Some(empty) = occupancy.iter().position(|&count| count == 0) {
        return Err(InsufficientData::new(format!(
            "bucket {} is empty",
            empty + 1
        )));
    }
    Ok(ratings)
}

/// Quantile boundaries `q0..=q8` by linear interpolation between order statistics.
fn quantile_edges(values: &[f64]) -> [f64; BUCKETS + 1] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let last = sorted.len() - 1;
    let mut edges = [0.0; BUCKETS + 1];
    for (index, edge) in edges.iter_mut().enumerate() {
        let position = last as f64 * index as f64 / BUCKETS as f64;
        let lower = position.floor() as usize;
        let upper = usize::min(lower + 1, last);
        let weight = position - lower as f64;
        *edge = sorted[lower] + weight * (sorted[upper] - sorted[lower]);
    }
    edges
}
