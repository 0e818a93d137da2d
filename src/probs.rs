//! Utilities for working with samples, distributions and fractions.

use std::fmt::{Display, Formatter};

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

pub trait SliceExt {
    fn sum(&self) -> f64;
    fn mean(&self) -> f64;

    /// Sample standard deviation (`n - 1` denominator). Fewer than two samples have no
    /// dispersion, yielding `0`.
    fn stdev(&self) -> f64;
    fn min(&self) -> f64;
}
impl SliceExt for [f64] {
    fn sum(&self) -> f64 {
        self.iter().sum()
    }

    fn mean(&self) -> f64 {
        self.sum() / self.len() as f64
    }

    fn stdev(&self) -> f64 {
        if self.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let sum_sq: f64 = self.iter().map(|value| (value - mean).powi(2)).sum();
        (sum_sq / (self.len() - 1) as f64).sqrt()
    }

    fn min(&self) -> f64 {
        self.iter().copied().fold(f64::INFINITY, f64::min)
    }
}

/// Least-squares slope of `ys` against `xs`. `None` if fewer than two distinct `xs`.
pub fn slope(xs: &[f64], ys: &[f64]) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return None;
    }
    let (x_mean, y_mean) = (xs.mean(), ys.mean());
    let (mut covariance, mut variance) = (0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        covariance += (x - x_mean) * (y - y_mean);
        variance += (x - x_mean).powi(2);
    }
    if variance == 0.0 {
        None
    } else {
        Some(covariance / variance)
    }
}

/// A normal distribution that degenerates to its mean when `stdev` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub stdev: f64,
}
impl Gaussian {
    pub fn point(mean: f64) -> Self {
        Self { mean, stdev: 0.0 }
    }

    pub fn of(samples: &[f64]) -> Self {
        Self {
            mean: samples.mean(),
            stdev: samples.stdev(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.mean.is_finite() && self.stdev.is_finite() && self.stdev >= 0.0
    }

    #[inline]
    pub fn sample(&self, rng: &mut impl Rng) -> f64 {
        debug_assert!(self.is_valid(), "invalid distribution {self:?}");
        if self.stdev == 0.0 {
            return self.mean;
        }
        match Normal::new(self.mean, self.stdev) {
            Ok(normal) => normal.sample(rng),
            Err(_) => self.mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fraction {
    pub numerator: u64,
    pub denominator: u64,
}
impl Fraction {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn quotient(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Probability implied by fractional odds of `numerator` to `denominator` against.
    pub fn implied_prob(&self) -> f64 {
        self.denominator as f64 / (self.numerator + self.denominator) as f64
    }

    /// The same ratio in lowest terms.
    pub fn reduced(&self) -> Self {
        match gcd(self.numerator, self.denominator) {
            0 => self.clone(),
            divisor => Self::new(self.numerator / divisor, self.denominator / divisor),
        }
    }
}

/// Greatest common divisor; `gcd(0, 0) == 0`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl Display for Fraction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.numerator, self.denominator)
    }
}
