//! Per-race motion profiles of participants.
//!
//! A [ParticipantProfile] is built once per race from either the participant's ratings,
//! matched against the track's cohort, or from its own historical runs. Each trial then
//! draws a fresh [Stride] from the profile.

use rand::Rng;
use tracing::debug;

use crate::distance;
use crate::error::InsufficientData;
use crate::participant::{Entrant, Form, RaceHistory, Ratings, Stride};
use crate::probs::{slope, Gaussian, SliceExt};
use crate::rating::{bucket, Axis, Rating};
use crate::track::Track;

/// Sampled fatigue is clamped to `±FATIGUE_LIMIT`.
pub const FATIGUE_LIMIT: f64 = 2.0;

/// Fatigue assumed when a participant's history cannot express a trend over distance.
pub const NEUTRAL_FATIGUE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantProfile {
    /// Mean step per tick (m).
    pub velocity: Gaussian,

    /// Dispersion of the step per tick (m).
    pub step_stdev: Gaussian,

    /// Sampled step dispersion never goes below this.
    pub min_step_stdev: f64,

    /// Step reduction in the final stretch (m).
    pub fatigue: Gaussian,
}
impl ParticipantProfile {
    /// Every distribution must have a finite mean and a finite, non-negative stdev.
    pub fn validate(&self) -> Result<(), InsufficientData> {
        for (field, gaussian) in [
            ("velocity", &self.velocity),
            ("step stdev", &self.step_stdev),
            ("fatigue", &self.fatigue),
        ] {
            if !gaussian.is_valid() {
                return Err(InsufficientData::new(format!("invalid {field} {gaussian:?}")));
            }
        }
        if !(self.min_step_stdev.is_finite() && self.min_step_stdev >= 0.0) {
            return Err(InsufficientData::new(format!(
                "invalid min step stdev {}",
                self.min_step_stdev
            )));
        }
        Ok(())
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Stride {
        let velocity = self.velocity.sample(rng);
        let stdev = f64::max(self.min_step_stdev, self.step_stdev.sample(rng)).max(0.0);
        let fatigue = self
            .fatigue
            .sample(rng)
            .clamp(-FATIGUE_LIMIT, FATIGUE_LIMIT);
        Stride {
            velocity,
            stdev,
            fatigue,
        }
    }
}

pub trait BuildProfile {
    fn build_profile(&self, track: &Track) -> Result<ParticipantProfile, InsufficientData>;
}

impl BuildProfile for Ratings {
    fn build_profile(&self, track: &Track) -> Result<ParticipantProfile, InsufficientData> {
        let speed = matched_cohort(track, Axis::Speed, self.speed)?;
        let consistency = matched_cohort(track, Axis::Consistency, self.consistency)?;
        let endurance = matched_cohort(track, Axis::Endurance, self.endurance)?;
        Ok(ParticipantProfile {
            velocity: Gaussian::of(&speed),
            step_stdev: Gaussian::of(&consistency),
            min_step_stdev: consistency.min(),
            fatigue: Gaussian::of(&endurance),
        })
    }
}

/// Values of the cohort members sharing `rating` on `axis`. Cohorts are rated so that 8 is
/// best: fastest, least variable and least speed lost at the finish.
fn matched_cohort(track: &Track, axis: Axis, rating: Rating) -> Result<Vec<f64>, InsufficientData> {
    let cohort = track.cohort(axis);
    let merits: Vec<_> = cohort
        .iter()
        .map(|entry| match axis {
            Axis::Speed => entry.value,
            Axis::Consistency | Axis::Endurance => -entry.value,
        })
        .collect();
    let ratings = bucket(&merits).map_err(|err| err.on_axis(axis))?;
    let matched: Vec<_> = cohort
        .iter()
        .zip(ratings)
        .filter(|(_, cohort_rating)| *cohort_rating == rating)
        .map(|(entry, _)| entry.value)
        .collect();
    if matched.is_empty() {
        return Err(InsufficientData::new(format!("no cohort participant is rated {rating}")).on_axis(axis));
    }
    Ok(matched)
}

impl BuildProfile for RaceHistory {
    fn build_profile(&self, track: &Track) -> Result<ParticipantProfile, InsufficientData> {
        let distances = self.distances();
        let requested = track.distance();
        let resolved = distance::resolve(requested, &distances)
            .ok_or_else(|| InsufficientData::new("no runs to resolve a distance from"))?;
        let adjustment = distance::speed_adjustment(requested, resolved);
        let speeds: Vec<_> = self
            .at(resolved)
            .map(|record| record.speed() + adjustment)
            .collect();

        let groups: Vec<Vec<f64>> = distances
            .iter()
            .map(|&distance| self.at(distance).map(|record| record.speed()).collect())
            .collect();
        let group_stdevs: Vec<_> = groups.iter().map(|speeds| speeds.stdev()).collect();
        let group_means: Vec<_> = groups.iter().map(|speeds| speeds.mean()).collect();

        // a falling mean speed over longer distances is expressed as positive fatigue
        let fatigue = slope(&distances, &group_means)
            .map(|per_metre| -per_metre * 100.0)
            .unwrap_or(NEUTRAL_FATIGUE);

        Ok(ParticipantProfile {
            velocity: Gaussian::of(&speeds),
            step_stdev: Gaussian::of(&group_stdevs),
            min_step_stdev: group_stdevs.min(),
            fatigue: Gaussian::point(fatigue),
        })
    }
}

impl BuildProfile for Form {
    fn build_profile(&self, track: &Track) -> Result<ParticipantProfile, InsufficientData> {
        match self {
            Form::Synthetic(ratings) => ratings.build_profile(track),
            Form::DataBacked(history) => history.build_profile(track),
        }
    }
}

impl BuildProfile for Entrant {
    fn build_profile(&self, track: &Track) -> Result<ParticipantProfile, InsufficientData> {
        let profile = self
            .form
            .build_profile(track)
            .map_err(|err| err.for_participant(&self.name))?;
        profile
            .validate()
            .map_err(|err| err.for_participant(&self.name))?;
        debug!("profile for {}: {profile:?}", self.name);
        Ok(profile)
    }
}
