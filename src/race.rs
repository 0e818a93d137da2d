//! Configuration and tick-by-tick simulation of a single race.

use anyhow::bail;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{InvalidConfig, RaceError, Unfinished};
use crate::participant::{Entrant, Horse, Ratings};
use crate::profile::{BuildProfile, ParticipantProfile};
use crate::track::Track;
use crate::units;

/// Ticks after which a race that has not completed is abandoned.
pub const DEFAULT_MAX_TICKS: u64 = 10_000;

pub const MIN_RANDOM_ENTRANTS: usize = 4;
pub const MAX_RANDOM_ENTRANTS: usize = 20;

/// Distances (m) a random race is drawn from.
pub const RANDOM_DISTANCES: [f64; 6] = [1000.0, 1200.0, 1400.0, 1600.0, 1650.0, 1800.0];

const RANDOM_NAMES: [&str; 24] = [
    "Aristides",
    "Omar Khayyam",
    "Exterminator",
    "Sir Barton",
    "Gallant Fox",
    "Omaha",
    "War Admiral",
    "Whirlaway",
    "Count Fleet",
    "Assault",
    "Citation",
    "Swaps",
    "Iron Liege",
    "Tim Tam",
    "Carry Back",
    "Northern Dancer",
    "Secretariat",
    "Seattle Slew",
    "Affirmed",
    "Spectacular Bid",
    "Sunday Silence",
    "Funny Cide",
    "Barbaro",
    "American Pharoah",
];

fn default_max_ticks() -> u64 {
    DEFAULT_MAX_TICKS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    pub entrants: Vec<Entrant>,

    #[serde(deserialize_with = "units::deserialize_distance")]
    pub distance: f64,

    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}
impl RaceConfig {
    pub fn new(entrants: Vec<Entrant>, distance: f64) -> Self {
        Self {
            entrants,
            distance,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// A race of `entrants` synthetic participants with random ratings over a random
    /// standard distance. Between [MIN_RANDOM_ENTRANTS] and [MAX_RANDOM_ENTRANTS] entrants
    /// are drawn when `entrants` is `None`.
    pub fn random(rng: &mut impl Rng, entrants: Option<usize>) -> anyhow::Result<Self> {
        let count = match entrants {
            Some(count) if count == 0 || count > RANDOM_NAMES.len() => {
                bail!("a random race has between 1 and {} entrants", RANDOM_NAMES.len())
            }
            Some(count) => count,
            None => rng.gen_range(MIN_RANDOM_ENTRANTS..=MAX_RANDOM_ENTRANTS),
        };
        let names: Vec<_> = RANDOM_NAMES.choose_multiple(rng, count).copied().collect();
        let entrants = names
            .into_iter()
            .map(|name| Entrant::synthetic(name, Ratings::random(rng)))
            .collect();
        let distance = RANDOM_DISTANCES.choose(rng).copied().unwrap_or(RANDOM_DISTANCES[0]);
        Ok(Self::new(entrants, distance))
    }

    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.entrants.is_empty() {
            return Err(InvalidConfig("a race needs at least one entrant".into()));
        }
        if !self.distance.is_finite() || self.distance <= 0.0 {
            return Err(InvalidConfig(format!("distance must be positive, got {}", self.distance)));
        }
        if self.max_ticks == 0 {
            return Err(InvalidConfig("max_ticks must be positive".into()));
        }
        let mut names = FxHashSet::default();
        for entrant in &self.entrants {
            if !names.insert(entrant.name.as_str()) {
                return Err(InvalidConfig(format!("duplicate entrant {}", entrant.name)));
            }
        }
        Ok(())
    }

    /// Validates the configuration and builds every entrant's profile against `track`.
    pub fn prepare(&self, track: &Track) -> Result<Race, RaceError> {
        self.validate()?;
        if track.distance() != self.distance {
            return Err(InvalidConfig(format!(
                "track is for {}m, race is over {}m",
                track.distance(),
                self.distance
            ))
            .into());
        }
        let profiles = self
            .entrants
            .iter()
            .map(|entrant| entrant.build_profile(track))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "prepared a race of {} entrants over {}m",
            self.entrants.len(),
            self.distance
        );
        Ok(Race {
            names: self.entrants.iter().map(|entrant| entrant.name.clone()).collect(),
            profiles,
            distance: self.distance,
            max_ticks: self.max_ticks,
        })
    }
}

/// A race whose entrants' profiles have been built, ready to be run any number of times.
#[derive(Debug, Clone)]
pub struct Race {
    names: Vec<String>,
    profiles: Vec<ParticipantProfile>,
    distance: f64,
    max_ticks: u64,
}
impl Race {
    pub fn new(names: Vec<String>, profiles: Vec<ParticipantProfile>, distance: f64, max_ticks: u64) -> Self {
        debug_assert_eq!(names.len(), profiles.len());
        Self {
            names,
            profiles,
            distance,
            max_ticks,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn profiles(&self) -> &[ParticipantProfile] {
        &self.profiles
    }

    pub fn runners(&self) -> usize {
        self.profiles.len()
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// A horse per runner, to be reused across calls to [Race::run].
    pub fn horses(&self, rng: &mut impl Rng) -> Vec<Horse> {
        self.profiles
            .iter()
            .map(|profile| Horse::new(profile.sample(rng)))
            .collect()
    }

    pub fn simulate(&self, rng: &mut impl Rng) -> Result<RaceOutcome, Unfinished> {
        let mut horses = self.horses(rng);
        self.run(&mut horses, rng)
    }

    /// Runs the race once with freshly sampled strides. Horses crossing the line on the
    /// same tick are placed in order of position reached, then by entry order.
    pub fn run(&self, horses: &mut [Horse], rng: &mut impl Rng) -> Result<RaceOutcome, Unfinished> {
        debug_assert_eq!(self.runners(), horses.len());
        for (horse, profile) in horses.iter_mut().zip(&self.profiles) {
            horse.reset(profile.sample(rng));
        }

        let runners = horses.len();
        let mut finishers = Vec::with_capacity(runners);
        let mut crossing = Vec::with_capacity(runners);
        let mut tick = 0;
        while finishers.len() < runners {
            if tick == self.max_ticks {
                return Err(Unfinished { ticks: tick });
            }
            tick += 1;
            for horse in horses.iter_mut() {
                horse.advance(self.distance, rng);
            }

            crossing.extend(
                (0..runners).filter(|&runner| !horses[runner].is_finished() && horses[runner].position() >= self.distance),
            );
            crossing.sort_by(|&a, &b| horses[b].position().total_cmp(&horses[a].position()));
            for runner in crossing.drain(..) {
                horses[runner].finish();
                finishers.push(Finisher {
                    runner,
                    place: finishers.len() + 1,
                    tick,
                });
                trace!("{} finished {} at tick {tick}", self.names[runner], finishers.len());
            }
        }
        Ok(RaceOutcome { finishers })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finisher {
    /// Index of the runner in entry order.
    pub runner: usize,

    /// 1-based finishing place.
    pub place: usize,
    pub tick: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceOutcome {
    /// Runners in finishing order.
    pub finishers: Vec<Finisher>,
}
impl RaceOutcome {
    pub fn winner(&self) -> Option<usize> {
        self.finishers.first().map(|finisher| finisher.runner)
    }
}

/// Builds the race described by `config` on `track` and runs it once.
pub fn simulate(config: &RaceConfig, track: &Track, rng: &mut impl Rng) -> Result<RaceOutcome, RaceError> {
    let race = config.prepare(track)?;
    Ok(race.simulate(rng)?)
}
