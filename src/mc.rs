//! Monte Carlo estimation of win odds by repeatedly running a race.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InvalidConfig, RaceError};
use crate::odds;
use crate::probs::Fraction;
use crate::race::{Race, RaceConfig};
use crate::track::Track;

pub const DEFAULT_TRIALS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OddsResult {
    pub name: String,
    pub wins: u64,
    pub odds: Fraction,
}

/// Estimated odds of every entrant, in entry order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsTable {
    pub trials: u64,
    pub results: Vec<OddsResult>,
}
impl OddsTable {
    pub fn get(&self, name: &str) -> Option<&OddsResult> {
        self.results.iter().find(|result| result.name == name)
    }

    /// Share of trials won by the entrant at `index`.
    pub fn win_rate(&self, index: usize) -> f64 {
        self.results[index].wins as f64 / self.trials as f64
    }
}

/// Runs a race for a fixed number of trials. Each trial draws from its own generator,
/// seeded from the engine's seed and the trial index, so serial and parallel estimates of
/// the same race agree exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonteCarloEngine {
    trials: u64,
    seed: u64,
}
impl Default for MonteCarloEngine {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            seed: 0,
        }
    }
}
impl MonteCarloEngine {
    pub fn with_trials(mut self, trials: u64) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn validate(&self) -> Result<(), InvalidConfig> {
        if self.trials == 0 {
            return Err(InvalidConfig("trials must be positive".into()));
        }
        Ok(())
    }

    fn trial_rng(&self, trial: u64) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(trial))
    }

    /// Wins of each runner over all trials.
    pub fn tally(&self, race: &Race) -> Result<Vec<u64>, RaceError> {
        self.validate()?;
        let mut tallies = vec![0; race.runners()];
        let mut horses = race.horses(&mut self.trial_rng(0));
        for trial in 0..self.trials {
            let outcome = race.run(&mut horses, &mut self.trial_rng(trial))?;
            if let Some(winner) = outcome.winner() {
                tallies[winner] += 1;
            }
        }
        Ok(tallies)
    }

    /// As [MonteCarloEngine::tally], with trials spread over the rayon thread pool.
    pub fn tally_parallel(&self, race: &Race) -> Result<Vec<u64>, RaceError> {
        self.validate()?;
        let winners = (0..self.trials)
            .into_par_iter()
            .map_init(
                || race.horses(&mut self.trial_rng(0)),
                |horses, trial| {
                    race.run(horses, &mut self.trial_rng(trial))
                        .map(|outcome| outcome.winner())
                },
            )
            .collect::<Result<Vec<_>, _>>()?;
        let mut tallies = vec![0; race.runners()];
        for winner in winners.into_iter().flatten() {
            tallies[winner] += 1;
        }
        Ok(tallies)
    }

    pub fn estimate(&self, race: &Race) -> Result<OddsTable, RaceError> {
        let start_time = Instant::now();
        let tallies = self.tally(race)?;
        debug!("{} trials took {:?}", self.trials, start_time.elapsed());
        Ok(self.tabulate(race, tallies))
    }

    pub fn estimate_parallel(&self, race: &Race) -> Result<OddsTable, RaceError> {
        let start_time = Instant::now();
        let tallies = self.tally_parallel(race)?;
        debug!(
            "{} trials took {:?} over {} threads",
            self.trials,
            start_time.elapsed(),
            rayon::current_num_threads()
        );
        Ok(self.tabulate(race, tallies))
    }

    /// Prepares the race described by `config` on `track` and estimates its odds.
    pub fn estimate_odds(&self, config: &RaceConfig, track: &Track) -> Result<OddsTable, RaceError> {
        self.estimate(&config.prepare(track)?)
    }

    fn tabulate(&self, race: &Race, tallies: Vec<u64>) -> OddsTable {
        let results = race
            .names()
            .iter()
            .zip(tallies)
            .map(|(name, wins)| OddsResult {
                name: name.clone(),
                wins,
                odds: odds::odds(wins, self.trials),
            })
            .collect();
        OddsTable {
            trials: self.trials,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::Unfinished;
    use crate::participant::{Entrant, Ratings};
    use crate::probs::Gaussian;
    use crate::profile::ParticipantProfile;
    use crate::race::DEFAULT_MAX_TICKS;
    use crate::testing::cohort_track;

    fn synthetic(name: &str, speed: u8, consistency: u8, endurance: u8) -> Entrant {
        Entrant::synthetic(name, Ratings::new(speed, consistency, endurance).unwrap())
    }

    fn field() -> RaceConfig {
        RaceConfig::new(
            vec![
                synthetic("Gallant Fox", 8, 6, 6),
                synthetic("Count Fleet", 5, 5, 5),
                synthetic("Tim Tam", 3, 4, 4),
                synthetic("Carry Back", 1, 2, 2),
            ],
            1200.0,
        )
    }

    #[test]
    fn tallies_sum_to_trials() {
        let track = cohort_track(1200.0);
        let race = field().prepare(&track).unwrap();
        let engine = MonteCarloEngine::default().with_trials(200).with_seed(3);
        let tallies = engine.tally(&race).unwrap();
        assert_eq!(200, tallies.iter().sum::<u64>());
    }

    #[test]
    fn serial_and_parallel_agree() {
        let track = cohort_track(1200.0);
        let race = field().prepare(&track).unwrap();
        let engine = MonteCarloEngine::default().with_trials(300).with_seed(17);
        assert_eq!(engine.estimate(&race).unwrap(), engine.estimate_parallel(&race).unwrap());
    }

    #[test]
    fn same_seed_same_odds() {
        let track = cohort_track(1200.0);
        let engine = MonteCarloEngine::default().with_seed(99);
        let first = engine.estimate_odds(&field(), &track).unwrap();
        let second = engine.estimate_odds(&field(), &track).unwrap();
        assert_eq!(first, second);
        assert_eq!(DEFAULT_TRIALS, first.trials);
    }

    #[test]
    fn fastest_is_favourite() {
        let track = cohort_track(1200.0);
        let table = MonteCarloEngine::default()
            .with_trials(500)
            .with_seed(5)
            .estimate_odds(&field(), &track)
            .unwrap();
        let favourite = table.get("Gallant Fox").unwrap();
        let outsider = table.get("Carry Back").unwrap();
        assert!(favourite.wins > outsider.wins, "{table:?}");
        assert!(favourite.odds.implied_prob() > outsider.odds.implied_prob(), "{table:?}");
        assert!(table.win_rate(0) > 0.25, "{table:?}");
    }

    #[test]
    fn sole_entrant_is_odds_on() {
        let race = Race::new(
            vec!["Exterminator".into()],
            vec![ParticipantProfile {
                velocity: Gaussian::point(16.0),
                step_stdev: Gaussian::point(0.5),
                min_step_stdev: 0.0,
                fatigue: Gaussian::point(0.5),
            }],
            1000.0,
            DEFAULT_MAX_TICKS,
        );
        let table = MonteCarloEngine::default().estimate(&race).unwrap();
        assert_eq!(50, table.results[0].wins);
        assert_eq!(Fraction::new(1, 199), table.results[0].odds);
    }

    #[test]
    fn winless_entrant_is_long() {
        let profile = |velocity| ParticipantProfile {
            velocity: Gaussian::point(velocity),
            step_stdev: Gaussian::point(0.0),
            min_step_stdev: 0.0,
            fatigue: Gaussian::point(0.0),
        };
        let race = Race::new(
            vec!["Swaps".into(), "Iron Liege".into()],
            vec![profile(17.0), profile(14.0)],
            1000.0,
            DEFAULT_MAX_TICKS,
        );
        let table = MonteCarloEngine::default().estimate_parallel(&race).unwrap();
        assert_eq!(Fraction::new(1, 199), table.results[0].odds);
        assert_eq!(0, table.results[1].wins);
        assert_eq!(Fraction::new(65, 1), table.results[1].odds);
    }

    #[test]
    fn unfinished_trial_aborts_estimate() {
        let stalled = ParticipantProfile {
            velocity: Gaussian::point(0.0),
            step_stdev: Gaussian::point(0.0),
            min_step_stdev: 0.0,
            fatigue: Gaussian::point(0.0),
        };
        let race = Race::new(vec!["Omar Khayyam".into()], vec![stalled], 1000.0, 25);
        let engine = MonteCarloEngine::default().with_trials(8);
        assert!(matches!(
            engine.estimate(&race),
            Err(RaceError::Unfinished(Unfinished { ticks: 25 }))
        ));
        assert!(matches!(
            engine.estimate_parallel(&race),
            Err(RaceError::Unfinished(Unfinished { ticks: 25 }))
        ));
    }

    #[test]
    fn zero_trials_rejected() {
        let track = cohort_track(1200.0);
        let engine = MonteCarloEngine::default().with_trials(0);
        assert!(matches!(engine.estimate_odds(&field(), &track), Err(RaceError::InvalidConfig(_))));
    }
}
