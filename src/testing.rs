//! Testing helpers.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::probs::Gaussian;
use crate::race::RaceOutcome;
use crate::track::{last_section, HistoricalRun, MemoryDataset, Track, SECTION_LENGTH};

pub const COHORT_SIZE: usize = 40;
pub const COHORT_RUNS: usize = 12;

/// Runs of `participants` synthetic participants (IDs `p00`, `p01`, ...) at `distance`. Each
/// participant has a distinct pace, run-to-run wobble and closing fade, so every axis of the
/// cohort separates into distinct quantiles.
pub fn cohort_runs(participants: usize, runs: usize, distance: f64, seed: u64) -> Vec<HistoricalRun> {
    let mut rng = StdRng::seed_from_u64(seed);
    let sections = last_section(distance);
    let mut out = Vec::with_capacity(participants * runs);
    for participant in 0..participants {
        let pace = 15.0 + 0.05 * participant as f64;
        let wobble = Gaussian {
            mean: 0.0,
            stdev: 0.05 + 0.01 * ((participant * 7) % participants) as f64,
        };
        let fade = 0.2 + 0.03 * ((participant * 3) % participants) as f64;
        for _ in 0..runs {
            let speed = pace + wobble.sample(&mut rng);
            let segment_times = (0..sections)
                .map(|section| {
                    let section_speed = if section == 0 {
                        speed - 0.5
                    } else if section + 1 == sections {
                        speed - fade
                    } else {
                        speed + 0.2
                    };
                    SECTION_LENGTH / section_speed
                })
                .collect();
            out.push(HistoricalRun {
                participant_id: participant_id(participant),
                distance,
                segment_times,
                finish_time: distance / speed,
            });
        }
    }
    out
}

pub fn participant_id(participant: usize) -> String {
    format!("p{participant:02}")
}

/// A dataset holding a full cohort at each of the given distances.
pub fn cohort_dataset(distances: &[f64]) -> MemoryDataset {
    let runs = distances
        .iter()
        .enumerate()
        .flat_map(|(index, &distance)| cohort_runs(COHORT_SIZE, COHORT_RUNS, distance, index as u64))
        .collect();
    MemoryDataset::new(runs)
}

pub fn cohort_track(distance: f64) -> Track {
    Track::load(distance, &cohort_dataset(&[distance])).unwrap()
}

/// Asserts that places are exactly `1..=n` in finishing order, with non-decreasing ticks.
pub fn assert_places_contiguous(outcome: &RaceOutcome, runners: usize) {
    assert_eq!(runners, outcome.finishers.len(), "not all runners finished");
    let mut last_tick = 0;
    for (index, finisher) in outcome.finishers.iter().enumerate() {
        assert_eq!(index + 1, finisher.place, "unexpected place in {outcome:?}");
        assert!(finisher.tick >= last_tick, "ticks out of order in {outcome:?}");
        last_tick = finisher.tick;
    }
    let mut runners_seen: Vec<_> = outcome.finishers.iter().map(|finisher| finisher.runner).collect();
    runners_seen.sort();
    runners_seen.dedup();
    assert_eq!(runners, runners_seen.len(), "a runner finished more than once");
}
