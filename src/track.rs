//! Historical views of a racing distance and the per-participant cohorts derived from them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum::EnumCount;
use ordinalizer::Ordinal;
use tracing::debug;

use crate::distance;
use crate::probs::SliceExt;
use crate::rating::Axis;

/// Minimum number of qualifying runs at a distance for a participant to be part of a cohort.
pub const MIN_QUALIFYING_RUNS: usize = 10;

/// Sectional times at or above this many seconds are treated as recording errors.
pub const OUTLIER_SEGMENT_TIME: f64 = 50.0;

/// Number of fastest runs averaged into the grouped "top speed" metric.
pub const TOP_RUNS: usize = 3;

/// Length of a sectional segment (m).
pub const SECTION_LENGTH: f64 = 400.0;

/// A trailing partial section shorter than this is folded into the preceding one.
const SECTION_SLACK: f64 = 50.0;

/// One observed run of one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRun {
    pub participant_id: String,
    pub distance: f64,
    #[serde(default)]
    pub segment_times: Vec<f64>,
    pub finish_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedRow {
    pub participant_id: String,
    pub race_count: usize,

    /// Mean of the participant's fastest finish times (s).
    pub top_speed_avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UngroupedRow {
    pub participant_id: String,
    pub segment_times: Vec<f64>,
    pub finish_time: f64,
}

/// Queryable store of historical runs. Both views are restricted to participants with at
/// least [MIN_QUALIFYING_RUNS] runs at the queried distance.
pub trait HistoricalDataset {
    /// Distinct distances present in the dataset, in ascending order.
    fn distances(&self) -> anyhow::Result<Vec<f64>>;
    fn query_grouped(&self, distance: f64) -> anyhow::Result<Vec<GroupedRow>>;
    fn query_ungrouped(&self, distance: f64) -> anyhow::Result<Vec<UngroupedRow>>;
}

/// A [HistoricalDataset] over runs held in memory.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemoryDataset {
    pub runs: Vec<HistoricalRun>,
}
impl MemoryDataset {
    pub fn new(runs: Vec<HistoricalRun>) -> Self {
        Self { runs }
    }

    /// Qualifying runs at `distance`, grouped by participant and sorted by participant ID.
    fn qualifying(&self, distance: f64) -> Vec<(&str, Vec<&HistoricalRun>)> {
        let mut by_participant: FxHashMap<&str, Vec<&HistoricalRun>> = FxHashMap::default();
        for run in &self.runs {
            if run.distance == distance && !is_outlier(run) {
                by_participant
                    .entry(run.participant_id.as_str())
                    .or_default()
                    .push(run);
            }
        }
        let mut qualifying: Vec<_> = by_participant
            .into_iter()
            .filter(|(_, runs)| runs.len() >= MIN_QUALIFYING_RUNS)
            .collect();
        qualifying.sort_by(|a, b| a.0.cmp(b.0));
        qualifying
    }
}

fn is_outlier(run: &HistoricalRun) -> bool {
    run.segment_times
        .iter()
        .any(|&time| time >= OUTLIER_SEGMENT_TIME)
}

impl HistoricalDataset for MemoryDataset {
    fn distances(&self) -> anyhow::Result<Vec<f64>> {
        let mut distances: Vec<_> = self.runs.iter().map(|run| run.distance).collect();
        distances.sort_by(f64::total_cmp);
        distances.dedup();
        Ok(distances)
    }

    fn query_grouped(&self, distance: f64) -> anyhow::Result<Vec<GroupedRow>> {
        Ok(self
            .qualifying(distance)
            .into_iter()
            .map(|(participant_id, runs)| {
                let mut times: Vec<_> = runs.iter().map(|run| run.finish_time).collect();
                times.sort_by(f64::total_cmp);
                let top = &times[..usize::min(TOP_RUNS, times.len())];
                GroupedRow {
                    participant_id: participant_id.to_string(),
                    race_count: runs.len(),
                    top_speed_avg: top.mean(),
                }
            })
            .collect())
    }

    fn query_ungrouped(&self, distance: f64) -> anyhow::Result<Vec<UngroupedRow>> {
        Ok(self
            .qualifying(distance)
            .into_iter()
            .flat_map(|(_, runs)| runs)
            .map(|run| UngroupedRow {
                participant_id: run.participant_id.clone(),
                segment_times: run.segment_times.clone(),
                finish_time: run.finish_time,
            })
            .collect())
    }
}

/// One participant's aggregate along an [Axis]: speed (m/s), speed stdev (m/s) or
/// speed lost over the closing section (m/s).
#[derive(Debug, Clone, PartialEq)]
pub struct CohortEntry {
    pub participant_id: String,
    pub value: f64,
}

/// The track a race is run on, with the historical views at its cohort distance and the
/// cohorts derived from them. Built once per race and shared read-only between trials.
#[derive(Debug, Clone)]
pub struct Track {
    distance: f64,
    cohort_distance: f64,
    grouped: Vec<GroupedRow>,
    ungrouped: Vec<UngroupedRow>,
    cohorts: [Vec<CohortEntry>; Axis::COUNT],
}
impl Track {
    pub fn load(distance: f64, dataset: &impl HistoricalDataset) -> anyhow::Result<Self> {
        let grouped = dataset.query_grouped(distance)?;
        let ungrouped = dataset.query_ungrouped(distance)?;
        Ok(Self::new(distance, grouped, ungrouped))
    }

    /// Loads the cohorts from the dataset distance closest to `distance`, as chosen by
    /// [distance::resolve]. Cohort speeds are adjusted to the race distance. An empty dataset
    /// yields a [Track::bare] track.
    pub fn load_nearest(distance: f64, dataset: &impl HistoricalDataset) -> anyhow::Result<Self> {
        let available = dataset.distances()?;
        match distance::resolve(distance, &available) {
            Some(cohort_distance) => {
                let grouped = dataset.query_grouped(cohort_distance)?;
                let ungrouped = dataset.query_ungrouped(cohort_distance)?;
                Ok(Self::with_cohort_distance(distance, cohort_distance, grouped, ungrouped))
            }
            None => Ok(Self::bare(distance)),
        }
    }

    pub fn new(distance: f64, grouped: Vec<GroupedRow>, ungrouped: Vec<UngroupedRow>) -> Self {
        Self::with_cohort_distance(distance, distance, grouped, ungrouped)
    }

    /// A track at `distance` whose historical views were taken at `cohort_distance`.
    pub fn with_cohort_distance(
        distance: f64,
        cohort_distance: f64,
        grouped: Vec<GroupedRow>,
        ungrouped: Vec<UngroupedRow>,
    ) -> Self {
        let adjustment = distance::speed_adjustment(distance, cohort_distance);
        let cohorts = [
            speed_cohort(cohort_distance, adjustment, &grouped),
            consistency_cohort(cohort_distance, &ungrouped),
            endurance_cohort(cohort_distance, &ungrouped),
        ];
        debug!(
            "track {distance}m (cohorts at {cohort_distance}m): {} grouped rows, {} ungrouped rows, cohorts: speed {}, consistency {}, endurance {}",
            grouped.len(),
            ungrouped.len(),
            cohorts[Axis::Speed.ordinal()].len(),
            cohorts[Axis::Consistency.ordinal()].len(),
            cohorts[Axis::Endurance.ordinal()].len()
        );
        Self {
            distance,
            cohort_distance,
            grouped,
            ungrouped,
            cohorts,
        }
    }

    /// A track with no historical data; only data-backed participants can race on it.
    pub fn bare(distance: f64) -> Self {
        Self::new(distance, vec![], vec![])
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Distance of the historical runs behind the cohorts.
    pub fn cohort_distance(&self) -> f64 {
        self.cohort_distance
    }

    pub fn grouped(&self) -> &[GroupedRow] {
        &self.grouped
    }

    pub fn ungrouped(&self) -> &[UngroupedRow] {
        &self.ungrouped
    }

    pub fn cohort(&self, axis: Axis) -> &[CohortEntry] {
        &self.cohorts[axis.ordinal()]
    }
}

/// 1-based index of the closing sectional for a race of `distance`.
pub fn last_section(distance: f64) -> usize {
    let full = (distance / SECTION_LENGTH).floor() as usize;
    if distance % SECTION_LENGTH > SECTION_SLACK {
        full + 1
    } else {
        full
    }
}

fn speed_cohort(distance: f64, adjustment: f64, grouped: &[GroupedRow]) -> Vec<CohortEntry> {
    grouped
        .iter()
        .filter(|row| row.top_speed_avg > 0.0)
        .map(|row| CohortEntry {
            participant_id: row.participant_id.clone(),
            value: distance / row.top_speed_avg + adjustment,
        })
        .collect()
}

fn group_by_participant<'a>(
    ungrouped: &'a [UngroupedRow],
    mut f: impl FnMut(&UngroupedRow) -> Option<f64>,
) -> Vec<(&'a str, Vec<f64>)> {
    let mut groups: FxHashMap<&str, Vec<f64>> = FxHashMap::default();
    for row in ungrouped {
        if let Some(value) = f(row) {
            groups.entry(row.participant_id.as_str()).or_default().push(value);
        }
    }
    let mut groups: Vec<_> = groups.into_iter().collect();
    groups.sort_by(|a, b| a.0.cmp(b.0));
    groups
}

fn consistency_cohort(distance: f64, ungrouped: &[UngroupedRow]) -> Vec<CohortEntry> {
    group_by_participant(ungrouped, |row| {
        (row.finish_time > 0.0).then(|| distance / row.finish_time)
    })
    .into_iter()
    .filter(|(_, speeds)| speeds.len() > 1)
    .map(|(participant_id, speeds)| CohortEntry {
        participant_id: participant_id.to_string(),
        value: speeds.stdev(),
    })
    .collect()
}

fn endurance_cohort(distance: f64, ungrouped: &[UngroupedRow]) -> Vec<CohortEntry> {
    let last = last_section(distance);
    if last < 2 {
        return vec![];
    }
    group_by_participant(ungrouped, |row| {
        let second = *row.segment_times.get(1)?;
        let closing = *row.segment_times.get(last - 1)?;
        (second > 0.0 && closing > 0.0)
            .then(|| SECTION_LENGTH / second - SECTION_LENGTH / closing)
    })
    .into_iter()
    .map(|(participant_id, losses)| CohortEntry {
        participant_id: participant_id.to_string(),
        value: losses.mean(),
    })
    .collect()
}
