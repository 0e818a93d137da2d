//! Race entrants: how each one is described, and the state of each one during a race.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidConfig, NoHistoricalData, RaceError};
use crate::probs::Gaussian;
use crate::rating::{Axis, Rating};
use crate::units;

/// Distance from the finish (m) over which fatigue slows a runner.
pub const FINAL_STRETCH: f64 = 400.0;

/// Factor applied to the step stdev for every quarter of the race completed.
pub const STDEV_ESCALATION: f64 = 2.0;

/// Factor applied to fatigue for every quarter of the race completed.
pub const FATIGUE_ESCALATION: f64 = 1.1;

const QUARTERS: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratings {
    pub speed: Rating,
    pub consistency: Rating,
    pub endurance: Rating,
}
impl Ratings {
    pub fn new(speed: u8, consistency: u8, endurance: u8) -> anyhow::Result<Self> {
        Ok(Self {
            speed: Rating::try_number(speed)?,
            consistency: Rating::try_number(consistency)?,
            endurance: Rating::try_number(endurance)?,
        })
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            speed: Rating::random(rng),
            consistency: Rating::random(rng),
            endurance: Rating::random(rng),
        }
    }

    pub fn get(&self, axis: Axis) -> Rating {
        match axis {
            Axis::Speed => self.speed,
            Axis::Consistency => self.consistency,
            Axis::Endurance => self.endurance,
        }
    }
}

/// One past run of a data-backed participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(deserialize_with = "units::deserialize_distance")]
    pub distance: f64,

    #[serde(deserialize_with = "units::deserialize_race_time")]
    pub finish_time: f64,

    #[serde(default)]
    pub segment_times: Vec<f64>,
}
impl HistoricalRecord {
    pub fn new(distance: f64, finish_time: f64) -> Self {
        Self {
            distance,
            finish_time,
            segment_times: vec![],
        }
    }

    /// Mean speed over the run (m/s).
    pub fn speed(&self) -> f64 {
        self.distance / self.finish_time
    }
}

/// A non-empty series of a participant's past runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceHistory(Vec<HistoricalRecord>);
impl RaceHistory {
    pub fn try_new(participant: &str, records: Vec<HistoricalRecord>) -> Result<Self, RaceError> {
        if records.is_empty() {
            return Err(NoHistoricalData {
                participant: participant.to_string(),
            }
            .into());
        }
        if let Some(record) = records.iter().find(|record| {
            !(record.distance.is_finite()
                && record.distance > 0.0
                && record.finish_time.is_finite()
                && record.finish_time > 0.0)
        }) {
            return Err(InvalidConfig(format!(
                "invalid run {record:?} for {participant}"
            ))
            .into());
        }
        Ok(Self(records))
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.0
    }

    /// Distinct distances raced, in order of first appearance.
    pub fn distances(&self) -> Vec<f64> {
        let mut distances: Vec<f64> = Vec::new();
        for record in &self.0 {
            if !distances.contains(&record.distance) {
                distances.push(record.distance);
            }
        }
        distances
    }

    pub fn at(&self, distance: f64) -> impl Iterator<Item = &HistoricalRecord> {
        self.0.iter().filter(move |record| record.distance == distance)
    }
}

/// How an entrant's motion is derived: from ratings against a cohort, or from its own runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Synthetic(Ratings),
    DataBacked(RaceHistory),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Descriptor", into = "Descriptor")]
pub struct Entrant {
    pub name: String,
    pub form: Form,
}
impl Entrant {
    pub fn synthetic(name: impl Into<String>, ratings: Ratings) -> Self {
        Self {
            name: name.into(),
            form: Form::Synthetic(ratings),
        }
    }

    pub fn data_backed(name: impl Into<String>, records: Vec<HistoricalRecord>) -> Result<Self, RaceError> {
        let name = name.into();
        let history = RaceHistory::try_new(&name, records)?;
        Ok(Self {
            name,
            form: Form::DataBacked(history),
        })
    }
}

/// The wire form of an [Entrant]: exactly one of `ratings` or `historical_series`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Descriptor {
    name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ratings: Option<Ratings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    historical_series: Option<Vec<HistoricalRecord>>,
}

impl From<Entrant> for Descriptor {
    fn from(entrant: Entrant) -> Self {
        let (ratings, historical_series) = match entrant.form {
            Form::Synthetic(ratings) => (Some(ratings), None),
            Form::DataBacked(history) => (None, Some(history.0)),
        };
        Self {
            name: entrant.name,
            ratings,
            historical_series,
        }
    }
}

impl TryFrom<Descriptor> for Entrant {
    type Error = RaceError;

    fn try_from(descriptor: Descriptor) -> Result<Self, Self::Error> {
        match (descriptor.ratings, descriptor.historical_series) {
            (Some(ratings), None) => Ok(Entrant::synthetic(descriptor.name, ratings)),
            (None, Some(series)) => Entrant::data_backed(descriptor.name, series),
            _ => Err(InvalidConfig(format!(
                "{} must have exactly one of 'ratings' or 'historical_series'",
                descriptor.name
            ))
            .into()),
        }
    }
}

/// Motion parameters of one runner, sampled once per trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stride {
    /// Mean step (m per tick).
    pub velocity: f64,

    /// Step dispersion at the start of the race.
    pub stdev: f64,

    /// Step reduction in the final stretch at the start of the race.
    pub fatigue: f64,
}

/// Number of completed quarters of the race at `position`, capped at three; a quarter
/// boundary counts once it is reached.
#[inline]
pub fn quarters_completed(position: f64, distance: f64) -> i32 {
    let completed = (position * QUARTERS as f64 / distance).floor();
    (completed as i32).clamp(0, QUARTERS - 1)
}

/// A runner's state within a single race.
#[derive(Debug, Clone)]
pub struct Horse {
    stride: Stride,
    position: f64,
    finished: bool,
}
impl Horse {
    pub fn new(stride: Stride) -> Self {
        Self {
            stride,
            position: 0.0,
            finished: false,
        }
    }

    /// Prepares the horse for a new trial.
    pub fn reset(&mut self, stride: Stride) {
        self.stride = stride;
        self.position = 0.0;
        self.finished = false;
    }

    pub fn stride(&self) -> &Stride {
        &self.stride
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Moves the horse by one tick of a race over `distance`, returning the step taken.
    /// Each completed quarter doubles the step stdev and compounds fatigue by 10%. A
    /// finished horse stays put, and no step is negative.
    pub fn advance(&mut self, distance: f64, rng: &mut impl Rng) -> f64 {
        if self.finished {
            return 0.0;
        }
        let quarters = quarters_completed(self.position, distance);
        let gait = Gaussian {
            mean: self.stride.velocity,
            stdev: self.stride.stdev * STDEV_ESCALATION.powi(quarters),
        };
        let mut step = gait.sample(rng);
        if self.position >= distance - FINAL_STRETCH {
            step -= self.stride.fatigue * FATIGUE_ESCALATION.powi(quarters);
        }
        let step = f64::max(0.0, step);
        self.position += step;
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::probs::SliceExt;

    fn stride(velocity: f64, stdev: f64, fatigue: f64) -> Stride {
        Stride {
            velocity,
            stdev,
            fatigue,
        }
    }

    #[test]
    fn ratings_by_axis() {
        let ratings = Ratings::new(8, 3, 1).unwrap();
        assert_eq!(Rating::number(8), ratings.get(Axis::Speed));
        assert_eq!(Rating::number(3), ratings.get(Axis::Consistency));
        assert_eq!(Rating::number(1), ratings.get(Axis::Endurance));
        assert!(Ratings::new(9, 3, 1).is_err());
    }

    #[test]
    fn empty_history() {
        let err = Entrant::data_backed("Secretariat", vec![]).unwrap_err();
        assert!(matches!(err, RaceError::NoHistoricalData(_)));
        assert_eq!("no historical data for Secretariat", err.to_string());
    }

    #[test]
    fn invalid_history() {
        let err = Entrant::data_backed("Secretariat", vec![HistoricalRecord::new(1200.0, 0.0)]).unwrap_err();
        assert!(matches!(err, RaceError::InvalidConfig(_)));
    }

    #[test]
    fn history_distances() {
        let history = RaceHistory::try_new(
            "Secretariat",
            vec![
                HistoricalRecord::new(1400.0, 84.0),
                HistoricalRecord::new(1200.0, 71.0),
                HistoricalRecord::new(1400.0, 85.0),
            ],
        )
        .unwrap();
        assert_eq!(vec![1400.0, 1200.0], history.distances());
        assert_eq!(2, history.at(1400.0).count());
        assert_f64_near!(1200.0 / 71.0, history.records()[1].speed());
    }

    #[test]
    fn deserialize_synthetic() {
        let json = r#"{"name": "Whirlaway", "ratings": {"speed": 7, "consistency": 4, "endurance": 2}}"#;
        let entrant: Entrant = serde_json::from_str(json).unwrap();
        assert_eq!(Entrant::synthetic("Whirlaway", Ratings::new(7, 4, 2).unwrap()), entrant);
    }

    #[test]
    fn deserialize_data_backed() {
        let json = r#"{"name": "Citation", "historical_series": [
            {"distance": "6f", "finish_time": "1:10.45"},
            {"distance": 1400, "finish_time": 83.2}
        ]}"#;
        let entrant: Entrant = serde_json::from_str(json).unwrap();
        let Form::DataBacked(history) = &entrant.form else {
            panic!("expected a data-backed entrant, got {entrant:?}");
        };
        assert_eq!(1200.0, history.records()[0].distance);
        assert_float_absolute_eq!(70.45, history.records()[0].finish_time);
        assert_eq!(1400.0, history.records()[1].distance);
    }

    #[test]
    fn serialize_matches_descriptor() {
        let entrant = Entrant::synthetic("Whirlaway", Ratings::new(7, 4, 2).unwrap());
        let json = serde_json::to_string(&entrant).unwrap();
        assert_eq!(r#"{"name":"Whirlaway","ratings":{"speed":7,"consistency":4,"endurance":2}}"#, json);
        assert_eq!(entrant, serde_json::from_str(&json).unwrap());
    }

    #[test]
    fn deserialize_rejects_empty_series() {
        let json = r#"{"name": "Citation", "historical_series": []}"#;
        let err = serde_json::from_str::<Entrant>(json).unwrap_err();
        assert!(err.to_string().contains("no historical data for Citation"), "{err}");
    }

    #[test]
    fn deserialize_rejects_ambiguous() {
        let json = r#"{"name": "Citation"}"#;
        assert!(serde_json::from_str::<Entrant>(json).is_err());
    }

    #[test]
    fn quarters() {
        assert_eq!(0, quarters_completed(0.0, 1200.0));
        assert_eq!(0, quarters_completed(299.9, 1200.0));
        assert_eq!(1, quarters_completed(300.0, 1200.0));
        assert_eq!(2, quarters_completed(650.0, 1200.0));
        assert_eq!(3, quarters_completed(1199.0, 1200.0));
        assert_eq!(3, quarters_completed(1250.0, 1200.0));
    }

    #[test]
    fn advance_deterministic() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut horse = Horse::new(stride(16.0, 0.0, 0.5));
        assert_eq!(16.0, horse.advance(1000.0, &mut rng));
        assert_eq!(16.0, horse.position());

        // fatigue applies within the final stretch, escalated by two completed quarters
        horse.position = 600.0;
        let step = horse.advance(1000.0, &mut rng);
        assert_float_absolute_eq!(16.0 - 0.5 * 1.1 * 1.1, step);
    }

    #[test]
    fn advance_never_negative() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut horse = Horse::new(stride(0.5, 3.0, 2.0));
        let mut last = horse.position();
        for _ in 0..1_000 {
            horse.advance(1000.0, &mut rng);
            assert!(horse.position() >= last);
            last = horse.position();
        }
    }

    #[test]
    fn finished_stays_put() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut horse = Horse::new(stride(16.0, 1.0, 0.0));
        horse.advance(1000.0, &mut rng);
        horse.finish();
        let position = horse.position();
        assert_eq!(0.0, horse.advance(1000.0, &mut rng));
        assert_eq!(position, horse.position());
        assert!(horse.is_finished());
    }

    #[test]
    fn reset_clears_state() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut horse = Horse::new(stride(16.0, 1.0, 0.0));
        horse.advance(1000.0, &mut rng);
        horse.finish();
        horse.reset(stride(15.0, 0.5, 0.1));
        assert_eq!(0.0, horse.position());
        assert!(!horse.is_finished());
        assert_eq!(15.0, horse.stride().velocity);
    }

    #[test]
    fn escalation_spreads_late_steps() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut early = Vec::new();
        let mut late = Vec::new();
        for _ in 0..5_000 {
            let mut horse = Horse::new(stride(16.0, 0.5, 0.0));
            early.push(horse.advance(1000.0, &mut rng));
            horse.position = 760.0;
            late.push(horse.advance(1000.0, &mut rng));
        }
        assert_float_absolute_eq!(0.5, early.stdev(), 0.05);
        assert_float_absolute_eq!(4.0, late.stdev(), 0.4);
    }
}
