//! Errors raised while building profiles and simulating races.

use thiserror::Error;

use crate::rating::Axis;

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("{0}")]
    InsufficientData(#[from] InsufficientData),

    #[error("{0}")]
    NoHistoricalData(#[from] NoHistoricalData),

    #[error("{0}")]
    InvalidConfig(#[from] InvalidConfig),

    #[error("{0}")]
    Unfinished(#[from] Unfinished),
}

/// A quantile bucket or a matched cohort came up empty, or the data yielded an unusable profile.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("insufficient data{}{}: {reason}", participant_suffix(.participant), axis_suffix(.axis))]
pub struct InsufficientData {
    pub participant: Option<String>,
    pub axis: Option<Axis>,
    pub reason: String,
}
impl InsufficientData {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            participant: None,
            axis: None,
            reason: reason.into(),
        }
    }

    pub fn on_axis(mut self, axis: Axis) -> Self {
        self.axis = Some(axis);
        self
    }

    pub fn for_participant(mut self, participant: impl Into<String>) -> Self {
        self.participant = Some(participant.into());
        self
    }
}

fn participant_suffix(participant: &Option<String>) -> String {
    participant
        .as_ref()
        .map(|participant| format!(" for {participant}"))
        .unwrap_or_default()
}

fn axis_suffix(axis: &Option<Axis>) -> String {
    axis.as_ref()
        .map(|axis| format!(" ({axis})"))
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("no historical data for {participant}")]
pub struct NoHistoricalData {
    pub participant: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid configuration: {0}")]
pub struct InvalidConfig(pub String);

#[derive(Debug, Clone, PartialEq, Error)]
#[error("race did not complete within {ticks} ticks")]
pub struct Unfinished {
    pub ticks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_display() {
        assert_eq!(
            "insufficient data: 7 values",
            InsufficientData::new("7 values").to_string()
        );
        assert_eq!(
            "insufficient data for Seabiscuit (Endurance): no cohort shares rating 3",
            InsufficientData::new("no cohort shares rating 3")
                .on_axis(Axis::Endurance)
                .for_participant("Seabiscuit")
                .to_string()
        );
    }

    #[test]
    fn race_error_wraps() {
        let err: RaceError = InvalidConfig("no entrants".into()).into();
        assert_eq!("invalid configuration: no entrants", err.to_string());
        assert!(matches!(err, RaceError::InvalidConfig(_)));
    }
}
