//! Parsing of racing distances and race times as they appear on race cards.

use anyhow::{anyhow, bail, Context};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

pub const FURLONG: f64 = 200.0;
pub const MILE: f64 = 8.0 * FURLONG;
pub const YARD: f64 = MILE / 1760.0;

/// Parses a distance in metres from forms such as `1200`, `1200m`, `6f`, `5 1/2f`,
/// `1 1/16mi` or `1mi 70y`. A quantity without a unit is in metres.
pub fn parse_distance(s: &str) -> anyhow::Result<f64> {
    let lower = s.trim().to_ascii_lowercase();
    if lower.is_empty() {
        bail!("empty distance");
    }
    let mut rest = lower.as_str();
    let mut metres = 0.0;
    while !rest.is_empty() {
        let unit_start = rest
            .find(|c: char| c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let quantity = parse_quantity(&rest[..unit_start])
            .with_context(|| format!("invalid distance '{s}'"))?;
        let tail = &rest[unit_start..];
        let unit_end = tail
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(tail.len());
        let unit = match &tail[..unit_end] {
            "" | "m" | "metres" | "meters" => 1.0,
            "f" | "furlong" | "furlongs" => FURLONG,
            "mi" | "mile" | "miles" => MILE,
            "y" | "yd" | "yds" | "yards" => YARD,
            other => bail!("unknown unit '{other}' in distance '{s}'"),
        };
        metres += quantity * unit;
        rest = tail[unit_end..].trim_start();
    }
    if metres <= 0.0 {
        bail!("distance '{s}' must be positive");
    }
    Ok(metres)
}

/// A whole, decimal, fractional (`1/2`) or mixed (`5 1/2`) quantity.
fn parse_quantity(s: &str) -> anyhow::Result<f64> {
    let mut parts = s.split_whitespace().peekable();
    if parts.peek().is_none() {
        bail!("missing quantity");
    }
    let mut total = 0.0;
    for part in parts.take(2) {
        total += match part.split_once('/') {
            Some((numerator, denominator)) => {
                let denominator: f64 = denominator.parse()?;
                if denominator == 0.0 {
                    bail!("zero denominator in '{part}'");
                }
                numerator.parse::<f64>()? / denominator
            }
            None => part.parse::<f64>()?,
        };
    }
    if s.split_whitespace().count() > 2 {
        bail!("too many terms in '{}'", s.trim());
    }
    Ok(total)
}

/// Parses a race time in seconds from `m:ss.ff` or plain seconds, rounded to hundredths.
pub fn parse_race_time(s: &str) -> anyhow::Result<f64> {
    let trimmed = s.trim();
    let seconds = match trimmed.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: f64 = if minutes.is_empty() {
                0.0
            } else {
                minutes
                    .parse()
                    .map_err(|_| anyhow!("invalid minutes in race time '{s}'"))?
            };
            let seconds: f64 = seconds
                .parse()
                .map_err(|_| anyhow!("invalid seconds in race time '{s}'"))?;
            if seconds >= 60.0 {
                bail!("seconds out of range in race time '{s}'");
            }
            minutes * 60.0 + seconds
        }
        None => trimmed
            .parse()
            .map_err(|_| anyhow!("invalid race time '{s}'"))?,
    };
    if !seconds.is_finite() || seconds <= 0.0 {
        bail!("race time '{s}' must be positive");
    }
    Ok((seconds * 100.0).round() / 100.0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

pub fn deserialize_distance<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(metres) => Ok(metres),
        NumberOrText::Text(text) => parse_distance(&text).map_err(D::Error::custom),
    }
}

pub fn deserialize_race_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(seconds) => Ok(seconds),
        NumberOrText::Text(text) => parse_race_time(&text).map_err(D::Error::custom),
    }
}
