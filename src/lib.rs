//! Monte Carlo estimation of fractional win odds for horse races.
//!
//! Each entrant is either rated 1–8 on speed, consistency and endurance against a cohort of
//! historical runners at the race distance, or described by its own past runs. Races are
//! simulated tick by tick from the resulting motion profiles, and win tallies over many
//! trials are quantized into traditional fractional odds.

pub mod distance;
pub mod error;
pub mod file;
pub mod mc;
pub mod odds;
pub mod participant;
pub mod print;
pub mod probs;
pub mod profile;
pub mod race;
pub mod rating;
pub mod track;
pub mod units;

#[cfg(test)]
pub(crate) mod testing;

#[doc = include_str!("../README.md")]
#[cfg(doc)]
fn readme() {}
