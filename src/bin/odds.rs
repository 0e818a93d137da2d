use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use furlong::file::ReadJsonFile;
use furlong::mc::{MonteCarloEngine, DEFAULT_TRIALS};
use furlong::print::{tabulate_odds, tabulate_outcome};
use furlong::race::RaceConfig;
use furlong::track::{MemoryDataset, Track};
use furlong::units::parse_distance;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file to source the historical runs from
    #[clap(short = 'd', long)]
    dataset: Option<PathBuf>,

    /// file to source the race card from
    #[clap(short = 'c', long)]
    card: Option<PathBuf>,

    /// generate a random race
    #[clap(short = 'r', long)]
    random: bool,

    /// number of entrants in a random race
    #[clap(long)]
    entrants: Option<usize>,

    /// race distance, e.g. 1200, 1200m, 6f or 1mi 70y
    #[clap(long, value_parser = parse_distance)]
    distance: Option<f64>,

    /// number of simulated trials
    #[clap(short = 't', long, default_value_t = DEFAULT_TRIALS)]
    trials: u64,

    /// seed for the random number generator
    #[clap(short = 's', long)]
    seed: Option<u64>,

    /// spread trials over all cores
    #[clap(short = 'p', long)]
    parallel: bool,

    /// print the outcome of one simulated race
    #[clap(long)]
    show_race: bool,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.card.is_none() && !self.random || self.card.is_some() && self.random {
            bail!("either the -c or the -r flag must be specified");
        }
        if self.entrants.is_some() && !self.random {
            bail!("--entrants applies to random races only");
        }
        if self.trials == 0 {
            bail!("at least one trial is required");
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut config = match &args.card {
        Some(path) => RaceConfig::read_json_file(path)?,
        None => RaceConfig::random(&mut rng, args.entrants)?,
    };
    if let Some(distance) = args.distance {
        config.distance = distance;
    }
    info!(
        "{} entrants over {}m, {} trials, seed {seed}",
        config.entrants.len(),
        config.distance,
        args.trials
    );

    let track = match &args.dataset {
        Some(path) => {
            let dataset = MemoryDataset::read_json_file(path)?;
            let track = Track::load_nearest(config.distance, &dataset)?;
            if track.cohort_distance() != config.distance {
                info!(
                    "no runs at {}m, cohorts taken from {}m",
                    config.distance,
                    track.cohort_distance()
                );
            }
            track
        }
        None => Track::bare(config.distance),
    };
    let race = config.prepare(&track)?;

    let engine = MonteCarloEngine::default()
        .with_trials(args.trials)
        .with_seed(seed);
    let table = if args.parallel {
        engine.estimate_parallel(&race)?
    } else {
        engine.estimate(&race)?
    };
    info!("\n{}", Console::default().render(&tabulate_odds(&table)));

    if args.show_race {
        let outcome = race.simulate(&mut rng)?;
        info!("\n{}", Console::default().render(&tabulate_outcome(&race, &outcome)));
    }
    Ok(())
}
