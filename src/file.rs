//! Reading of race cards and historical datasets.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde_json::from_reader;

/// Reads a JSON-encoded type from a given file `path`.
pub fn read_json<D: DeserializeOwned>(path: impl AsRef<Path>) -> Result<D, io::Error> {
    let file = File::open(path)?;
    Ok(from_reader(io::BufReader::new(file))?)
}

pub trait ReadJsonFile<D> {
    fn read_json_file(path: impl AsRef<Path>) -> anyhow::Result<D>;
}

impl<D: DeserializeOwned> ReadJsonFile<D> for D {
    fn read_json_file(path: impl AsRef<Path>) -> anyhow::Result<D> {
        let path = path.as_ref();
        read_json(path).with_context(|| format!("reading {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;

    use super::*;
    use crate::race::RaceConfig;
    use crate::track::MemoryDataset;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("furlong-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn read_race_card() {
        let path = temp_file(
            "card.json",
            r#"{"distance": 1400, "entrants": [{"name": "Assault", "ratings": {"speed": 2, "consistency": 3, "endurance": 4}}]}"#,
        );
        let config = RaceConfig::read_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(1400.0, config.distance);
        assert_eq!("Assault", config.entrants[0].name);
    }

    #[test]
    fn read_dataset() {
        let path = temp_file(
            "dataset.json",
            r#"{"runs": [{"participant_id": "p00", "distance": 1200, "segment_times": [24.1, 23.2, 24.0], "finish_time": 71.3}]}"#,
        );
        let dataset = MemoryDataset::read_json_file(&path).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(1, dataset.runs.len());
        assert_eq!(71.3, dataset.runs[0].finish_time);
    }

    #[test]
    fn missing_file() {
        let err = RaceConfig::read_json_file("/nonexistent/card.json").unwrap_err();
        assert!(err.to_string().starts_with("reading /nonexistent/card.json"), "{err}");
    }
}
