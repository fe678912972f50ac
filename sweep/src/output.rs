//! Result files. One runtime and one energy file per host; an existing file
//! is never overwritten.

use csv;
use errors::*;
use orchestrator::SweepResult;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A file name under `dir` that does not exist yet: `<stem>__<host>.csv`, or
/// `<stem>__<host>__<timestamp>.csv` if that is taken.
pub fn fresh_path(dir: &Path, stem: &str, host: &str, timestamp: i64) -> PathBuf {
    let plain = dir.join(format!("{}__{}.csv", stem, host));
    if !plain.exists() {
        return plain;
    }
    dir.join(format!("{}__{}__{}.csv", stem, host, timestamp))
}

/// Writes `rows` with a header row.
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .chain_err(|| format!("failed to create {:?}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    info!("wrote {} rows to {:?}", rows.len(), path);
    Ok(())
}

/// Writes the runtime and energy rows of a sweep, returning both paths.
pub fn write_results(dir: &Path, host: &str, result: &SweepResult, timestamp: i64) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).chain_err(|| format!("failed to create {:?}", dir))?;
    let runtimes = fresh_path(dir, "results", host, timestamp);
    write_rows(&runtimes, &result.runtimes)?;
    let energy = fresh_path(dir, "results_energy", host, timestamp);
    write_rows(&energy, &result.energy)?;
    Ok((runtimes, energy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::{EnergyRecord, Phase, RuntimeRecord};
    use std::env;
    use std::fs::File;
    use std::io::Read;

    fn result() -> SweepResult {
        SweepResult {
            runtimes: vec![RuntimeRecord {
                core_count: 1,
                sort_variant: "Sequential std::sort".to_string(),
                dataset_size: 250_000_000,
                avg_runtime_s: 20.5,
            }],
            energy: vec![EnergyRecord {
                measurement: Phase::Idling,
                core_count: None,
                sort_variant: None,
                dataset_size: None,
                perf_metric: "power/energy-pkg/".to_string(),
                joules: 50.0,
                runtime_s: 10.0,
            }],
        }
    }

    #[test]
    fn never_overwrites() {
        let dir = env::temp_dir().join(format!("sweep-output-{}", ::std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let (runtimes, energy) = write_results(&dir, "nemea", &result(), 1700000000).unwrap();
        assert_eq!(runtimes, dir.join("results__nemea.csv"));
        assert_eq!(energy, dir.join("results_energy__nemea.csv"));

        let (again, _) = write_results(&dir, "nemea", &result(), 1700000001).unwrap();
        assert_eq!(again, dir.join("results__nemea__1700000001.csv"));

        let mut text = String::new();
        File::open(&energy).unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(
            text,
            "MEASUREMENT,CORE_COUNT,SORT_VARIANT,DATASET_SIZE,PERF_METRIC,JOULES,RUNTIME_S\n\
             Idling,,,,power/energy-pkg/,50.0,10.0\n"
        );
        fs::remove_dir_all(&dir).unwrap();
    }
}
