//! Joins averaged runtimes with energy samples.
//!
//! Energy samples are noisy, so each (phase, dataset size, metric, core count,
//! variant) group is reduced to its median. The baseline phases are then
//! matched against the sorting rows: the data-generation energy of the same
//! dataset size is subtracted so that only the energy spent sorting remains,
//! and the idle power gives a second, time-proportional baseline.
//!
//! The join assumes exactly one idling row and exactly one data-generation row
//! per dataset size for every metric. Anything else stops the report.

use errors::*;
use itertools::Itertools;
use record::{EnergyRecord, Phase, RuntimeRecord};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Number of dataset sizes the sort sweep measures.
pub const DATA_GENERATION_BASELINES: usize = 2;

/// Grouping key of energy samples.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnergyKey {
    /// Measurement phase.
    pub phase: Phase,

    /// Items, empty for idling.
    pub dataset_size: Option<u64>,

    /// Energy counter.
    pub perf_metric: String,

    /// Cores, only for sorting.
    pub core_count: Option<usize>,

    /// Variant, only for sorting.
    pub sort_variant: Option<String>,
}

impl EnergyKey {
    /// The key a sample is grouped under.
    pub fn of(record: &EnergyRecord) -> EnergyKey {
        EnergyKey {
            phase: record.measurement,
            dataset_size: record.dataset_size,
            perf_metric: record.perf_metric.clone(),
            core_count: record.core_count,
            sort_variant: record.sort_variant.clone(),
        }
    }
}

/// Median of a group of energy samples.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyMedian {
    /// The group.
    pub key: EnergyKey,

    /// Median energy.
    pub joules: f64,

    /// Median wall time.
    pub runtime_s: f64,

    /// Number of samples in the group.
    pub samples: usize,
}

/// The middle value, or the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Reduces samples to one median row per group, ordered by key.
pub fn aggregate_energy(samples: &[EnergyRecord]) -> Vec<EnergyMedian> {
    samples
        .iter()
        .map(|s| (EnergyKey::of(s), s))
        .into_group_map()
        .into_iter()
        .map(|(key, group)| {
            let joules = group.iter().map(|s| s.joules).collect::<Vec<_>>();
            let runtimes = group.iter().map(|s| s.runtime_s).collect::<Vec<_>>();
            EnergyMedian {
                key: key,
                joules: median(&joules).unwrap_or(::std::f64::NAN),
                runtime_s: median(&runtimes).unwrap_or(::std::f64::NAN),
                samples: group.len(),
            }
        })
        .sorted_by(|a, b| a.key.cmp(&b.key))
        .collect()
}

/// The reference rows of one energy metric.
#[derive(Debug)]
pub struct Baselines<'a> {
    /// The idling row.
    pub idle: &'a EnergyMedian,

    /// One data-generation row per dataset size.
    pub data_generation: Vec<&'a EnergyMedian>,
}

impl<'a> Baselines<'a> {
    /// Finds the baseline rows of `metric`. Fails unless there is exactly one
    /// idling row and exactly `expected` data-generation rows.
    pub fn locate(medians: &'a [EnergyMedian], metric: &str, expected: usize) -> Result<Baselines<'a>> {
        let of_phase = |phase: Phase| {
            medians
                .iter()
                .filter(|m| m.key.phase == phase && m.key.perf_metric == metric)
                .collect::<Vec<_>>()
        };

        let idle = of_phase(Phase::Idling);
        if idle.len() != 1 {
            let what = format!("idling baseline ({})", metric);
            bail!(ErrorKind::Cardinality(what, 1, idle.len()));
        }

        let data_generation = of_phase(Phase::DataGeneration);
        if data_generation.len() != expected {
            let what = format!("data generation baseline ({})", metric);
            bail!(ErrorKind::Cardinality(what, expected, data_generation.len()));
        }

        Ok(Baselines {
            idle: idle[0],
            data_generation: data_generation,
        })
    }

    /// The data-generation row for `dataset_size`.
    pub fn data_generation_for(&self, dataset_size: u64) -> Result<&'a EnergyMedian> {
        self.data_generation
            .iter()
            .find(|m| m.key.dataset_size == Some(dataset_size))
            .cloned()
            .ok_or_else(|| {
                let what = format!("data generation of {} items", dataset_size);
                ErrorKind::MissingBaseline(what).into()
            })
    }

    /// Average power drawn while idling.
    pub fn idle_watts(&self) -> f64 {
        self.idle.joules / self.idle.runtime_s
    }
}

/// A sorting configuration with runtime, energy and derived efficiency.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AggregatedRecord {
    /// Hardware label of the host the results came from.
    pub machine: String,

    /// Cores the benchmark was restricted to.
    pub core_count: usize,

    /// Variant name.
    pub sort_variant: String,

    /// Items sorted.
    pub dataset_size: u64,

    /// Energy counter.
    pub perf_metric: String,

    /// Averaged runtime reported by the benchmark, if it was measured.
    pub avg_runtime_s: Option<f64>,

    /// Median energy of the full run.
    pub joules: f64,

    /// Median wall time of the full run.
    pub runtime_s: f64,

    /// Median energy of generating the same dataset.
    pub dg_joules: f64,

    /// `JOULES - DG_JOULES`.
    pub joules_without_dg: f64,

    /// Power drawn while idling.
    pub idle_watts: f64,

    /// `JOULES - IDLE_WATTS * RUNTIME_S`.
    pub joules_without_idle: f64,

    /// `DATASET_SIZE / JOULES_WITHOUT_DG`.
    pub items_per_joule: f64,
}

/// Joins the sorting medians of one host with their baselines and runtimes.
pub fn join_runtime_energy(
    machine: &str,
    runtimes: &[RuntimeRecord],
    medians: &[EnergyMedian],
    expected: usize,
) -> Result<Vec<AggregatedRecord>> {
    let metrics = medians
        .iter()
        .filter(|m| m.key.phase == Phase::Sorting)
        .map(|m| m.key.perf_metric.as_str())
        .collect::<BTreeSet<_>>();

    let mut joined = Vec::new();
    for metric in metrics {
        let baselines = Baselines::locate(medians, metric, expected)?;
        let idle_watts = baselines.idle_watts();
        debug!("{}: idle power of {} is {:.2} W", machine, metric, idle_watts);

        let sorting = medians
            .iter()
            .filter(|m| m.key.phase == Phase::Sorting && m.key.perf_metric == metric);
        for m in sorting {
            let dataset_size = m.key
                .dataset_size
                .ok_or_else(|| Error::from_kind(ErrorKind::MissingColumn("DATASET_SIZE".into())))?;
            let core_count = m.key
                .core_count
                .ok_or_else(|| Error::from_kind(ErrorKind::MissingColumn("CORE_COUNT".into())))?;
            let variant = m.key
                .sort_variant
                .clone()
                .ok_or_else(|| Error::from_kind(ErrorKind::MissingColumn("SORT_VARIANT".into())))?;

            let dg = baselines.data_generation_for(dataset_size)?;
            let avg_runtime_s = runtimes
                .iter()
                .find(|r| {
                    r.core_count == core_count && r.sort_variant == variant &&
                        r.dataset_size == dataset_size
                })
                .map(|r| r.avg_runtime_s);
            if avg_runtime_s.is_none() {
                warn!(
                    "{}: no runtime for {} with {} items on {} cores",
                    machine,
                    variant,
                    dataset_size,
                    core_count
                );
            }

            let joules_without_dg = m.joules - dg.joules;
            joined.push(AggregatedRecord {
                machine: machine.to_string(),
                core_count: core_count,
                sort_variant: variant,
                dataset_size: dataset_size,
                perf_metric: metric.to_string(),
                avg_runtime_s: avg_runtime_s,
                joules: m.joules,
                runtime_s: m.runtime_s,
                dg_joules: dg.joules,
                joules_without_dg: joules_without_dg,
                idle_watts: idle_watts,
                joules_without_idle: m.joules - idle_watts * m.runtime_s,
                items_per_joule: dataset_size as f64 / joules_without_dg,
            });
        }
    }
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC: &str = "power/energy-pkg/";

    fn sample(phase: Phase, size: Option<u64>, cores: Option<usize>, joules: f64) -> EnergyRecord {
        EnergyRecord {
            measurement: phase,
            core_count: cores,
            sort_variant: cores.map(|_| "Parallel std::sort".to_string()),
            dataset_size: size,
            perf_metric: METRIC.to_string(),
            joules: joules,
            runtime_s: 10.0,
        }
    }

    fn runtime(cores: usize, size: u64, secs: f64) -> RuntimeRecord {
        RuntimeRecord {
            core_count: cores,
            sort_variant: "Parallel std::sort".to_string(),
            dataset_size: size,
            avg_runtime_s: secs,
        }
    }

    fn complete_samples() -> Vec<EnergyRecord> {
        let mut samples = vec![
            sample(Phase::Idling, None, None, 50.0),
            sample(Phase::DataGeneration, Some(1_000), None, 20.0),
            sample(Phase::DataGeneration, Some(2_000), None, 40.0),
        ];
        for &joules in &[100.0, 300.0, 110.0, 90.0, 105.0] {
            samples.push(sample(Phase::Sorting, Some(1_000), Some(4), joules));
        }
        samples.push(sample(Phase::Sorting, Some(2_000), Some(4), 240.0));
        samples
    }

    #[test]
    fn median_not_mean() {
        assert_eq!(median(&[100.0, 300.0, 110.0, 90.0, 105.0]), Some(105.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn groups_by_key() {
        let medians = aggregate_energy(&complete_samples());
        assert_eq!(medians.len(), 5);

        let sorting = medians
            .iter()
            .find(|m| m.key.phase == Phase::Sorting && m.key.dataset_size == Some(1_000))
            .unwrap();
        assert_eq!(sorting.samples, 5);
        assert_eq!(sorting.joules, 105.0);
        assert_eq!(sorting.runtime_s, 10.0);
    }

    #[test]
    fn subtracts_data_generation() {
        let medians = aggregate_energy(&complete_samples());
        let runtimes = vec![runtime(4, 1_000, 2.0)];
        let joined = join_runtime_energy("nemea", &runtimes, &medians, DATA_GENERATION_BASELINES)
            .unwrap();
        assert_eq!(joined.len(), 2);

        for row in &joined {
            assert_eq!(row.joules_without_dg, row.joules - row.dg_joules);
            assert_eq!(row.idle_watts, 5.0);
        }

        let small = joined.iter().find(|r| r.dataset_size == 1_000).unwrap();
        assert_eq!(small.dg_joules, 20.0);
        assert_eq!(small.joules_without_dg, 85.0);
        assert_eq!(small.joules_without_idle, 55.0);
        assert_eq!(small.items_per_joule, 1_000.0 / 85.0);
        assert_eq!(small.avg_runtime_s, Some(2.0));

        let large = joined.iter().find(|r| r.dataset_size == 2_000).unwrap();
        assert_eq!(large.joules_without_dg, 200.0);
        assert_eq!(large.avg_runtime_s, None);
    }

    #[test]
    fn missing_idle_is_fatal() {
        let samples = complete_samples()
            .into_iter()
            .filter(|s| s.measurement != Phase::Idling)
            .collect::<Vec<_>>();
        let medians = aggregate_energy(&samples);
        let err = join_runtime_energy("nemea", &[], &medians, DATA_GENERATION_BASELINES).unwrap_err();
        match *err.kind() {
            ErrorKind::Cardinality(_, 1, 0) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn three_data_generation_rows_are_fatal() {
        let mut samples = complete_samples();
        samples.push(sample(Phase::DataGeneration, Some(3_000), None, 60.0));
        let medians = aggregate_energy(&samples);
        let err = join_runtime_energy("nemea", &[], &medians, DATA_GENERATION_BASELINES).unwrap_err();
        match *err.kind() {
            ErrorKind::Cardinality(_, 2, 3) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn zero_data_generation_rows_are_fatal() {
        let samples = complete_samples()
            .into_iter()
            .filter(|s| s.measurement != Phase::DataGeneration)
            .collect::<Vec<_>>();
        let medians = aggregate_energy(&samples);
        assert!(Baselines::locate(&medians, METRIC, DATA_GENERATION_BASELINES).is_err());
    }

    #[test]
    fn unmatched_dataset_size_is_fatal() {
        let mut samples = complete_samples();
        samples.push(sample(Phase::Sorting, Some(5_000), Some(1), 10.0));
        let medians = aggregate_energy(&samples);
        let err = join_runtime_energy("nemea", &[], &medians, DATA_GENERATION_BASELINES).unwrap_err();
        match *err.kind() {
            ErrorKind::MissingBaseline(_) => {}
            ref other => panic!("unexpected error {:?}", other),
        }
    }
}
