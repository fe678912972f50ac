//! Rows of the tabular result files. Column names are upper case, matching the
//! files written by the sweep and by the benchmarks themselves.

use serde::Deserializer;

/// The phase an energy sample was taken in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// The benchmark generated its input and exited (`STOP` mode).
    #[serde(rename = "Data Generation")]
    DataGeneration,

    /// An external `sleep`, nothing but the machine idling.
    #[serde(rename = "Idling")]
    Idling,

    /// A full run: data generation followed by the sort.
    #[serde(rename = "Sorting")]
    Sorting,
}

impl ::std::fmt::Display for Phase {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        let name = match *self {
            Phase::DataGeneration => "Data Generation",
            Phase::Idling => "Idling",
            Phase::Sorting => "Sorting",
        };
        write!(f, "{}", name)
    }
}

/// Averaged runtime of one (core count, variant, dataset size) configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct RuntimeRecord {
    /// Number of cores the benchmark was restricted to.
    pub core_count: usize,

    /// Variant name, e.g. `Parallel std::sort`.
    pub sort_variant: String,

    /// Number of items sorted.
    pub dataset_size: u64,

    /// Mean of the per-trial runtimes reported by the benchmark.
    pub avg_runtime_s: f64,
}

/// A single energy sample. Baseline phases leave the configuration columns
/// empty (idling has no dataset size either).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EnergyRecord {
    /// Phase of the measurement.
    pub measurement: Phase,

    /// Number of cores, only set for `Sorting`.
    #[serde(default, deserialize_with = "lenient_cores")]
    pub core_count: Option<usize>,

    /// Variant name, only set for `Sorting`.
    #[serde(default)]
    pub sort_variant: Option<String>,

    /// Number of items, empty for `Idling`.
    #[serde(default, deserialize_with = "lenient_count")]
    pub dataset_size: Option<u64>,

    /// Counter the energy tool reported, e.g. `power/energy-pkg/`.
    pub perf_metric: String,

    /// Consumed energy.
    pub joules: f64,

    /// Wall time of the wrapped process.
    pub runtime_s: f64,
}

/// One pointer-chasing measurement as written by the benchmark.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PointerChasingRecord {
    /// Host name, replaced by its hardware label on load.
    pub machine: String,

    /// Repetition index.
    pub run_id: usize,

    /// Elements in the chased array.
    pub element_count: u64,

    /// Array size in bytes.
    pub size_in_bytes: u64,

    /// Total time of all accesses.
    pub runtime_ns: f64,
}

/// One prefetching measurement.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PrefetchRecord {
    /// Host name, replaced by its hardware label on load.
    pub machine: String,

    /// Benchmark name (with or without prefetching).
    pub name: String,

    /// Locality hint passed to the prefetch instruction.
    pub locality: u32,

    /// Number of elements in the summed vector.
    pub vector_size: u64,

    /// How far ahead the position list is prefetched.
    pub offset: u32,

    /// Runtime of one measurement.
    pub runtime_s: f64,
}

// Files written through pandas store integer columns that contain empty cells
// as floats (`250000.0`).
fn lenient_count<'de, D>(deserializer: D) -> ::std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = <Option<f64> as ::serde::Deserialize>::deserialize(deserializer)?;
    Ok(raw.map(|v| v as u64))
}

fn lenient_cores<'de, D>(deserializer: D) -> ::std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_count(deserializer).map(|count| count.map(|v| v as usize))
}
