//! The sweep setting in TOML.

use errors::*;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use toml;

/// A named benchmark configuration selected by compile flags.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Variant {
    /// Name written to the result rows, e.g. `Parallel std::sort`.
    pub name: String,

    /// Extra compile flags.
    #[serde(default)]
    pub flags: String,

    /// Whether the runtime depends on the affinity mask. Variants that don't
    /// are measured on one core only.
    #[serde(default)]
    pub parallel: bool,
}

/// A dataset size selected by compile flags.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetSize {
    /// Number of items the benchmark sorts.
    pub items: u64,

    /// Extra compile flags.
    #[serde(default)]
    pub flags: String,
}

/// The sweep setting.
#[derive(Deserialize, Debug, Clone)]
pub struct Setting {
    /// Benchmark source file.
    #[serde(default = "default_source")]
    pub source: String,

    /// Binaries are named `<prefix>__<hostname>`.
    #[serde(default = "default_binary_prefix")]
    pub binary_prefix: String,

    /// Optimisation and language flags shared by every build.
    #[serde(default = "default_compile_flags")]
    pub compile_flags: String,

    /// Runs per core count.
    #[serde(default = "default_trials")]
    pub trials: usize,

    /// Runs per baseline phase.
    #[serde(default = "default_trials")]
    pub baseline_trials: usize,

    /// Pause before each measurement, in seconds.
    #[serde(default = "default_phase_delay")]
    pub phase_delay_secs: u64,

    /// Length of an idle measurement, in seconds.
    #[serde(default = "default_idle")]
    pub idle_secs: u64,

    /// Exit statuses accepted from `STOP` runs.
    #[serde(default = "default_stop_exit_codes")]
    pub stop_exit_codes: Vec<i32>,

    /// Where result files go.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// The sweep refuses to run from a directory with this name.
    #[serde(default = "default_root_guard")]
    pub root_guard: String,

    /// Upper bound for the core-count schedule.
    #[serde(default)]
    pub max_cores: Option<usize>,

    /// Variants to build.
    pub variants: Vec<Variant>,

    /// Dataset sizes to build.
    pub sizes: Vec<DatasetSize>,
}

fn default_source() -> String {
    "MemorySortBenchmark.cpp".to_string()
}

fn default_binary_prefix() -> String {
    "sort".to_string()
}

fn default_compile_flags() -> String {
    "-O3 -std=c++20 -Wall -Wextra -pedantic -ltbb".to_string()
}

fn default_trials() -> usize {
    5
}

fn default_phase_delay() -> u64 {
    5
}

fn default_idle() -> u64 {
    10
}

fn default_stop_exit_codes() -> Vec<i32> {
    vec![0, 17]
}

fn default_output_dir() -> String {
    "plotting/sorting".to_string()
}

fn default_root_guard() -> String {
    "plotting".to_string()
}

impl Setting {
    /// Initialize from a file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Setting> {
        let mut contents = String::new();
        File::open(path.as_ref())
            .chain_err(|| format!("no setting file {:?}", path.as_ref()))?
            .read_to_string(&mut contents)?;
        Setting::parse(&contents)
    }

    /// Initialize from TOML text.
    pub fn parse(contents: &str) -> Result<Setting> {
        let setting: Setting = toml::from_str(contents)?;
        if setting.variants.is_empty() {
            bail!(ErrorKind::Precondition("no variants configured".into()));
        }
        if setting.sizes.is_empty() {
            bail!(ErrorKind::Precondition("no dataset sizes configured".into()));
        }
        if setting.trials == 0 || setting.baseline_trials == 0 {
            bail!(ErrorKind::Precondition("trial counts must be positive".into()));
        }
        Ok(setting)
    }

    /// Path of the binary built for this host.
    pub fn binary(&self, hostname: &str) -> PathBuf {
        PathBuf::from(format!("./{}__{}", self.binary_prefix, hostname))
    }
}

/// Compiler and parallel-algorithms runtime locations.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// GCC installation root, containing `bin/g++` and `lib64/`.
    pub gcc_path: PathBuf,

    /// Directory holding `libtbb.so`.
    pub oneapi_path: PathBuf,
}

impl Toolchain {
    /// The compiler executable.
    pub fn compiler(&self) -> PathBuf {
        self.gcc_path.join("bin").join("g++")
    }

    /// `LD_LIBRARY_PATH` for running built binaries.
    pub fn library_path(&self) -> String {
        format!(
            "{}/lib64/:{}",
            self.gcc_path.display(),
            self.oneapi_path.display()
        )
    }
}
