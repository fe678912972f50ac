//! Energy measurement tools that wrap a benchmark invocation.

use command::{Invocation, Output};
use errors::*;
use parse::{self, EnergyReading, Markers, PERF_MARKER, TURBOSTAT_MARKER};

/// Energy read from one wrapped run.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// One reading per counter.
    pub readings: Vec<EnergyReading>,

    /// Wall time of the run as the tool or the launcher saw it.
    pub elapsed_secs: f64,
}

/// A tool that measures the energy of the process it wraps.
pub trait EnergyMeter {
    /// Wraps `invocation` in the tool.
    fn wrap(&self, invocation: Invocation) -> Invocation;

    /// Reads the tool's report from a finished run. A missing report is
    /// fatal.
    fn measure(&self, command: &str, output: &Output) -> Result<Measurement>;
}

/// `perf stat` with one `-e` per counter.
#[derive(Debug, Clone)]
pub struct Perf {
    metrics: Vec<String>,
    markers: Markers,
}

impl Perf {
    /// Measures `metrics`, e.g. `power/energy-pkg/`.
    pub fn new(metrics: Vec<String>) -> Result<Perf> {
        if metrics.is_empty() {
            bail!(ErrorKind::Precondition("no perf metric given".into()));
        }
        Ok(Perf {
            metrics: metrics,
            markers: Markers::new()?,
        })
    }
}

impl EnergyMeter for Perf {
    fn wrap(&self, invocation: Invocation) -> Invocation {
        let mut args = vec!["stat".to_string()];
        for metric in &self.metrics {
            args.push("-e".to_string());
            args.push(metric.clone());
        }
        invocation.prefixed("perf".to_string(), args)
    }

    fn measure(&self, command: &str, output: &Output) -> Result<Measurement> {
        let readings = self.markers
            .parse_perf_energy(&output.stderr)
            .into_result(PERF_MARKER, command)?;
        Ok(Measurement {
            readings: readings,
            elapsed_secs: output.elapsed_secs(),
        })
    }
}

/// `turbostat` reporting package energy. The benchmark runs through `sh -c`
/// so the environment can be exported inside the wrapped shell.
#[derive(Debug, Clone, Default)]
pub struct Turbostat;

impl EnergyMeter for Turbostat {
    fn wrap(&self, invocation: Invocation) -> Invocation {
        Invocation::new("turbostat")
            .args(vec!["--quiet", "--Joules", "--show", "Pkg_J", "sh", "-c"])
            .arg(invocation.shell_line())
            .accept_exit_codes(&invocation.accepted)
    }

    fn measure(&self, command: &str, output: &Output) -> Result<Measurement> {
        let reading = parse::parse_turbostat(&output.stderr).into_result(TURBOSTAT_MARKER, command)?;
        info!(
            "Joule results per package ({} results): {:?}",
            reading.packages.len(),
            reading.packages
        );
        Ok(Measurement {
            readings: vec![
                EnergyReading {
                    joules: reading.pkg_joules,
                    metric: TURBOSTAT_MARKER.to_string(),
                },
            ],
            elapsed_secs: reading.elapsed_secs,
        })
    }
}
