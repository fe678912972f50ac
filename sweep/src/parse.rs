//! Typed parsers for the text the benchmark and the energy tools print.
//!
//! Each marker has one regular expression. A parser returns `Parsed`, leaving
//! it to the caller whether a missing marker aborts the sweep.

use errors::*;
use regex::Regex;

/// Outcome of looking for a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    /// The marker was found and its value parsed.
    Success(T),

    /// The marker was not found; `raw` is the text that was searched.
    ParseError {
        /// The searched text.
        raw: String,
    },
}

impl<T> Parsed<T> {
    /// Turns a missing marker into a fatal error naming `marker` and the
    /// `command` whose output lacked it.
    pub fn into_result(self, marker: &str, command: &str) -> Result<T> {
        match self {
            Parsed::Success(value) => Ok(value),
            Parsed::ParseError { raw } => {
                debug!("searched for {} in:\n{}", marker, raw);
                bail!(ErrorKind::MissingMarker(marker.to_string(), command.to_string()))
            }
        }
    }

    /// Whether the marker was found.
    pub fn is_success(&self) -> bool {
        match *self {
            Parsed::Success(_) => true,
            Parsed::ParseError { .. } => false,
        }
    }
}

/// Marker name of the benchmark's runtime line.
pub const RUNTIME_MARKER: &str = "Total duration";

/// Marker name of perf's energy lines.
pub const PERF_MARKER: &str = "Joules";

/// Marker name of turbostat's summary block.
pub const TURBOSTAT_MARKER: &str = "Pkg_J";

/// Energy consumed according to one counter.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyReading {
    /// Consumed energy.
    pub joules: f64,

    /// The counter, e.g. `power/energy-pkg/`.
    pub metric: String,
}

/// The block turbostat prints after the wrapped command exits.
#[derive(Debug, Clone, PartialEq)]
pub struct TurbostatReading {
    /// Elapsed seconds turbostat reports.
    pub elapsed_secs: f64,

    /// The `Pkg_J` value at the fixed position of the block.
    pub pkg_joules: f64,

    /// Values from the `Pkg_J` line to the end of the block.
    pub packages: Vec<f64>,

    /// Sum over `packages`.
    pub total_joules: f64,
}

/// The compiled marker grammar.
#[derive(Debug, Clone)]
pub struct Markers {
    runtime: Regex,
    perf: Regex,
}

impl Markers {
    /// Compiles the patterns.
    pub fn new() -> Result<Markers> {
        Ok(Markers {
            runtime: Regex::new(r"(?m)^Total duration: ([0-9]+(?:\.[0-9]*)?(?:[eE][+-]?[0-9]+)?) s$")?,
            perf: Regex::new(r"(?m)^\s*([0-9][0-9,]*(?:\.[0-9]+)?) Joules (\S+)")?,
        })
    }

    /// Finds the runtime the benchmark reports on stdout.
    pub fn parse_runtime(&self, stdout: &str) -> Parsed<f64> {
        let value = self.runtime
            .captures(stdout)
            .and_then(|caps| caps[1].parse::<f64>().ok());
        match value {
            Some(v) => Parsed::Success(v),
            None => Parsed::ParseError { raw: stdout.to_string() },
        }
    }

    /// Finds every energy line `perf stat` wrote to stderr. Thousands
    /// separators are dropped.
    pub fn parse_perf_energy(&self, stderr: &str) -> Parsed<Vec<EnergyReading>> {
        let readings = self.perf
            .captures_iter(stderr)
            .filter_map(|caps| {
                let joules = caps[1].replace(',', "").parse::<f64>().ok()?;
                Some(EnergyReading {
                    joules: joules,
                    metric: caps[2].to_string(),
                })
            })
            .collect::<Vec<_>>();
        if readings.is_empty() {
            Parsed::ParseError { raw: stderr.to_string() }
        } else {
            Parsed::Success(readings)
        }
    }
}

/// Reads turbostat's summary: the first line ending in ` sec` starts the
/// block, `Pkg_J` sits three lines below it and is followed by one line per
/// package. Only `Pkg_J` is required; package values end at the first line
/// that is not a number.
pub fn parse_turbostat(stderr: &str) -> Parsed<TurbostatReading> {
    let lines = stderr.lines().collect::<Vec<_>>();
    let reading = lines
        .iter()
        .position(|line| line.trim_end().ends_with(" sec"))
        .and_then(|start| {
            let elapsed_secs = lines[start].split_whitespace().next()?.parse().ok()?;
            let pkg_joules = lines.get(start + 3)?.trim().parse().ok()?;
            let packages = lines[start + 3..]
                .iter()
                .map(|line| line.trim().parse::<f64>())
                .take_while(|value| value.is_ok())
                .filter_map(|value| value.ok())
                .collect::<Vec<_>>();
            Some(TurbostatReading {
                elapsed_secs: elapsed_secs,
                pkg_joules: pkg_joules,
                total_joules: packages.iter().sum(),
                packages: packages,
            })
        });
    match reading {
        Some(r) => Parsed::Success(r),
        None => Parsed::ParseError { raw: stderr.to_string() },
    }
}
