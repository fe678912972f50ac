//! The sweep over (variant, dataset size, core count).
//!
//! For every (variant, dataset size) the benchmark is compiled, the baselines
//! are measured (`STOP` runs that only generate data, and plain idling), and
//! then the binary runs `trials` times per core count of the schedule.
//! Variants that are not parallel stop after the first core count: their
//! runtime does not depend on the affinity mask, and the scaling charts
//! stretch that single sample over all core counts again.
//!
//! Any failed process or missing marker aborts the whole sweep.

use average::{Estimate, Mean};
use command::{self, Invocation, Launcher, Pinning};
use compile;
use errors::*;
use evaluation::{EnergyRecord, Phase, RuntimeRecord};
use meter::{EnergyMeter, Measurement};
use parse::{Markers, RUNTIME_MARKER};
use setting::{DatasetSize, Setting, Toolchain, Variant};
use std::path::PathBuf;
use std::time::Duration;

/// Rows produced by a sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepResult {
    /// One averaged runtime per configuration.
    pub runtimes: Vec<RuntimeRecord>,

    /// One energy row per trial and counter, not aggregated.
    pub energy: Vec<EnergyRecord>,
}

impl SweepResult {
    fn concat<I: IntoIterator<Item = SweepResult>>(parts: I) -> SweepResult {
        parts.into_iter().fold(SweepResult::default(), |mut all, part| {
            all.runtimes.extend(part.runtimes);
            all.energy.extend(part.energy);
            all
        })
    }
}

/// Averages of the pinned measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct PinnedSummary {
    /// Mean energy of the data-generation runs.
    pub data_generation_joules: f64,

    /// Mean runtime of the data-generation runs.
    pub data_generation_secs: f64,

    /// Mean energy of the full runs.
    pub sorting_joules: f64,

    /// Mean runtime of the full runs.
    pub sorting_secs: f64,

    /// The raw energy rows.
    pub energy: Vec<EnergyRecord>,
}

/// A configured sweep.
pub struct Sweep<'a, M> {
    setting: &'a Setting,
    toolchain: &'a Toolchain,
    meter: M,
    markers: Markers,
    binary: PathBuf,
    core_counts: Vec<usize>,
}

impl<'a, M: EnergyMeter> Sweep<'a, M> {
    /// A sweep building `binary` and visiting `core_counts`.
    pub fn new(
        setting: &'a Setting,
        toolchain: &'a Toolchain,
        meter: M,
        binary: PathBuf,
        core_counts: Vec<usize>,
    ) -> Result<Sweep<'a, M>> {
        if core_counts.is_empty() {
            bail!(ErrorKind::Precondition("empty core-count schedule".into()));
        }
        Ok(Sweep {
            setting: setting,
            toolchain: toolchain,
            meter: meter,
            markers: Markers::new()?,
            binary: binary,
            core_counts: core_counts,
        })
    }

    /// Runs every (variant, dataset size) configuration in order.
    pub fn run<L: Launcher>(&self, launcher: &mut L) -> Result<SweepResult> {
        let parts = iproduct!(&self.setting.variants, &self.setting.sizes)
            .map(|(variant, size)| self.configuration(launcher, variant, size))
            .collect::<Result<Vec<_>>>()?;
        Ok(SweepResult::concat(parts))
    }

    /// Compiles `variant` with `size` and takes `trials` full and
    /// `baseline_trials` data-generation measurements pinned to `node`.
    pub fn run_pinned<L: Launcher>(
        &self,
        launcher: &mut L,
        variant: &Variant,
        size: &DatasetSize,
        node: u32,
    ) -> Result<PinnedSummary> {
        compile::compile(launcher, self.toolchain, self.setting, variant, size, &self.binary)?;
        let pinning = Pinning::NumaNode(node);

        info!(" == Data Generation");
        let stops = (0..self.setting.baseline_trials)
            .map(|_| -> Result<Measurement> {
                self.delay(launcher);
                let m = self.measure(launcher, self.stop_run().pinned(pinning))?;
                self.delay(launcher);
                Ok(m)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(" == Sorting");
        self.delay(launcher);
        let sorts = (0..self.setting.trials)
            .map(|_| -> Result<Measurement> {
                let (m, runtime) = self.timed_run(launcher, self.full_run().pinned(pinning))?;
                debug!("benchmark reported {} s", runtime);
                self.delay(launcher);
                Ok(m)
            })
            .collect::<Result<Vec<_>>>()?;

        let energy = stops
            .iter()
            .flat_map(|m| energy_rows(m, Phase::DataGeneration, None, None, Some(size.items)))
            .chain(sorts.iter().flat_map(|m| {
                energy_rows(m, Phase::Sorting, None, Some(&variant.name), Some(size.items))
            }))
            .collect();

        let summary = PinnedSummary {
            data_generation_joules: mean(stops.iter().map(total_joules)),
            data_generation_secs: mean(stops.iter().map(|m| m.elapsed_secs)),
            sorting_joules: mean(sorts.iter().map(total_joules)),
            sorting_secs: mean(sorts.iter().map(|m| m.elapsed_secs)),
            energy: energy,
        };
        Ok(summary)
    }

    fn configuration<L: Launcher>(
        &self,
        launcher: &mut L,
        variant: &Variant,
        size: &DatasetSize,
    ) -> Result<SweepResult> {
        compile::compile(launcher, self.toolchain, self.setting, variant, size, &self.binary)?;
        let baselines = self.baselines(launcher, size)?;

        let schedule = if variant.parallel {
            &self.core_counts[..]
        } else {
            &self.core_counts[..1]
        };
        let per_core = schedule
            .iter()
            .map(|&cores| self.at_core_count(launcher, variant, size, cores))
            .collect::<Result<Vec<_>>>()?;

        let runtimes = per_core.iter().map(|&(ref r, _)| r.clone()).collect();
        let energy = baselines
            .into_iter()
            .chain(per_core.into_iter().flat_map(|(_, e)| e))
            .collect();
        Ok(SweepResult {
            runtimes: runtimes,
            energy: energy,
        })
    }

    fn baselines<L: Launcher>(&self, launcher: &mut L, size: &DatasetSize) -> Result<Vec<EnergyRecord>> {
        let trials = (0..self.setting.baseline_trials)
            .map(|_| -> Result<Vec<EnergyRecord>> {
                self.delay(launcher);
                let stop = self.measure(launcher, self.stop_run())?;
                self.delay(launcher);
                let idle = self.measure(launcher, self.idle_run())?;
                Ok(energy_rows(&stop, Phase::DataGeneration, None, None, Some(size.items))
                    .into_iter()
                    .chain(energy_rows(&idle, Phase::Idling, None, None, None))
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(trials.into_iter().flat_map(|t| t).collect())
    }

    fn at_core_count<L: Launcher>(
        &self,
        launcher: &mut L,
        variant: &Variant,
        size: &DatasetSize,
        cores: usize,
    ) -> Result<(RuntimeRecord, Vec<EnergyRecord>)> {
        self.delay(launcher);
        let runs = (0..self.setting.trials)
            .map(|_| self.timed_run(launcher, self.full_run().pinned(Pinning::Cores(cores))))
            .collect::<Result<Vec<_>>>()?;

        let avg_runtime_s = mean(runs.iter().map(|&(_, runtime)| runtime));
        info!(
            "{} and {} ({} cores) >> average runtime: {} s",
            variant.name,
            size.items,
            cores,
            avg_runtime_s
        );

        let energy = runs.iter()
            .flat_map(|&(ref m, _)| {
                energy_rows(m, Phase::Sorting, Some(cores), Some(&variant.name), Some(size.items))
            })
            .collect();
        let runtime = RuntimeRecord {
            core_count: cores,
            sort_variant: variant.name.clone(),
            dataset_size: size.items,
            avg_runtime_s: avg_runtime_s,
        };
        Ok((runtime, energy))
    }

    fn delay<L: Launcher>(&self, launcher: &mut L) {
        launcher.pause(Duration::from_secs(self.setting.phase_delay_secs));
    }

    fn benchmark(&self) -> Invocation {
        Invocation::new(self.binary.to_string_lossy().into_owned())
            .env("LD_LIBRARY_PATH", self.toolchain.library_path())
    }

    fn stop_run(&self) -> Invocation {
        self.benchmark()
            .arg("STOP")
            .accept_exit_codes(&self.setting.stop_exit_codes)
    }

    fn full_run(&self) -> Invocation {
        self.benchmark()
    }

    fn idle_run(&self) -> Invocation {
        Invocation::new("sleep").arg(self.setting.idle_secs.to_string())
    }

    // Runs `invocation` under the meter and reads the energy report.
    fn measure<L: Launcher>(&self, launcher: &mut L, invocation: Invocation) -> Result<Measurement> {
        let wrapped = self.meter.wrap(invocation);
        let output = command::execute(launcher, &wrapped)?;
        self.meter.measure(&wrapped.command_line(), &output)
    }

    // Like `measure`, but also reads the runtime the benchmark reports.
    fn timed_run<L: Launcher>(&self, launcher: &mut L, invocation: Invocation) -> Result<(Measurement, f64)> {
        let wrapped = self.meter.wrap(invocation);
        let command_line = wrapped.command_line();
        let output = command::execute(launcher, &wrapped)?;
        let runtime = self.markers
            .parse_runtime(&output.stdout)
            .into_result(RUNTIME_MARKER, &command_line)?;
        let measurement = self.meter.measure(&command_line, &output)?;
        Ok((measurement, runtime))
    }
}

fn energy_rows(
    measurement: &Measurement,
    phase: Phase,
    cores: Option<usize>,
    variant: Option<&String>,
    items: Option<u64>,
) -> Vec<EnergyRecord> {
    measurement
        .readings
        .iter()
        .map(|reading| EnergyRecord {
            measurement: phase,
            core_count: cores,
            sort_variant: variant.cloned(),
            dataset_size: items,
            perf_metric: reading.metric.clone(),
            joules: reading.joules,
            runtime_s: measurement.elapsed_secs,
        })
        .collect()
}

fn total_joules(measurement: &Measurement) -> f64 {
    measurement.readings.iter().map(|r| r.joules).sum()
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let mut m = Mean::new();
    for v in values {
        m.add(v);
    }
    m.mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use command::Output;
    use meter::{Perf, Turbostat};

    // Answers like the benchmark and perf would: the benchmark's runtime
    // shrinks with the number of cores it may use.
    #[derive(Default)]
    struct ScriptedLauncher {
        commands: Vec<String>,
        pauses: usize,
        stop_status: i32,
        drop_runtime: bool,
    }

    impl ScriptedLauncher {
        fn count(&self, needle: &str) -> usize {
            self.commands.iter().filter(|c| c.contains(needle)).count()
        }
    }

    impl Launcher for ScriptedLauncher {
        fn launch(&mut self, invocation: &Invocation) -> Result<Output> {
            let line = invocation.shell_line();
            self.commands.push(line.clone());

            let mut output = Output {
                status: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                elapsed: Duration::from_secs(2),
            };
            if invocation.program.ends_with("g++") {
                return Ok(output);
            }
            if line.contains("turbostat") {
                output.stderr = "2.5 sec\nPkg_J\nPkg_J\n30.0\n15.0\n15.0\n".to_string();
            } else if line.contains("sleep") {
                output.stderr = "  10.0 Joules power/energy-pkg/\n".to_string();
            } else {
                output.stderr = "  1,005.0 Joules power/energy-pkg/\n".to_string();
            }
            if line.contains("STOP") {
                output.status = Some(self.stop_status);
            } else if !self.drop_runtime && !line.contains("sleep") {
                let cores = invocation
                    .args
                    .iter()
                    .position(|a| a == "-c")
                    .and_then(|i| invocation.args.get(i + 1))
                    .and_then(|mask| mask.trim_start_matches("0-").parse::<usize>().ok())
                    .map(|last| last + 1)
                    .unwrap_or(1);
                output.stdout = format!("Total duration: {} s\n", 8.0 / cores as f64);
            }
            Ok(output)
        }

        fn pause(&mut self, _duration: Duration) {
            self.pauses += 1;
        }
    }

    fn setting() -> Setting {
        Setting::parse(
            r#"
trials = 2
baseline_trials = 3

[[variants]]
name = "Sequential std::sort"

[[variants]]
name = "Parallel std::sort"
flags = "-DPARALLEL_STD_SORT"
parallel = true

[[sizes]]
items = 250000000
"#,
        ).unwrap()
    }

    fn toolchain() -> Toolchain {
        Toolchain {
            gcc_path: PathBuf::from("/opt/gcc"),
            oneapi_path: PathBuf::from("/opt/tbb"),
        }
    }

    fn launcher() -> ScriptedLauncher {
        ScriptedLauncher {
            stop_status: 17,
            ..ScriptedLauncher::default()
        }
    }

    fn perf() -> Perf {
        Perf::new(vec!["power/energy-pkg/".to_string()]).unwrap()
    }

    #[test]
    fn sweeps_all_configurations() {
        let (setting, toolchain) = (setting(), toolchain());
        let sweep = Sweep::new(&setting, &toolchain, perf(), PathBuf::from("./sort__test"), vec![1, 2, 4])
            .unwrap();
        let mut launcher = launcher();
        let result = sweep.run(&mut launcher).unwrap();

        assert_eq!(launcher.count("g++"), 2);
        assert_eq!(launcher.count("STOP"), 6);
        assert_eq!(launcher.count("sleep 10"), 6);

        let cores = result.runtimes.iter().map(|r| (r.sort_variant.as_str(), r.core_count)).collect::<Vec<_>>();
        assert_eq!(
            cores,
            vec![
                ("Sequential std::sort", 1),
                ("Parallel std::sort", 1),
                ("Parallel std::sort", 2),
                ("Parallel std::sort", 4),
            ]
        );
        assert_eq!(result.runtimes[3].avg_runtime_s, 2.0);

        // 3 data generation + 3 idle per configuration, one row per trial
        let phases = |phase: Phase| result.energy.iter().filter(|e| e.measurement == phase).count();
        assert_eq!(phases(Phase::DataGeneration), 6);
        assert_eq!(phases(Phase::Idling), 6);
        assert_eq!(phases(Phase::Sorting), 2 + 3 * 2);

        let idle = result.energy.iter().find(|e| e.measurement == Phase::Idling).unwrap();
        assert_eq!(idle.dataset_size, None);
        assert_eq!(idle.joules, 10.0);
        let sorting = result.energy.iter().find(|e| e.measurement == Phase::Sorting).unwrap();
        assert_eq!(sorting.joules, 1005.0);
        assert_eq!(sorting.core_count, Some(1));
        assert_eq!(sorting.runtime_s, 2.0);
    }

    #[test]
    fn sequential_variant_samples_one_core_count() {
        let (mut setting, toolchain) = (setting(), toolchain());
        setting.variants.truncate(1);
        let schedule = (1..65).collect::<Vec<_>>();
        let sweep = Sweep::new(&setting, &toolchain, perf(), PathBuf::from("./sort__test"), schedule)
            .unwrap();
        let mut launcher = launcher();
        let result = sweep.run(&mut launcher).unwrap();
        assert_eq!(result.runtimes.len(), 1);
        assert_eq!(result.runtimes[0].core_count, 1);
        assert_eq!(launcher.count("taskset -c 0-0"), 2);
        assert_eq!(launcher.count("taskset"), 2);
    }

    #[test]
    fn benchmarks_run_pinned_with_library_path() {
        let (setting, toolchain) = (setting(), toolchain());
        let sweep = Sweep::new(&setting, &toolchain, perf(), PathBuf::from("./sort__test"), vec![1, 2])
            .unwrap();
        let mut launcher = launcher();
        sweep.run(&mut launcher).unwrap();
        assert!(launcher.commands.iter().any(|c| {
            c == "export LD_LIBRARY_PATH=/opt/gcc/lib64/:/opt/tbb; \
                  perf stat -e power/energy-pkg/ taskset -c 0-1 ./sort__test"
        }));
        // one delay before each baseline run and before each core count
        assert_eq!(launcher.pauses, 2 * (3 * 2) + 1 + 2);
    }

    #[test]
    fn failed_stop_run_aborts() {
        let (setting, toolchain) = (setting(), toolchain());
        let sweep = Sweep::new(&setting, &toolchain, perf(), PathBuf::from("./sort__test"), vec![1])
            .unwrap();
        let mut launcher = ScriptedLauncher {
            stop_status: 1,
            ..ScriptedLauncher::default()
        };
        let err = sweep.run(&mut launcher).unwrap_err();
        match *err.kind() {
            ErrorKind::ProcessFailed(ref command, _) => assert!(command.contains("STOP")),
            ref other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(launcher.count("STOP"), 1);
    }

    #[test]
    fn missing_runtime_aborts() {
        let (setting, toolchain) = (setting(), toolchain());
        let sweep = Sweep::new(&setting, &toolchain, perf(), PathBuf::from("./sort__test"), vec![1])
            .unwrap();
        let mut launcher = ScriptedLauncher {
            stop_status: 0,
            drop_runtime: true,
            ..ScriptedLauncher::default()
        };
        let err = sweep.run(&mut launcher).unwrap_err();
        match *err.kind() {
            ErrorKind::MissingMarker(ref marker, _) => assert_eq!(marker, RUNTIME_MARKER),
            ref other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn pinned_measurement() {
        let (setting, toolchain) = (setting(), toolchain());
        let sweep = Sweep::new(&setting, &toolchain, Turbostat, PathBuf::from("./sort__test"), vec![1])
            .unwrap();
        let mut launcher = launcher();
        let summary = sweep
            .run_pinned(&mut launcher, &setting.variants[1], &setting.sizes[0], 0)
            .unwrap();

        assert_eq!(launcher.count("numactl -N 0 -m 0 ./sort__test STOP"), 3);
        assert_eq!(summary.data_generation_joules, 30.0);
        assert_eq!(summary.sorting_secs, 2.5);
        assert_eq!(summary.energy.len(), 3 + 2);
        assert!(summary.energy.iter().all(|e| e.perf_metric == "Pkg_J"));
    }
}
