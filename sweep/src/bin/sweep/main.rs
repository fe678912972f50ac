//! Runs the core-count sweep under `perf stat` and writes the runtime and
//! energy results of this host.
#[macro_use]
extern crate error_chain;
extern crate evaluation;
#[macro_use]
extern crate log;
extern crate structopt;
extern crate sweep;

use evaluation::{helper, logger};
use std::env;
use std::path::{Path, PathBuf};
use structopt::StructOpt;
use sweep::errors::*;
use sweep::{host, output, schedule, Perf, Setting, Sweep, SystemLauncher, Toolchain};

#[derive(StructOpt, Debug)]
#[structopt(name = "sweep", about = "Sweep the sort benchmark over variants, sizes and cores")]
struct Opt {
    /// GCC installation root (with `bin/` and `lib64/`).
    #[structopt(long = "gcc_path", parse(from_os_str))]
    gcc_path: PathBuf,

    /// Directory holding `libtbb.so`.
    #[structopt(long = "oneapi_path", parse(from_os_str))]
    oneapi_path: PathBuf,

    /// Sweep setting.
    #[structopt(short = "c", long = "config", default_value = "Sweep.toml", parse(from_os_str))]
    config: PathBuf,

    /// Perf metric(s) to track, e.g. `power/energy-pkg/`.
    #[structopt(required = true)]
    perf_metrics: Vec<String>,
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let setting = Setting::init(&opt.config)?;
    let toolchain = Toolchain {
        gcc_path: opt.gcc_path,
        oneapi_path: opt.oneapi_path,
    };
    let cwd = env::current_dir()?;
    host::check_preconditions(&toolchain, &cwd, &setting.root_guard)?;

    let hostname = host::hostname()?;
    let core_counts = schedule::for_machine(host::cpu_count(), setting.max_cores);
    info!("{}: core counts {:?}", hostname, core_counts);

    let meter = Perf::new(opt.perf_metrics)?;
    let sweep = Sweep::new(&setting, &toolchain, meter, setting.binary(&hostname), core_counts)?;
    let result = sweep.run(&mut SystemLauncher)?;

    output::write_results(
        Path::new(&setting.output_dir),
        &hostname,
        &result,
        helper::timestamp(),
    )?;
    Ok(())
}
