//! Measures the parallel sort on the largest dataset under `turbostat`,
//! pinned to one NUMA node. Needs root for the energy counters.
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
use sweep::{host, output, Setting, Sweep, SystemLauncher, Toolchain, Turbostat};

#[derive(StructOpt, Debug)]
#[structopt(name = "pinned", about = "Measure the parallel sort pinned to one NUMA node")]
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

    /// NUMA node for CPUs and memory.
    #[structopt(short = "n", long = "node", default_value = "0")]
    node: u32,
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    host::check_root()?;
    let setting = Setting::init(&opt.config)?;
    let toolchain = Toolchain {
        gcc_path: opt.gcc_path,
        oneapi_path: opt.oneapi_path,
    };
    let cwd = env::current_dir()?;
    host::check_preconditions(&toolchain, &cwd, &setting.root_guard)?;

    let variant = match setting.variants.iter().find(|v| v.parallel) {
        Some(variant) => variant,
        None => bail!(ErrorKind::Precondition("no parallel variant configured".into())),
    };
    let size = match setting.sizes.iter().max_by_key(|s| s.items) {
        Some(size) => size,
        None => bail!(ErrorKind::Precondition("no dataset size configured".into())),
    };

    let hostname = host::hostname()?;
    let sweep = Sweep::new(&setting, &toolchain, Turbostat, setting.binary(&hostname), vec![1])?;
    let summary = sweep.run_pinned(&mut SystemLauncher, variant, size, opt.node)?;

    println!("Avg. Joules data generation: {}", summary.data_generation_joules);
    println!("Avg. runtime data generation: {} s", summary.data_generation_secs);
    println!("Avg. Joules sorting: {}", summary.sorting_joules);
    println!("Avg. runtime sorting: {} s", summary.sorting_secs);

    let dir = Path::new(&setting.output_dir);
    let path = output::fresh_path(dir, "results_energy_pinned", &hostname, helper::timestamp());
    ::std::fs::create_dir_all(dir)?;
    output::write_rows(&path, &summary.energy)?;
    Ok(())
}
