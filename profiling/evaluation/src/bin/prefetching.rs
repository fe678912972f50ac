//! Prefetching results: runtime of a random position list summation over the
//! prefetch offset, one panel per (data set size, machine).
#[macro_use]
extern crate error_chain;
extern crate evaluation;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate regex;
extern crate structopt;

use evaluation::chart::{Chart, GnuplotRenderer, Panel, Render, Series};
use evaluation::errors::*;
use evaluation::{helper, loader, logger, MachineMap, PrefetchRecord};
use itertools::Itertools;
use regex::Regex;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "prefetching", about = "Chart prefetching offsets and localities")]
struct Opt {
    /// Directory holding the `.csv.xz` results.
    #[structopt(short = "d", long = "dir", default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Hostname to hardware label mapping.
    #[structopt(short = "m", long = "machines", default_value = "Machines.toml",
                parse(from_os_str))]
    machines: PathBuf,

    /// Where the chart is written.
    #[structopt(short = "o", long = "out", default_value = ".", parse(from_os_str))]
    out: PathBuf,

    /// Run gnuplot on the generated script.
    #[structopt(short = "r", long = "render")]
    render: bool,
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let machines = MachineMap::init_or_default(&opt.machines)?;
    let paths = loader::discover(&opt.dir, &Regex::new(r"\.csv\.xz$")?)?;
    let records: Vec<PrefetchRecord> = loader::load_all(&paths[..], &machines)?;
    info!("{} prefetching measurements", records.len());

    let chart = offset_chart(&records, helper::timestamp());
    GnuplotRenderer::new(&opt.out, opt.render).render(&chart)?;
    Ok(())
}

fn series_key(r: &PrefetchRecord) -> String {
    format!("{} (Locality: {})", r.name, r.locality)
}

// Powers of two covering the measured offsets.
fn offset_tics(records: &[PrefetchRecord]) -> Vec<(f64, String)> {
    let offsets = records.iter().map(|r| r.offset).filter(|&o| o > 0);
    let (min, max) = match offsets.minmax().into_option() {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };
    let low = 31 - min.leading_zeros();
    let high = 31 - max.leading_zeros();
    (low..high + 1)
        .map(|e| {
            let tic = 1u64 << e;
            (tic as f64, tic.to_string())
        })
        .collect()
}

fn offset_chart(records: &[PrefetchRecord], timestamp: i64) -> Chart {
    let sizes = records.iter().map(|r| r.vector_size).unique().sorted().collect::<Vec<_>>();
    let machines = records
        .iter()
        .map(|r| r.machine.clone())
        .unique()
        .sorted()
        .collect::<Vec<_>>();

    let mut chart = Chart::new(
        &format!("prefetching__{}", timestamp),
        "Prefetching Offset",
        "Runtime (ms)",
    );
    chart.title = "Random Position List Summation: Runtime for Different Prefetching Offsets and \
                   Localities"
        .to_string();
    chart.log2_x = true;
    chart.x_tics = offset_tics(records);
    chart.columns = machines.len();

    for &size in &sizes {
        for machine in &machines {
            let series = records
                .iter()
                .filter(|r| r.vector_size == size && &r.machine == machine)
                .map(|r| (series_key(r), (r.offset as f64, r.runtime_s * 1000.0)))
                .into_group_map()
                .into_iter()
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .map(|(key, points)| Series::sorted(key, points))
                .collect();
            chart.panels.push(Panel {
                title: format!("{} / Data Set Size: {}", machine, helper::gigabytes_label(size)),
                series: series,
            });
        }
    }
    chart
}
