//! Joins runtime and energy results per host, writes the joined table and
//! charts sorted items per joule over cores.
extern crate csv;
#[macro_use]
extern crate error_chain;
extern crate evaluation;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate regex;
extern crate structopt;

use evaluation::chart::{self, Chart, GnuplotRenderer, Panel, Render, Series};
use evaluation::errors::*;
use evaluation::energy::{self, AggregatedRecord};
use evaluation::{helper, loader, logger, EnergyRecord, MachineMap, RuntimeRecord};
use itertools::Itertools;
use regex::Regex;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "energy", about = "Join runtime and energy results")]
struct Opt {
    /// Directory holding `results__<host>.csv` and `results_energy__<host>.csv`.
    #[structopt(short = "d", long = "dir", default_value = ".", parse(from_os_str))]
    dir: PathBuf,

    /// Hostname to hardware label mapping.
    #[structopt(short = "m", long = "machines", default_value = "Machines.toml",
                parse(from_os_str))]
    machines: PathBuf,

    /// Where tables and charts are written.
    #[structopt(short = "o", long = "out", default_value = ".", parse(from_os_str))]
    out: PathBuf,

    /// Expected data-generation baselines per metric (one per dataset size).
    #[structopt(long = "baselines", default_value = "2")]
    baselines: usize,

    /// Run gnuplot on the generated scripts.
    #[structopt(short = "r", long = "render")]
    render: bool,
}

quick_main!(run);

fn run() -> Result<()> {
    logger::init();
    let opt = Opt::from_args();
    debug!("{:?}", opt);

    let machines = MachineMap::init_or_default(&opt.machines)?;
    let runtime_pattern = Regex::new(r"^results__(?P<host>.+?)(?:__\d+)?\.csv(?:\.xz|\.gz)?$")?;
    let energy_pattern = Regex::new(r"^results_energy__(?P<host>.+?)(?:__\d+)?\.csv(?:\.xz|\.gz)?$")?;

    let runtime_files = loader::discover_by_host(&opt.dir, &runtime_pattern)?;
    let energy_files = loader::discover_by_host(&opt.dir, &energy_pattern)?;
    if energy_files.is_empty() {
        bail!(ErrorKind::EmptyDataset(format!("{:?}", opt.dir)));
    }

    let renderer = GnuplotRenderer::new(&opt.out, opt.render);
    let timestamp = helper::timestamp();

    for (host, files) in &energy_files {
        let label = machines.label(host).unwrap_or(host).to_string();
        let runtimes: Vec<RuntimeRecord> = match runtime_files.get(host) {
            Some(paths) => loader::load_all(&paths[..], &machines)?,
            None => {
                warn!("{}: no runtime results, AVG_RUNTIME_S stays empty", host);
                Vec::new()
            }
        };
        let samples: Vec<EnergyRecord> = loader::load_all(&files[..], &machines)?;
        let medians = energy::aggregate_energy(&samples);
        info!("{}: {} samples in {} groups", host, samples.len(), medians.len());

        let joined = energy::join_runtime_energy(&label, &runtimes, &medians, opt.baselines)
            .chain_err(|| format!("failed to join results of {}", host))?;

        let table = opt.out.join(format!("energy__{}__{}.csv", host, timestamp));
        let mut writer = csv::Writer::from_path(&table)?;
        for row in &joined {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!("{}: wrote {} rows to {:?}", host, joined.len(), table);

        let chart = items_per_joule_chart(host, &label, &joined, timestamp);
        renderer.render(&chart)?;
    }
    Ok(())
}

// One panel per dataset size, one line per (variant, metric).
fn items_per_joule_chart(host: &str, label: &str, rows: &[AggregatedRecord], timestamp: i64) -> Chart {
    let mut chart = Chart::new(
        &chart::artifact_name("energy", host, "items_per_joule", timestamp),
        "Cores",
        "Million Items sorted per Joule",
    );
    chart.title = label.to_string();
    chart.columns = 2;
    chart.panels = rows.iter()
        .map(|r| (r.dataset_size, r))
        .into_group_map()
        .into_iter()
        .sorted_by(|a, b| a.0.cmp(&b.0))
        .map(|(size, group)| Panel {
            title: helper::dataset_size_name(size, helper::SORT_ELEMENT_BYTES),
            series: group
                .into_iter()
                .map(|r| (format!("{} ({})", r.sort_variant, r.perf_metric), r))
                .into_group_map()
                .into_iter()
                .sorted_by(|a, b| a.0.cmp(&b.0))
                .map(|(name, rows)| {
                    let points = rows.iter()
                        .map(|r| (r.core_count as f64, helper::millions(r.items_per_joule)))
                        .collect();
                    Series::sorted(name, points)
                })
                .collect(),
        })
        .collect();
    chart
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cores: usize, variant: &str, size: u64, metric: &str, items_per_joule: f64) -> AggregatedRecord {
        AggregatedRecord {
            machine: "Intel Xeon Platinum 8180".to_string(),
            core_count: cores,
            sort_variant: variant.to_string(),
            dataset_size: size,
            perf_metric: metric.to_string(),
            avg_runtime_s: Some(1.0),
            joules: 100.0,
            runtime_s: 1.0,
            dg_joules: 20.0,
            joules_without_dg: 80.0,
            idle_watts: 10.0,
            joules_without_idle: 90.0,
            items_per_joule: items_per_joule,
        }
    }

    #[test]
    fn panel_per_size_line_per_variant_and_metric() {
        let rows = vec![
            row(4, "Parallel std::sort", 4_000_000_000, "power/energy-pkg/", 1_000_000.0),
            row(1, "Parallel std::sort", 250_000_000, "power/energy-pkg/", 2_000_000.0),
            row(4, "Parallel std::sort", 250_000_000, "power/energy-pkg/", 3_000_000.0),
            row(1, "Parallel std::sort", 250_000_000, "power/energy-ram/", 5_000_000.0),
            row(1, "Sequential std::sort", 250_000_000, "power/energy-pkg/", 1_500_000.0),
        ];
        let chart = items_per_joule_chart("nemea", "Intel Xeon Platinum 8180", &rows, 17);
        assert_eq!(chart.name, "energy__nemea__items_per_joule__17");
        assert_eq!(chart.title, "Intel Xeon Platinum 8180");
        assert_eq!(chart.panels.len(), 2);
        assert_eq!(chart.panels[0].title, "250 Million Items (1 GB)");
        assert_eq!(chart.panels[1].title, "4000 Million Items (16 GB)");

        let names = chart.panels[0].series.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "Parallel std::sort (power/energy-pkg/)",
                "Parallel std::sort (power/energy-ram/)",
                "Sequential std::sort (power/energy-pkg/)",
            ]
        );
        assert_eq!(chart.panels[0].series[0].points, vec![(1.0, 2.0), (4.0, 3.0)]);
        assert_eq!(chart.panels[1].series[0].points, vec![(4.0, 1.0)]);
    }

    #[test]
    fn no_rows_no_panels() {
        assert!(items_per_joule_chart("nemea", "nemea", &[], 0).is_empty());
    }
}
