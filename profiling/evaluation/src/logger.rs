//! Log output shared by all binaries of the workspace.

use chrono;
use env_logger;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Installs a logger that prefixes each line with a UTC timestamp, the level
/// and the module path. `RUST_LOG` overrides the default `info` filter.
/// Calling it twice is harmless.
pub fn init() {
    let mut builder = env_logger::Builder::new();
    builder.format(|buf, record| {
        let t = chrono::Utc::now();
        writeln!(
            buf,
            "{} {}:{}: {}",
            t.format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.module_path().unwrap_or("-"),
            record.args()
        )
    });
    builder.filter_level(LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    let _ = builder.try_init();
}
