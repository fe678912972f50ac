//! Builds one benchmark binary per (variant, dataset size).

use command::{self, Invocation, Launcher};
use errors::*;
use setting::{DatasetSize, Setting, Toolchain, Variant};
use std::path::Path;

/// The compiler invocation for one configuration.
pub fn compile_invocation(
    toolchain: &Toolchain,
    setting: &Setting,
    variant: &Variant,
    size: &DatasetSize,
    binary: &Path,
) -> Invocation {
    Invocation::new(toolchain.compiler().to_string_lossy().into_owned())
        .arg(setting.source.clone())
        .args(setting.compile_flags.split_whitespace())
        .arg("-o")
        .arg(binary.to_string_lossy().into_owned())
        .arg(format!("-L{}", toolchain.oneapi_path.display()))
        .args(variant.flags.split_whitespace())
        .args(size.flags.split_whitespace())
}

/// Compiles the configuration into `binary`. Any compiler failure is fatal.
pub fn compile<L: Launcher>(
    launcher: &mut L,
    toolchain: &Toolchain,
    setting: &Setting,
    variant: &Variant,
    size: &DatasetSize,
    binary: &Path,
) -> Result<()> {
    let invocation = compile_invocation(toolchain, setting, variant, size, binary);
    info!("compiling {} with {} items", variant.name, size.items);
    command::execute(launcher, &invocation)
        .chain_err(|| format!("failed to compile {} with {} items", variant.name, size.items))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn compiler_line() {
        let setting = Setting::parse(
            r#"
compile_flags = "-O3 -std=c++20 -ltbb"

[[variants]]
name = "Parallel std::sort"
flags = "-DPARALLEL_STD_SORT"
parallel = true

[[sizes]]
items = 4000000000
flags = "-DLARGE_DATASET"
"#,
        ).unwrap();
        let toolchain = Toolchain {
            gcc_path: PathBuf::from("/opt/gcc"),
            oneapi_path: PathBuf::from("/opt/tbb"),
        };
        let inv = compile_invocation(
            &toolchain,
            &setting,
            &setting.variants[0],
            &setting.sizes[0],
            Path::new("./sort__nemea"),
        );
        assert_eq!(
            inv.command_line(),
            "/opt/gcc/bin/g++ MemorySortBenchmark.cpp -O3 -std=c++20 -ltbb -o ./sort__nemea \
             -L/opt/tbb -DPARALLEL_STD_SORT -DLARGE_DATASET"
        );
    }
}
