//! Facts about the machine the sweep runs on, and the checks made before it
//! starts.

use errors::*;
use evaluation::helper;
use libc;
use num_cpus;
use setting::Toolchain;
use std::path::Path;

/// Name of this host, used in binary and result file names.
pub fn hostname() -> Result<String> {
    let name = helper::hostname()?;
    if name.is_empty() {
        bail!(ErrorKind::Precondition("hostname is empty".into()));
    }
    Ok(name)
}

/// Logical CPUs available.
pub fn cpu_count() -> usize {
    num_cpus::get()
}

/// Fails unless the toolchain directories look right and `cwd` is not the
/// directory named `root_guard`.
pub fn check_preconditions(toolchain: &Toolchain, cwd: &Path, root_guard: &str) -> Result<()> {
    if !toolchain.gcc_path.join("bin").exists() {
        let what = format!("GCC path {:?} has no bin/", toolchain.gcc_path);
        bail!(ErrorKind::Precondition(what));
    }
    if !toolchain.oneapi_path.join("libtbb.so").exists() {
        let what = format!("oneAPI path {:?} has no libtbb.so", toolchain.oneapi_path);
        bail!(ErrorKind::Precondition(what));
    }
    let in_guard = cwd.file_name()
        .map(|name| name == root_guard)
        .unwrap_or(false);
    if in_guard {
        let what = format!("run from the repository root, not from {:?}", cwd);
        bail!(ErrorKind::Precondition(what));
    }
    Ok(())
}

/// Fails unless the process runs as root.
pub fn check_root() -> Result<()> {
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        bail!(ErrorKind::Precondition("must be run with sudo".into()));
    }
    Ok(())
}
