//! Unit conversions and labels shared by the reports.

use chrono;
use libc;
use std::io;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * 1024 * 1024;

/// Accesses performed by one pointer-chasing measurement.
pub const POINTER_CHASING_ACCESSES: u64 = 100_000_000;

/// Bytes per sorted item (`int32_t`).
pub const SORT_ELEMENT_BYTES: u64 = 4;

/// Human readable size bucket. Below 10^6 bytes the size is given in KiB, below
/// 10^9 in MiB, otherwise in GiB; values are truncated.
pub fn size_label(bytes: u64) -> String {
    if bytes < 1_000_000 {
        format!("{} KiB", bytes / KIB)
    } else if bytes < 1_000_000_000 {
        format!("{} MiB", bytes / MIB)
    } else {
        format!("{} GiB", bytes / GIB)
    }
}

/// Runtime of a single operation when `total_ns` was spent on `operations`.
pub fn runtime_per_element(total_ns: f64, operations: u64) -> f64 {
    total_ns / operations as f64
}

/// Items processed per second.
pub fn items_per_second(items: u64, runtime_s: f64) -> f64 {
    items as f64 / runtime_s
}

/// Converts a count into millions.
pub fn millions(value: f64) -> f64 {
    value / 1_000_000.0
}

/// Display string for a sorted dataset, e.g. `250 Million Items (1 GB)`.
pub fn dataset_size_name(items: u64, element_bytes: u64) -> String {
    format!(
        "{} Million Items ({} GB)",
        items as f64 / 1_000_000.0,
        (items * element_bytes) as f64 / 1_000_000_000.0
    )
}

/// Decimal gigabytes, e.g. `4 GB` for 4 * 10^9.
pub fn gigabytes_label(bytes: u64) -> String {
    format!("{} GB", bytes as f64 / 1_000_000_000.0)
}

/// Name of this host as reported by the kernel.
pub fn hostname() -> io::Result<String> {
    let mut buf = [0u8; 256];
    let ret = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if ret != 0 {
        return Err(io::Error::last_os_error());
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Unix time in seconds, used to keep output file names unique.
pub fn timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_buckets() {
        assert_eq!(size_label(512), "0 KiB");
        assert_eq!(size_label(1024), "1 KiB");
        assert_eq!(size_label(999_999), "976 KiB");
        assert_eq!(size_label(1_000_000), "0 MiB");
        assert_eq!(size_label(2_097_152), "2 MiB");
        assert_eq!(size_label(999_999_999), "953 MiB");
        assert_eq!(size_label(1_000_000_000), "0 GiB");
        assert_eq!(size_label(3_221_225_472), "3 GiB");
    }

    #[test]
    fn dataset_names() {
        assert_eq!(dataset_size_name(250_000_000, SORT_ELEMENT_BYTES), "250 Million Items (1 GB)");
        assert_eq!(
            dataset_size_name(4_000_000_000, SORT_ELEMENT_BYTES),
            "4000 Million Items (16 GB)"
        );
        assert_eq!(gigabytes_label(1_000_000_000), "1 GB");
        assert_eq!(gigabytes_label(500_000_000), "0.5 GB");
    }

    #[test]
    fn throughput() {
        assert_eq!(items_per_second(1_000_000, 0.5), 2_000_000.0);
        assert_eq!(millions(items_per_second(1_000_000, 0.5)), 2.0);
        assert_eq!(runtime_per_element(250_000_000.0, POINTER_CHASING_ACCESSES), 2.5);
    }

    #[test]
    fn local_hostname() {
        assert!(hostname().is_ok());
    }
}
