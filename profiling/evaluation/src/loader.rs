//! Discovers result files and loads them into one dataset.
//!
//! Result files may be plain (`.csv`) or compressed (`.csv.xz`, `.csv.gz`).
//! All files of one dataset must share the same header; rows are concatenated
//! in file name order. While loading, every textual field runs through the
//! [`MachineMap`](../machines/struct.MachineMap.html) so hostnames turn into
//! hardware labels.

use csv;
use errors::*;
use flate2::read::GzDecoder;
use machines::MachineMap;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use xz2::read::XzDecoder;

/// Lists the files in `dir` whose name matches `pattern`, sorted by name.
pub fn discover<P: AsRef<Path>>(dir: P, pattern: &Regex) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        let matches = path.is_file() &&
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| pattern.is_match(name))
                .unwrap_or(false);
        if matches {
            paths.push(path);
        }
    }
    paths.sort();
    debug!("discovered {} files matching {}", paths.len(), pattern);
    Ok(paths)
}

/// Like `discover`, but groups files by the `host` capture group of
/// `pattern`.
pub fn discover_by_host<P: AsRef<Path>>(
    dir: P,
    pattern: &Regex,
) -> Result<BTreeMap<String, Vec<PathBuf>>> {
    let mut hosts = BTreeMap::new();
    for path in discover(dir, pattern)? {
        let host = host_of(&path, pattern);
        match host {
            Some(host) => hosts.entry(host).or_insert_with(Vec::new).push(path),
            None => warn!("no host in file name {:?}, skipping", path),
        }
    }
    Ok(hosts)
}

/// Extracts the `host` capture group from a file name.
pub fn host_of(path: &Path, pattern: &Regex) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    pattern
        .captures(name)
        .and_then(|caps| caps.name("host"))
        .map(|host| host.as_str().to_string())
}

/// Opens a result file, decompressing by extension.
pub fn open(path: &Path) -> Result<Box<dyn Read>> {
    let name = path.to_string_lossy().into_owned();
    let file = File::open(path).chain_err(|| format!("failed to open {}", name))?;
    if name.ends_with(".csv.xz") {
        Ok(Box::new(XzDecoder::new(file)))
    } else if name.ends_with(".csv.gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else if name.ends_with(".csv") {
        Ok(Box::new(file))
    } else {
        bail!(ErrorKind::UnknownCompression(name))
    }
}

/// One loaded file: its header and rows.
#[derive(Debug)]
pub struct Table<T> {
    /// The header row.
    pub headers: csv::StringRecord,

    /// Deserialized rows.
    pub rows: Vec<T>,
}

/// Reads all rows from `rdr`, substituting machine names in every field that
/// is not a number.
pub fn load_table<T, R>(rdr: R, machines: &MachineMap) -> Result<Table<T>>
where
    T: DeserializeOwned,
    R: Read,
{
    let mut reader = csv::Reader::from_reader(rdr);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for raw in reader.records() {
        let raw = raw?;
        let fields = raw.iter()
            .map(|field| if field.is_empty() || field.parse::<f64>().is_ok() {
                Cow::Borrowed(field)
            } else {
                machines.substitute(field)
            })
            .collect::<Vec<_>>();
        let record = csv::StringRecord::from(fields);
        rows.push(record.deserialize(Some(&headers))?);
    }
    Ok(Table {
        headers: headers,
        rows: rows,
    })
}

/// Loads and concatenates `paths`. The header of every file must equal the
/// header of the first one.
pub fn load_all<T, P>(paths: &[P], machines: &MachineMap) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let mut headers: Option<csv::StringRecord> = None;
    let mut rows = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let table: Table<T> = load_table(open(path)?, machines)
            .chain_err(|| format!("failed to load {:?}", path))?;
        match headers {
            Some(ref first) if *first != table.headers => {
                bail!(ErrorKind::SchemaMismatch(path.to_string_lossy().into_owned()))
            }
            Some(_) => {}
            None => headers = Some(table.headers.clone()),
        }
        info!("loaded {} rows from {:?}", table.rows.len(), path);
        rows.extend(table.rows);
    }
    if rows.is_empty() {
        let names = paths
            .iter()
            .map(|p| p.as_ref().to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        bail!(ErrorKind::EmptyDataset(format!("[{}]", names.join(", "))))
    }
    Ok(rows)
}
