//! Hostname to hardware descriptor mapping. Results are collected on many
//! hosts; before merging, every hostname is replaced with a label that names
//! the CPU so the reports can group machines by vendor and model.

use errors::*;
use regex::{self, Captures, Regex};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use toml;

/// A numbered host family such as `cx01` ... `cx16`.
#[derive(Deserialize, Debug, Clone)]
pub struct HostRange {
    /// Common hostname prefix.
    pub prefix: String,

    /// First number (inclusive).
    pub from: u32,

    /// Last number (inclusive).
    pub to: u32,

    /// Label template; `{host}` is replaced with the generated hostname.
    pub label: String,
}

/// The on-disk layout of `Machines.toml`.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct MachineSetting {
    /// Keywords used to split machines into vendor groups. Matches need to be
    /// distinct.
    #[serde(default)]
    pub groups: Vec<String>,

    /// Individually named hosts.
    #[serde(default)]
    pub hosts: BTreeMap<String, String>,

    /// Numbered host families.
    #[serde(default)]
    pub ranges: Vec<HostRange>,
}

/// Substitutes hostnames with their descriptors.
#[derive(Debug, Clone)]
pub struct MachineMap {
    labels: BTreeMap<String, String>,
    pattern: Option<Regex>,
    groups: Vec<String>,
}

impl Default for MachineMap {
    fn default() -> Self {
        MachineMap {
            labels: BTreeMap::new(),
            pattern: None,
            groups: Vec::new(),
        }
    }
}

impl MachineMap {
    /// Initialize from a TOML file.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<MachineMap> {
        let mut contents = String::new();
        File::open(path.as_ref())
            .chain_err(|| format!("no machine file {:?}", path.as_ref()))?
            .read_to_string(&mut contents)?;
        MachineMap::parse(&contents)
    }

    /// Like `init`, but a missing file leaves every hostname as it is.
    pub fn init_or_default<P: AsRef<Path>>(path: P) -> Result<MachineMap> {
        if path.as_ref().exists() {
            MachineMap::init(path)
        } else {
            warn!("{:?} not found, hostnames stay as they are", path.as_ref());
            Ok(MachineMap::default())
        }
    }

    /// Initialize from TOML text.
    pub fn parse(contents: &str) -> Result<MachineMap> {
        let setting: MachineSetting = toml::from_str(contents)?;
        MachineMap::with_setting(setting)
    }

    /// Expands ranges and compiles the substitution pattern.
    pub fn with_setting(setting: MachineSetting) -> Result<MachineMap> {
        let mut labels = setting.hosts;
        for range in &setting.ranges {
            for id in range.from..(range.to + 1) {
                let host = format!("{}{:02}", range.prefix, id);
                let label = range.label.replace("{host}", &host);
                labels.insert(host, label);
            }
        }

        // Longest hostnames first so a short name never matches inside a
        // longer one.
        let mut hosts = labels.keys().map(|h| regex::escape(h)).collect::<Vec<_>>();
        hosts.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        let pattern = if hosts.is_empty() {
            None
        } else {
            Some(Regex::new(&hosts.join("|"))?)
        };

        debug!("loaded {} machine labels", labels.len());
        Ok(MachineMap {
            labels: labels,
            pattern: pattern,
            groups: setting.groups,
        })
    }

    /// Label of a known host.
    pub fn label(&self, host: &str) -> Option<&str> {
        self.labels.get(host).map(|l| l.as_str())
    }

    /// Replaces every hostname occurring in `field` in a single pass, so
    /// labels that contain their own hostname are left alone.
    pub fn substitute<'a>(&self, field: &'a str) -> Cow<'a, str> {
        match self.pattern {
            Some(ref pattern) => pattern.replace_all(field, |caps: &Captures| {
                self.labels[&caps[0]].clone()
            }),
            None => Cow::Borrowed(field),
        }
    }

    /// Vendor grouping keywords.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// The first group keyword contained in `label`.
    pub fn group_of(&self, label: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|keyword| label.contains(keyword.as_str()))
            .map(|keyword| keyword.as_str())
    }
}
