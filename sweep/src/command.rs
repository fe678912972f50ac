//! External process invocations.
//!
//! Every program the sweep runs is described by an `Invocation` and started
//! through a `Launcher`, which blocks until the process exits. There is no
//! timeout; a hanging benchmark hangs the sweep.

use errors::*;
use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

/// Restricts where a benchmark may run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pinning {
    /// Cores `0..n` through `taskset`.
    Cores(usize),

    /// CPUs and memory of one NUMA node through `numactl`.
    NumaNode(u32),
}

impl Pinning {
    /// The wrapping program and its arguments.
    pub fn prefix(&self) -> (String, Vec<String>) {
        match *self {
            Pinning::Cores(n) => (
                "taskset".to_string(),
                vec!["-c".to_string(), format!("0-{}", n.saturating_sub(1))],
            ),
            Pinning::NumaNode(node) => (
                "numactl".to_string(),
                vec![
                    "-N".to_string(),
                    node.to_string(),
                    "-m".to_string(),
                    node.to_string(),
                ],
            ),
        }
    }
}

/// A program, its arguments and its environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// The executable.
    pub program: String,

    /// Arguments.
    pub args: Vec<String>,

    /// Variables added to the inherited environment.
    pub env: Vec<(String, String)>,

    /// Exit statuses that count as success.
    pub accepted: Vec<i32>,
}

impl Invocation {
    /// Runs `program` without arguments; only status 0 is accepted.
    pub fn new<S: Into<String>>(program: S) -> Invocation {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            accepted: vec![0],
        }
    }

    /// Appends an argument.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Invocation {
        self.args.push(arg.into());
        self
    }

    /// Appends arguments.
    pub fn args<I, S>(mut self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable.
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Invocation {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Replaces the accepted exit statuses.
    pub fn accept_exit_codes(mut self, codes: &[i32]) -> Invocation {
        self.accepted = codes.to_vec();
        self
    }

    /// Runs this invocation through `program args...`, keeping environment
    /// and accepted statuses.
    pub fn prefixed(self, program: String, mut args: Vec<String>) -> Invocation {
        args.push(self.program);
        args.extend(self.args);
        Invocation {
            program: program,
            args: args,
            env: self.env,
            accepted: self.accepted,
        }
    }

    /// Runs this invocation under `pinning`.
    pub fn pinned(self, pinning: Pinning) -> Invocation {
        let (program, args) = pinning.prefix();
        self.prefixed(program, args)
    }

    /// Program and arguments as one shell-quoted line, without environment.
    pub fn command_line(&self) -> String {
        ::std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| quote(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A shell line exporting the environment first, for wrappers that run
    /// their command through `sh -c`.
    pub fn shell_line(&self) -> String {
        let exports = self.env
            .iter()
            .map(|&(ref k, ref v)| format!("export {}={};", k, quote(v)))
            .collect::<Vec<_>>();
        if exports.is_empty() {
            self.command_line()
        } else {
            format!("{} {}", exports.join(" "), self.command_line())
        }
    }

    /// Whether `status` counts as success. A process killed by a signal has
    /// no status and never succeeds.
    pub fn accepts(&self, status: Option<i32>) -> bool {
        status.map(|s| self.accepted.contains(&s)).unwrap_or(false)
    }

    /// The equivalent `std::process::Command`.
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        for &(ref k, ref v) in &self.env {
            command.env(k, v);
        }
        command
    }
}

// Single quotes unless the word is made of safe characters only.
fn quote(word: &str) -> String {
    let safe = !word.is_empty() &&
        word.chars().all(|c| {
            c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c)
        });
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// What a finished process left behind.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    /// Exit status, `None` if killed by a signal.
    pub status: Option<i32>,

    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Wall time from start to exit.
    pub elapsed: Duration,
}

impl Output {
    /// Wall time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs() as f64 + f64::from(self.elapsed.subsec_nanos()) / 1e9
    }
}

/// Starts processes and waits.
pub trait Launcher {
    /// Runs `invocation` to completion.
    fn launch(&mut self, invocation: &Invocation) -> Result<Output>;

    /// Waits between measurements.
    fn pause(&mut self, duration: Duration);
}

/// Runs real processes.
#[derive(Debug, Default)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&mut self, invocation: &Invocation) -> Result<Output> {
        let start = Instant::now();
        let output = invocation
            .to_command()
            .output()
            .chain_err(|| ErrorKind::Spawn(invocation.command_line()))?;
        Ok(Output {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            elapsed: start.elapsed(),
        })
    }

    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Launches `invocation` and fails unless its exit status is accepted.
pub fn execute<L: Launcher>(launcher: &mut L, invocation: &Invocation) -> Result<Output> {
    debug!("{}", invocation.shell_line());
    let output = launcher.launch(invocation)?;
    trace!("stdout: {}", output.stdout);
    trace!("stderr: {}", output.stderr);
    if !invocation.accepts(output.status) {
        let status = match output.status {
            Some(code) => format!("status {}", code),
            None => "a signal".to_string(),
        };
        warn!("{}", output.stderr.trim_end());
        bail!(ErrorKind::ProcessFailed(invocation.command_line(), status));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinning_prefixes() {
        let inv = Invocation::new("./sort__nemea").pinned(Pinning::Cores(4));
        assert_eq!(inv.command_line(), "taskset -c 0-3 ./sort__nemea");

        let inv = Invocation::new("./sort__nemea")
            .arg("STOP")
            .pinned(Pinning::NumaNode(0));
        assert_eq!(inv.command_line(), "numactl -N 0 -m 0 ./sort__nemea STOP");
    }

    #[test]
    fn prefixing_keeps_env_and_statuses() {
        let inv = Invocation::new("./sort")
            .arg("STOP")
            .env("LD_LIBRARY_PATH", "/gcc/lib64/:/tbb")
            .accept_exit_codes(&[0, 17])
            .prefixed("perf".to_string(), vec!["stat".to_string()]);
        assert_eq!(inv.program, "perf");
        assert_eq!(inv.args, vec!["stat", "./sort", "STOP"]);
        assert_eq!(inv.env.len(), 1);
        assert!(inv.accepts(Some(17)));
        assert!(!inv.accepts(Some(1)));
        assert!(!inv.accepts(None));
    }

    #[test]
    fn shell_line_quotes() {
        let inv = Invocation::new("sh")
            .args(vec!["-c", "echo 'hi' there"])
            .env("LD_LIBRARY_PATH", "/a b");
        assert_eq!(
            inv.shell_line(),
            r"export LD_LIBRARY_PATH='/a b'; sh -c 'echo '\''hi'\'' there'"
        );
    }

    #[test]
    fn elapsed_in_seconds() {
        let output = Output {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(output.elapsed_secs(), 1.5);
    }

    #[test]
    fn runs_real_process() {
        let mut launcher = SystemLauncher;
        let output = execute(&mut launcher, &Invocation::new("sh").args(vec!["-c", "echo hi"]))
            .unwrap();
        assert_eq!(output.stdout, "hi\n");

        let err = execute(&mut launcher, &Invocation::new("sh").args(vec!["-c", "exit 3"]))
            .unwrap_err();
        match *err.kind() {
            ErrorKind::ProcessFailed(_, ref status) => assert_eq!(status, "status 3"),
            ref other => panic!("unexpected error {:?}", other),
        }
    }
}
