//! A small builder around [`std::process::Command`] that streams a child's
//! stdout and stderr to the caller line-by-line as they arrive, instead of
//! buffering either stream until exit.
//!
//! The original driver used a single-threaded `asyncio` event loop polling
//! both pipes. Cargo's own `ProcessBuilder::exec_with_streaming` solves the
//! same problem with one extra thread per pipe; that's the shape used here.
//! No async runtime is needed — the two pipes are read by two blocking
//! threads, and the lines they produce are funnelled through a channel so
//! the caller sees them in the order they actually arrived from the OS.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

/// Builds and runs a child process, always inheriting nothing from the
/// parent's environment unless explicitly added with [`ProcessBuilder::env`]
/// — callers that want to inherit `PATH` or similar must copy it in
/// explicitly, matching the orchestrator's own "process-wide environment
/// for the child, not inherited from the parent except where noted"
/// contract.
#[derive(Clone, Debug)]
pub struct ProcessBuilder {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    env: HashMap<String, Option<String>>,
    env_order: Vec<String>,
}

enum StreamKind {
    Stdout,
    Stderr,
}

impl ProcessBuilder {
    pub fn new(program: impl Into<OsString>) -> Self {
        ProcessBuilder {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            env_order: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        for arg in args {
            self.arg(arg);
        }
        self
    }

    pub fn cwd(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.cwd = Some(path.into());
        self
    }

    /// Sets an environment variable, preserving first-insertion order so a
    /// caller building up `PATH`-like values piecewise gets a predictable
    /// iteration order out of [`ProcessBuilder::envs`].
    pub fn env(&mut self, key: impl Into<String>, val: impl Into<String>) -> &mut Self {
        let key = key.into();
        if !self.env.contains_key(&key) {
            self.env_order.push(key.clone());
        }
        self.env.insert(key, Some(val.into()));
        self
    }

    /// Iterates the environment variables set so far, in insertion order.
    pub fn envs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env_order.iter().filter_map(move |k| {
            self.env
                .get(k)
                .and_then(|v| v.as_deref())
                .map(|v| (k.as_str(), v))
        })
    }

    pub fn get_program(&self) -> &OsString {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&PathBuf> {
        self.cwd.as_ref()
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.env_clear();
        for (k, v) in self.envs() {
            cmd.env(k, v);
        }
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Runs the command to completion, calling `on_stdout`/`on_stderr` for
    /// each line (without the trailing newline) as it is read. Both
    /// callbacks may be invoked from a reader thread other than the one
    /// that called `exec_with_streaming`, but never concurrently with each
    /// other — lines are serialized through a single channel in arrival
    /// order before the callbacks run.
    pub fn exec_with_streaming(
        &self,
        on_stdout: &mut dyn FnMut(&str),
        on_stderr: &mut dyn FnMut(&str),
    ) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.display()))?;

        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, rx) = mpsc::channel::<(StreamKind, String)>();

        let tx_out = tx.clone();
        let stdout_thread = thread::spawn(move || read_lines(stdout, StreamKind::Stdout, tx_out));
        let tx_err = tx;
        let stderr_thread = thread::spawn(move || read_lines(stderr, StreamKind::Stderr, tx_err));

        for (kind, line) in rx {
            match kind {
                StreamKind::Stdout => on_stdout(&line),
                StreamKind::Stderr => on_stderr(&line),
            }
        }

        stdout_thread.join().expect("stdout reader thread panicked");
        stderr_thread.join().expect("stderr reader thread panicked");

        child
            .wait()
            .with_context(|| format!("failed to wait on {}", self.display()))
    }

    pub fn display(&self) -> String {
        let mut s = self.program.to_string_lossy().into_owned();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }
}

fn read_lines<R: std::io::Read>(
    reader: R,
    kind: StreamKind,
    tx: mpsc::Sender<(StreamKind, String)>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if tx.send((kind_clone(&kind), line.to_string())).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

fn kind_clone(kind: &StreamKind) -> StreamKind {
    match kind {
        StreamKind::Stdout => StreamKind::Stdout,
        StreamKind::Stderr => StreamKind::Stderr,
    }
}
