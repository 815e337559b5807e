//! External command execution.
//!
//! The runner talks to processes only through [`CommandExecutor`], so tests can
//! substitute a fake and shell quoting lives in [`ShellDialect::quote`] alone.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::string::FromUtf8Error;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Placeholder in a command template replaced by the quoted test input.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Wall-clock ceiling for a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Why a command produced no usable output.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start command: {0}")]
    Launch(#[source] std::io::Error),

    #[error("command timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("command output is not valid UTF-8: {source}")]
    Decode {
        /// Output decoded lossily, trimmed.
        partial: String,
        exit_code: Option<i32>,
        #[source]
        source: FromUtf8Error,
    },

    #[error("failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),
}

impl ExecError {
    /// Whatever output could be salvaged from the failed run.
    pub fn partial_output(&self) -> &str {
        match self {
            ExecError::Decode { partial, .. } => partial,
            _ => "",
        }
    }
}

/// Captured result of a command that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Raw standard output.
    pub stdout: String,
    /// Exit code if the process exited normally.
    pub exit_code: Option<i32>,
}

/// Runs a fully rendered command line.
pub trait CommandExecutor {
    /// Run `command_line`, killing it once `timeout` elapses.
    fn execute(&self, command_line: &str, timeout: Duration) -> Result<CommandOutput, ExecError>;

    /// Quoting convention used when substituting input into the template.
    fn dialect(&self) -> ShellDialect {
        ShellDialect::host()
    }
}

/// Quoting convention of the shell that interprets the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellDialect {
    /// `sh -c`, single-quoted values.
    Posix,
    /// `cmd /C`, double-quoted values with embedded quotes doubled.
    Cmd,
}

impl ShellDialect {
    pub fn host() -> Self {
        if cfg!(windows) {
            ShellDialect::Cmd
        } else {
            ShellDialect::Posix
        }
    }

    /// Quote `value` so the shell sees it as exactly one argument.
    pub fn quote(self, value: &str) -> String {
        match self {
            ShellDialect::Posix => format!("'{}'", value.replace('\'', r"'\''")),
            ShellDialect::Cmd => format!("\"{}\"", value.replace('"', "\"\"")),
        }
    }

    fn default_shell(self) -> (&'static str, &'static str) {
        match self {
            ShellDialect::Posix => ("sh", "-c"),
            ShellDialect::Cmd => ("cmd", "/C"),
        }
    }
}

/// Substitute the quoted `input` for every [`INPUT_PLACEHOLDER`] in `template`.
pub fn render_command(template: &str, input: &str, dialect: ShellDialect) -> String {
    template.replace(INPUT_PLACEHOLDER, &dialect.quote(input))
}

/// Executes command lines through the host shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    program: PathBuf,
    flag: String,
    dialect: ShellDialect,
    env: BTreeMap<String, String>,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::for_dialect(ShellDialect::host())
    }
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the standard shell for `dialect`.
    fn for_dialect(dialect: ShellDialect) -> Self {
        let (program, flag) = dialect.default_shell();
        Self {
            program: PathBuf::from(program),
            flag: flag.to_string(),
            dialect,
            env: BTreeMap::new(),
        }
    }

    /// Extra environment variables for every command.
    pub fn with_env<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(&self.flag);
        append_command_line(&mut cmd, command_line);
        cmd.envs(&self.env);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        set_process_group(&mut cmd);
        cmd
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command_line: &str, timeout: Duration) -> Result<CommandOutput, ExecError> {
        debug!(command = command_line, shell = %self.program.display(), "executing");
        let mut child = self.command(command_line).spawn().map_err(ExecError::Launch)?;

        // Drain stdout concurrently so a chatty process cannot fill the pipe and stall.
        let stdout = child.stdout.take();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut stdout) = stdout {
                let _ = stdout.read_to_end(&mut buf);
            }
            let _ = tx.send(buf);
        });

        let start = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() >= timeout {
                        terminate(&mut child);
                        return Err(ExecError::Timeout { timeout });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(e) => {
                    terminate(&mut child);
                    return Err(ExecError::Wait(e));
                }
            }
        };

        // Background descendants may still hold stdout open after the shell exits.
        let remaining = timeout.saturating_sub(start.elapsed());
        let bytes = match rx.recv_timeout(remaining) {
            Ok(bytes) => bytes,
            Err(RecvTimeoutError::Timeout) => {
                kill_process_group(&child);
                return Err(ExecError::Timeout { timeout });
            }
            Err(RecvTimeoutError::Disconnected) => Vec::new(),
        };
        kill_process_group(&child);
        let exit_code = status.code();
        debug!(?exit_code, bytes = bytes.len(), "command finished");

        match String::from_utf8(bytes) {
            Ok(stdout) => Ok(CommandOutput { stdout, exit_code }),
            Err(source) => {
                let partial = String::from_utf8_lossy(source.as_bytes()).trim().to_string();
                Err(ExecError::Decode {
                    partial,
                    exit_code,
                    source,
                })
            }
        }
    }

    fn dialect(&self) -> ShellDialect {
        self.dialect
    }
}

#[cfg(windows)]
fn append_command_line(cmd: &mut Command, command_line: &str) {
    // cmd.exe does its own parsing; hand it the line untouched.
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(command_line);
}

#[cfg(not(windows))]
fn append_command_line(cmd: &mut Command, command_line: &str) {
    cmd.arg(command_line);
}

/// Put the shell in its own process group so a timeout can take down its children too.
#[cfg(unix)]
fn set_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn set_process_group(_cmd: &mut Command) {}

/// Kill the child (and on Unix its whole process group), then reap it.
fn terminate(child: &mut Child) {
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Ok(pid) = libc::pid_t::try_from(child.id()) {
        // The child leads its own group, so -pid addresses everything it spawned.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}
