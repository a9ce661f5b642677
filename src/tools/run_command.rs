// src/tools/run_command.rs

use crate::error::StepError;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Captured output of a finished shell command.
#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Build `sh -c <command>` (or `cmd /C` on Windows) rooted at `workdir`.
pub fn shell_command(command: &str, workdir: &Path) -> Command {
    let (shell, flag) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    let mut cmd = Command::new(shell);
    cmd.arg(flag).arg(command).current_dir(workdir);
    cmd
}

/// Run `command` with stdout/stderr captured as text.
///
/// Succeeds only on a zero exit status; otherwise the captured stderr is
/// carried in [`StepError::Exit`]. With a `timeout` the child and everything
/// it spawned are killed once it runs too long.
pub fn run_captured(
    command: &str,
    workdir: &Path,
    timeout: Option<Duration>,
) -> Result<CapturedOutput, StepError> {
    let mut cmd = shell_command(command, workdir);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    debug!(command, "spawning captured command");
    let mut child = cmd.spawn().map_err(|source| StepError::Spawn {
        command: command.to_string(),
        source,
    })?;

    // Drain both pipes on their own threads so a chatty child can't block on a full pipe.
    let stdout = child.stdout.take().map(|pipe| thread::spawn(move || drain(pipe)));
    let stderr = child.stderr.take().map(|pipe| thread::spawn(move || drain(pipe)));

    let status = wait(&mut child, command, timeout)?;

    let stdout = stdout.map(join).unwrap_or_default();
    let stderr = stderr.map(join).unwrap_or_default();

    debug!(command, exit_code = ?status.code(), "captured command finished");
    if !status.success() {
        return Err(StepError::Exit {
            code: status.code(),
            stderr,
        });
    }

    Ok(CapturedOutput {
        status,
        stdout,
        stderr,
    })
}

/// Run `command` attached to this process's own stdin/stdout/stderr.
pub fn run_interactive(command: &str, workdir: &Path) -> Result<ExitStatus, StepError> {
    let mut cmd = shell_command(command, workdir);
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!(command, "spawning interactive command");
    let status = cmd.status().map_err(|source| StepError::Spawn {
        command: command.to_string(),
        source,
    })?;

    debug!(command, exit_code = ?status.code(), "interactive command finished");
    if !status.success() {
        return Err(StepError::Exit {
            code: status.code(),
            stderr: String::new(),
        });
    }
    Ok(status)
}

fn wait(child: &mut Child, command: &str, timeout: Option<Duration>) -> Result<ExitStatus, StepError> {
    let wait_err = |source| StepError::Wait {
        command: command.to_string(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait().map_err(wait_err);
    };

    match child.wait_timeout(timeout).map_err(wait_err)? {
        Some(status) => Ok(status),
        None => {
            warn!(command, timeout_secs = timeout.as_secs(), "command timed out, killing");
            kill_group(child).map_err(wait_err)?;
            child.wait().map_err(wait_err)?;
            Err(StepError::TimedOut {
                secs: timeout.as_secs(),
            })
        }
    }
}

/// Kill the child's whole process group, so subshells and pipelines go too.
#[cfg(unix)]
fn kill_group(child: &mut Child) -> io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: killpg only sends a signal. The child leads its own group
    // (spawned with process_group(0)) and is not yet reaped.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } == 0 {
        return Ok(());
    }
    match io::Error::last_os_error() {
        err if err.raw_os_error() == Some(libc::ESRCH) => Ok(()),
        err => Err(err),
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> io::Result<()> {
    child.kill()
}

fn drain(mut pipe: impl Read) -> String {
    let mut buf = Vec::new();
    if let Err(err) = pipe.read_to_end(&mut buf) {
        warn!(err = %err, "failed reading child output");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn join(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_else(|_| {
        warn!("output reader thread panicked");
        String::new()
    })
}
