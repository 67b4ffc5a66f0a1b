//! Runs the external checker against one staged file under a deadline.

use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
    sync::watch,
    task::JoinHandle,
    time::timeout,
};
use tracing::warn;

use super::ProcessOutcome;

/// How long output may keep arriving after the checker itself has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Checker {
    program: PathBuf,
    timeout: Duration,
}

impl Checker {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `<program> <path>` and wait at most `timeout` for it.
    ///
    /// The checker gets its own process group; every process left in it is
    /// killed before this returns, and the checker itself is reaped. If the
    /// future is dropped early the group is killed on drop.
    pub async fn run(&self, path: &Path) -> ProcessOutcome {
        let mut cmd = Command::new(&self.program);
        cmd.arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return ProcessOutcome::ToolMissing {
                    program: self.program.display().to_string(),
                }
            }
            Err(e) => {
                return ProcessOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };
        // Declared after `child` so it drops first, while the leader is
        // still unreaped and the group id cannot have been recycled.
        let mut group = ProcessGroup::of(&child);

        // Readers run beside the wait so a chatty checker never blocks on a
        // full pipe. They stop at EOF or when `stop` fires.
        let (stop, stop_rx) = watch::channel(false);
        let stdout_reader = tokio::spawn(read_text(child.stdout.take(), stop_rx.clone()));
        let stderr_reader = tokio::spawn(read_text(child.stderr.take(), stop_rx));

        let waited = timeout(self.timeout, child.wait()).await;

        match waited {
            Ok(Ok(status)) => {
                // Background descendants may still hold the pipes open.
                group.kill();
                match self.drain(stdout_reader, stderr_reader, &stop).await {
                    Ok((stdout, stderr)) => ProcessOutcome::Completed {
                        exit_code: status.code(),
                        stdout,
                        stderr,
                    },
                    Err(e) => ProcessOutcome::Failed {
                        message: e.to_string(),
                    },
                }
            }
            Ok(Err(e)) => {
                group.kill();
                self.reap(&mut child).await;
                let _ = stop.send(true);
                ProcessOutcome::Failed {
                    message: e.to_string(),
                }
            }
            Err(_elapsed) => {
                warn!(
                    program = %self.program.display(),
                    timeout_secs = self.timeout.as_secs(),
                    "checker exceeded deadline, killing"
                );
                group.kill();
                self.reap(&mut child).await;
                let _ = stop.send(true);
                ProcessOutcome::TimedOut {
                    limit: self.timeout,
                }
            }
        }
    }

    /// Collect both streams, giving up on EOF after `DRAIN_GRACE` and
    /// keeping whatever was read so far.
    async fn drain(
        &self,
        stdout_reader: JoinHandle<io::Result<String>>,
        stderr_reader: JoinHandle<io::Result<String>>,
        stop: &watch::Sender<bool>,
    ) -> io::Result<(String, String)> {
        let drained = async { tokio::join!(joined(stdout_reader), joined(stderr_reader)) };
        tokio::pin!(drained);
        let (stdout, stderr) = match timeout(DRAIN_GRACE, &mut drained).await {
            Ok(streams) => streams,
            Err(_elapsed) => {
                warn!(
                    program = %self.program.display(),
                    "checker output still open after exit, truncating"
                );
                let _ = stop.send(true);
                drained.await
            }
        };
        Ok((stdout?, stderr?))
    }

    async fn reap(&self, child: &mut Child) {
        // `kill` also waits for the exit status. An already-exited child
        // reports InvalidInput, which is fine.
        if let Err(e) = child.kill().await {
            if e.kind() != io::ErrorKind::InvalidInput {
                warn!(error = %e, "failed to kill checker");
            }
        }
    }
}

/// Handle on the checker's process group. Kills the whole group once,
/// either explicitly or on drop.
struct ProcessGroup {
    pgid: Option<i32>,
}

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self {
            pgid: child.id().and_then(|pid| i32::try_from(pid).ok()),
        }
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn kill_group(pgid: i32) {
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = io::Error::last_os_error();
        // ESRCH: the group is already empty.
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %err, "failed to kill checker process group");
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: i32) {}

async fn joined(reader: JoinHandle<io::Result<String>>) -> io::Result<String> {
    reader
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

async fn read_text<R: AsyncRead + Unpin>(
    pipe: Option<R>,
    mut stop: watch::Receiver<bool>,
) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let mut chunk = [0u8; 8192];
        loop {
            tokio::select! {
                n = pipe.read(&mut chunk) => match n? {
                    0 => break,
                    n => buf.extend_from_slice(&chunk[..n]),
                },
                // Fires on `send` and when the sender is dropped.
                _ = stop.changed() => break,
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
