// src/exec/runner.rs

//! Process runner for the supervised command.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureBuffer, DEFAULT_CAPACITY};
use crate::exec::backend::{CommandRunner, ExecutionOutcome, JobCommand, RunFuture};
use crate::types::ExitClass;

const CHUNK_SIZE: usize = 8 * 1024;

/// How long the output pumps may keep reading after the child has exited.
///
/// Normally the pipes hit EOF immediately, but a grandchild that inherited
/// them can hold them open indefinitely.
const IO_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Runs the command as a child process.
///
/// stdout and stderr are each copied live to our own stdout / stderr (unless
/// pass-through is disabled) and into a [`CaptureBuffer`] of
/// `capture_limit` bytes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    capture_limit: usize,
    passthrough: bool,
}

impl ProcessRunner {
    pub fn new(capture_limit: usize) -> Self {
        Self {
            capture_limit,
            passthrough: true,
        }
    }

    /// Capture output without echoing it to the terminal.
    pub fn without_passthrough(mut self) -> Self {
        self.passthrough = false;
        self
    }

    /// Run the command once.
    ///
    /// - Spawn errors yield an `ExitClass::NotStarted` outcome.
    /// - If `cancel` fires, the child is killed and the outcome reflects the
    ///   kill; captured output is kept.
    pub async fn run_once(&self, command: &JobCommand, cancel: &CancellationToken) -> ExecutionOutcome {
        info!(cmd = %command, "starting command");

        let mut cmd = Command::new(command.program());
        cmd.args(command.args())
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                error!(cmd = %command, error = %err, "could not start process");
                return ExecutionOutcome::not_started(err);
            }
        };

        let stop = CancellationToken::new();
        let stdout_pump = child.stdout.take().map(|out| {
            let sink = self.passthrough.then(tokio::io::stdout);
            spawn_pump("stdout", out, sink, self.capture_limit, stop.clone())
        });
        let stderr_pump = child.stderr.take().map(|err| {
            let sink = self.passthrough.then(tokio::io::stderr);
            spawn_pump("stderr", err, sink, self.capture_limit, stop.clone())
        });

        // Either the process exits on its own, or we are asked to stop it.
        let status_res = tokio::select! {
            status_res = child.wait() => status_res,

            _ = cancel.cancelled() => {
                warn!(cmd = %command, "cancellation requested; killing process");
                if let Err(e) = child.kill().await {
                    warn!(cmd = %command, error = %e, "failed to kill child process");
                }
                child.wait().await
            }
        };

        let drain_deadline = {
            let stop = stop.clone();
            tokio::spawn(async move {
                tokio::time::sleep(IO_DRAIN_TIMEOUT).await;
                stop.cancel();
            })
        };
        let (stdout, stderr) = tokio::join!(collect(stdout_pump), collect(stderr_pump));
        drain_deadline.abort();

        match status_res {
            Ok(status) => {
                let class = ExitClass::from_status(status);
                info!(
                    cmd = %command,
                    exit_code = class.code(),
                    success = class.is_success(),
                    stdout_bytes = stdout.len(),
                    stderr_bytes = stderr.len(),
                    "process exited"
                );
                ExecutionOutcome::finished(class, stdout, stderr)
            }
            Err(err) => {
                error!(cmd = %command, error = %err, "waiting for process failed");
                ExecutionOutcome::wait_failed(err, stdout, stderr)
            }
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CommandRunner for ProcessRunner {
    fn run<'a>(&'a self, command: &'a JobCommand, cancel: &'a CancellationToken) -> RunFuture<'a> {
        Box::pin(self.run_once(command, cancel))
    }
}

/// Copy one child stream into a capture buffer (and optionally a sink) until
/// EOF or until `stop` fires. The buffer is returned through the join handle.
fn spawn_pump<R, W>(
    stream: &'static str,
    mut reader: R,
    mut sink: Option<W>,
    capacity: usize,
    stop: CancellationToken,
) -> JoinHandle<CaptureBuffer>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = CaptureBuffer::new(capacity);
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let n = tokio::select! {
                res = reader.read(&mut chunk) => match res {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) => {
                        debug!(stream, error = %e, "read error; stopping capture");
                        break;
                    }
                },
                _ = stop.cancelled() => {
                    warn!(stream, "pipe still open after process exit; stopping capture");
                    break;
                }
            };

            buf.append(&chunk[..n]);

            let write_failed = match sink.as_mut() {
                Some(w) => match write_through(w, &chunk[..n]).await {
                    Ok(()) => false,
                    Err(e) => {
                        debug!(stream, error = %e, "pass-through write failed; capture only from now on");
                        true
                    }
                },
                None => false,
            };
            if write_failed {
                sink = None;
            }
        }

        if buf.overflowed() {
            debug!(
                stream,
                total = buf.total_written(),
                kept = buf.len(),
                "output exceeded capture buffer; oldest bytes dropped"
            );
        }
        buf
    })
}

async fn write_through<W: AsyncWrite + Unpin>(w: &mut W, bytes: &[u8]) -> std::io::Result<()> {
    w.write_all(bytes).await?;
    w.flush().await
}

async fn collect(pump: Option<JoinHandle<CaptureBuffer>>) -> Vec<u8> {
    let Some(handle) = pump else {
        return Vec::new();
    };
    match handle.await {
        Ok(buf) => buf.into_bytes(),
        Err(e) => {
            warn!(error = %e, "output pump task failed");
            Vec::new()
        }
    }
}
