// src/exec/command.rs

//! Shell-command action.
//!
//! [`CommandAction`] runs one shell command as a step's action:
//!
//! - the child process is bound to the step's context and killed when the
//!   context is canceled or its deadline passes;
//! - every stdout/stderr line is forwarded to the [`LogSink`];
//! - while the command runs, progress comes either from an
//!   [`OutputClassifier`] over its output (real signal) or from an
//!   [`Interpolator`] (time-based fallback).

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::Context;
use crate::engine::step::{Action, ActionFuture};
use crate::progress::{
    InterpolationSpec, Interpolator, OutputClassifier, ProgressReporter, ProgressUpdate,
    SignalTracker,
};
use crate::sink::LogSink;
use crate::ticker::TickerGuard;

/// How long to keep reading output after the child has exited. Daemonizing
/// installers can leave a grandchild holding the pipe open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Which stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct OutputLine {
    stream: OutputStream,
    text: String,
}

/// Where a running command's intermediate progress comes from.
#[derive(Clone)]
pub enum ProgressSource {
    Interpolate(InterpolationSpec),
    Classify {
        classifier: Arc<dyn OutputClassifier>,
        floor: f64,
        ceiling: f64,
        description: String,
    },
}

impl fmt::Debug for ProgressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressSource::Interpolate(spec) => f.debug_tuple("Interpolate").field(spec).finish(),
            ProgressSource::Classify { floor, ceiling, .. } => f
                .debug_struct("Classify")
                .field("floor", floor)
                .field("ceiling", ceiling)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandAction {
    cmd: String,
    logs: LogSink,
    timeout: Option<Duration>,
    progress: Option<(ProgressReporter, ProgressSource)>,
}

impl CommandAction {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            logs: LogSink::disabled(),
            timeout: None,
            progress: None,
        }
    }

    pub fn with_logs(mut self, logs: LogSink) -> Self {
        self.logs = logs;
        self
    }

    /// Per-step deadline on top of whatever the run context carries.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_interpolation(
        mut self,
        reporter: ProgressReporter,
        spec: InterpolationSpec,
    ) -> Self {
        self.progress = Some((reporter, ProgressSource::Interpolate(spec)));
        self
    }

    pub fn with_classifier(
        mut self,
        reporter: ProgressReporter,
        classifier: Arc<dyn OutputClassifier>,
        floor: f64,
        ceiling: f64,
        description: impl Into<String>,
    ) -> Self {
        self.progress = Some((
            reporter,
            ProgressSource::Classify {
                classifier,
                floor,
                ceiling,
                description: description.into(),
            },
        ));
        self
    }

    async fn execute(&self, parent: Context) -> Result<()> {
        let ctx = match self.timeout {
            Some(timeout) => parent.with_timeout(timeout),
            None => parent.clone(),
        };

        info!(cmd = %self.cmd, "starting command");

        let mut child = shell_command(&self.cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning `{}`", self.cmd))?;

        let (line_tx, mut line_rx) = mpsc::channel::<OutputLine>(64);
        let mut readers = ReaderTasks::default();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, OutputStream::Stdout, line_tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, OutputStream::Stderr, line_tx.clone()));
        }
        drop(line_tx);

        let interpolator = match &self.progress {
            Some((reporter, ProgressSource::Interpolate(spec))) => {
                Interpolator::start(reporter.clone(), spec.clone(), &ctx)
            }
            _ => TickerGuard::inert(),
        };
        let mut tracker = match &self.progress {
            Some((_, ProgressSource::Classify { floor, ceiling, .. })) => {
                Some(SignalTracker::new(*floor, *ceiling))
            }
            _ => None,
        };

        let status = loop {
            tokio::select! {
                Some(line) = line_rx.recv() => self.handle_line(line, tracker.as_mut()),
                status = child.wait() => {
                    break status.with_context(|| format!("waiting for `{}`", self.cmd))?;
                }
                reason = ctx.done() => {
                    info!(cmd = %self.cmd, %reason, "context ended; killing command");
                    if let Err(e) = child.kill().await {
                        warn!(cmd = %self.cmd, error = %e, "failed to kill child process");
                    }
                    interpolator.stop().await;
                    // Only the step's own deadline is a step failure.
                    if let (Some(timeout), None) = (self.timeout, parent.err()) {
                        bail!("command `{}` timed out after {:?}", self.cmd, timeout);
                    }
                    return Err(reason.into());
                }
            }
        };

        while let Ok(Some(line)) = tokio::time::timeout(DRAIN_GRACE, line_rx.recv()).await {
            self.handle_line(line, tracker.as_mut());
        }
        interpolator.stop().await;

        let code = status.code().unwrap_or(-1);
        info!(cmd = %self.cmd, exit_code = code, success = status.success(), "command exited");
        if !status.success() {
            bail!("command `{}` exited with status {}", self.cmd, code);
        }
        Ok(())
    }

    fn handle_line(&self, line: OutputLine, tracker: Option<&mut SignalTracker>) {
        debug!(stream = ?line.stream, "{}", line.text);

        let classify = match &self.progress {
            Some((reporter, ProgressSource::Classify { classifier, description, .. })) => {
                Some((reporter, classifier, description))
            }
            _ => None,
        };
        if let (Some(tracker), Some((reporter, classifier, description))) = (tracker, classify) {
            let classified = classifier.classify(&line.text);
            if let Some(progress) = classified.and_then(|v| tracker.advance(v)) {
                reporter.report(ProgressUpdate::installing(progress, description.as_str()));
            }
        }

        self.logs.send_log(line.text);
    }
}

impl Action for CommandAction {
    fn run(&self, ctx: Context) -> ActionFuture<'_> {
        Box::pin(self.execute(ctx))
    }
}

/// Build a shell command appropriate for the platform.
fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Output reader tasks of one command, aborted when dropped.
///
/// A grandchild that inherited the pipes can keep them open after the
/// command itself has exited or been killed.
#[derive(Default)]
struct ReaderTasks(Vec<JoinHandle<()>>);

impl ReaderTasks {
    fn push(&mut self, handle: JoinHandle<()>) {
        self.0.push(handle);
    }
}

impl Drop for ReaderTasks {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

fn spawn_line_reader<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::Sender<OutputLine>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(text)) = lines.next_line().await {
            if tx.send(OutputLine { stream, text }).await.is_err() {
                break;
            }
        }
        debug!(stream = ?stream, "output reader finished");
    })
}
